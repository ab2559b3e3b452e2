use std::fs;
use std::io::{Seek, Write};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tempfile::SpooledTempFile;
use tracing::{debug, warn};
use tt_crypto::{ContentHasher, Sha1Strong, StrongHash};
use tt_delta::{
    apply_delta, decode_delta, encode_delta, looks_like_delta, DeltaEncoder, SignatureBuilder,
};
use tt_types::ContentId;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::metadata::BlobMetadata;
use crate::traits::ObjectStore;

/// Result of storing one version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StoreOutcome {
    pub id: ContentId,
    /// Whether the stored payload is a delta.
    pub used_delta: bool,
    /// Bytes occupied by the stored payload.
    pub stored_len: u64,
}

/// How an object is held in the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ObjectStats {
    pub id: ContentId,
    pub is_delta: bool,
    pub chain_depth: u32,
    pub stored_len: u64,
}

/// Blob store that keeps new versions as verified deltas against the
/// version they replace.
///
/// Every object is addressed by the git-style blob hash of its full content.
/// A delta is only written after it has been decoded, replayed against the
/// materialized base and hashed back to the same ID; anything that fails
/// that check, or that would not save enough space, is stored raw.
pub struct ChainedBlobStore {
    backend: Arc<dyn ObjectStore>,
    config: StoreConfig,
    strong: Arc<dyn StrongHash>,
}

impl ChainedBlobStore {
    /// Create a store over `backend` using the SHA-1 block digest.
    pub fn new(backend: Arc<dyn ObjectStore>, config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            config,
            strong: Arc::new(Sha1Strong),
        })
    }

    /// Replace the strong digest used for block signatures.
    pub fn with_strong_hash(mut self, strong: Arc<dyn StrongHash>) -> Self {
        self.strong = strong;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn ObjectStore> {
        &self.backend
    }

    /// Store the file at `path`, optionally as a delta against `previous`.
    ///
    /// Returns the content ID and whether a delta was used.
    pub fn store(
        &self,
        path: impl AsRef<Path>,
        previous: Option<&ContentId>,
    ) -> StoreResult<(ContentId, bool)> {
        let data = fs::read(path)?;
        let outcome = self.store_bytes(&data, previous)?;
        Ok((outcome.id, outcome.used_delta))
    }

    /// Store `data`, optionally as a delta against `previous`.
    ///
    /// Storing content that is already present is a no-op that reports how
    /// the existing object is held.
    pub fn store_bytes(
        &self,
        data: &[u8],
        previous: Option<&ContentId>,
    ) -> StoreResult<StoreOutcome> {
        let id = ContentHasher::BLOB.hash(data);
        if self.backend.exists(&id)? {
            if !self.is_orphaned_delta(&id)? {
                debug!(id = %id.short_hex(), "content already stored");
                return self.existing(id);
            }
            warn!(id = %id.short_hex(), "delta payload without metadata, storing again");
            self.backend.delete(&id)?;
        }

        if let Some(base) = previous {
            if let Some((payload, metadata)) = self.delta_candidate(&id, data, base) {
                return self.put(id, &payload, metadata);
            }
        }
        self.put(id, data, BlobMetadata::raw())
    }

    /// Reconstruct the content of `id` into `output`. Returns bytes written.
    pub fn read<W: Write>(&self, id: &ContentId, output: &mut W) -> StoreResult<u64> {
        self.resolve(id, output, 0)
    }

    /// Reconstruct the content of `id` in memory.
    pub fn read_to_vec(&self, id: &ContentId) -> StoreResult<Vec<u8>> {
        let mut out = Vec::new();
        self.read(id, &mut out)?;
        Ok(out)
    }

    /// Reconstruct `id` and check that its content still hashes to `id`.
    pub fn verify(&self, id: &ContentId) -> StoreResult<bool> {
        let content = self.read_to_vec(id)?;
        Ok(ContentHasher::BLOB.verify(&content, id))
    }

    /// Whether an object with this ID is stored.
    pub fn contains(&self, id: &ContentId) -> StoreResult<bool> {
        self.backend.exists(id)
    }

    /// The metadata record of `id`, if one was written.
    pub fn metadata(&self, id: &ContentId) -> StoreResult<Option<BlobMetadata>> {
        self.backend.read_metadata(id)
    }

    /// IDs from `id` down to the raw object its chain is built on.
    pub fn chain(&self, id: &ContentId) -> StoreResult<Vec<ContentId>> {
        let mut chain = vec![*id];
        let mut current = *id;
        loop {
            if !self.backend.exists(&current)? {
                return Err(match chain.len() {
                    1 => StoreError::NotFound(current),
                    n => StoreError::MissingBase {
                        id: chain[n - 2],
                        base: current,
                    },
                });
            }
            let Some(base) = self.backend.read_metadata(&current)?.and_then(|m| m.base_id)
            else {
                return Ok(chain);
            };
            let depth = chain.len() as u32;
            if depth > self.config.max_chain_depth {
                return Err(StoreError::ChainDepthExceeded { id: base, depth });
            }
            chain.push(base);
            current = base;
        }
    }

    pub fn stats(&self, id: &ContentId) -> StoreResult<ObjectStats> {
        let stored_len = self
            .backend
            .payload_len(id)?
            .ok_or(StoreError::NotFound(*id))?;
        let metadata = self.backend.read_metadata(id)?.unwrap_or_default();
        Ok(ObjectStats {
            id: *id,
            is_delta: metadata.is_delta,
            chain_depth: metadata.chain_depth,
            stored_len,
        })
    }

    /// A delta payload whose metadata record was never written.
    fn is_orphaned_delta(&self, id: &ContentId) -> StoreResult<bool> {
        if self.backend.read_metadata(id)?.is_some() {
            return Ok(false);
        }
        Ok(self
            .backend
            .read_payload(id)?
            .is_some_and(|payload| looks_like_delta(&payload)))
    }

    fn existing(&self, id: ContentId) -> StoreResult<StoreOutcome> {
        let stats = self.stats(&id)?;
        Ok(StoreOutcome {
            id,
            used_delta: stats.is_delta,
            stored_len: stats.stored_len,
        })
    }

    fn put(
        &self,
        id: ContentId,
        payload: &[u8],
        metadata: BlobMetadata,
    ) -> StoreResult<StoreOutcome> {
        if !self.backend.write_object(&id, payload, &metadata)? {
            debug!(id = %id.short_hex(), "concurrent writer stored content first");
            return self.existing(id);
        }
        debug!(
            id = %id.short_hex(),
            delta = metadata.is_delta,
            depth = metadata.chain_depth,
            stored = payload.len(),
            "stored object"
        );
        Ok(StoreOutcome {
            id,
            used_delta: metadata.is_delta,
            stored_len: payload.len() as u64,
        })
    }

    /// A verified delta payload for `data` against `base`, or `None` when
    /// the content should be stored raw.
    fn delta_candidate(
        &self,
        id: &ContentId,
        data: &[u8],
        base: &ContentId,
    ) -> Option<(Vec<u8>, BlobMetadata)> {
        if (data.len() as u64) < self.config.min_delta_size {
            debug!(id = %id.short_hex(), len = data.len(), "below delta threshold, storing raw");
            return None;
        }
        match self.encode_against(id, data, base) {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!(
                    id = %id.short_hex(),
                    base = %base.short_hex(),
                    error = %e,
                    "delta attempt failed, storing raw"
                );
                None
            }
        }
    }

    fn encode_against(
        &self,
        id: &ContentId,
        data: &[u8],
        base: &ContentId,
    ) -> StoreResult<Option<(Vec<u8>, BlobMetadata)>> {
        let base_depth = self
            .backend
            .read_metadata(base)?
            .map_or(0, |m| m.chain_depth);
        if base_depth >= self.config.max_chain_depth {
            debug!(
                id = %id.short_hex(),
                base = %base.short_hex(),
                base_depth,
                "base chain at maximum depth, storing raw"
            );
            return Ok(None);
        }

        let mut scratch = self.scratch();
        self.resolve(base, &mut scratch, 0)?;
        scratch.rewind()?;
        let signature = SignatureBuilder::new(self.config.block_size, self.strong.as_ref())?
            .build(&mut scratch)?;
        let delta = DeltaEncoder::new(&signature, self.strong.as_ref()).encode(data)?;
        let encoded = encode_delta(&delta);

        if encoded.len() as f64 > self.config.max_delta_ratio * data.len() as f64 {
            debug!(
                id = %id.short_hex(),
                encoded = encoded.len(),
                len = data.len(),
                "delta too large, storing raw"
            );
            return Ok(None);
        }

        let decoded = decode_delta(&encoded)?;
        let mut rebuilt = Vec::with_capacity(data.len());
        scratch.rewind()?;
        apply_delta(&mut scratch, &decoded, &mut rebuilt)?;
        if !ContentHasher::BLOB.verify(&rebuilt, id) {
            warn!(
                id = %id.short_hex(),
                base = %base.short_hex(),
                "delta failed verification, storing raw"
            );
            return Ok(None);
        }

        Ok(Some((encoded, BlobMetadata::delta(*base, base_depth + 1))))
    }

    fn resolve(
        &self,
        id: &ContentId,
        mut output: &mut dyn Write,
        depth: u32,
    ) -> StoreResult<u64> {
        if depth > self.config.max_chain_depth {
            return Err(StoreError::ChainDepthExceeded { id: *id, depth });
        }
        let payload = self
            .backend
            .read_payload(id)?
            .ok_or(StoreError::NotFound(*id))?;

        match self.backend.read_metadata(id)? {
            Some(metadata) if metadata.is_delta => {
                let base = metadata.base_id.ok_or_else(|| StoreError::CorruptObject {
                    id: *id,
                    reason: "delta metadata without a base".into(),
                })?;
                let mut scratch = self.scratch();
                match self.resolve(&base, &mut scratch, depth + 1) {
                    Err(StoreError::NotFound(missing)) if missing == base => {
                        return Err(StoreError::MissingBase { id: *id, base });
                    }
                    other => other?,
                };
                scratch.rewind()?;
                let delta = decode_delta(&payload)?;
                Ok(apply_delta(&mut scratch, &delta, &mut output)?)
            }
            None if looks_like_delta(&payload) => Err(StoreError::InconsistentMetadata(*id)),
            _ => {
                output.write_all(&payload)?;
                Ok(payload.len() as u64)
            }
        }
    }

    fn scratch(&self) -> SpooledTempFile {
        SpooledTempFile::new(self.config.scratch_spill_threshold)
    }
}

impl std::fmt::Debug for ChainedBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainedBlobStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
