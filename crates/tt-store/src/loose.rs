use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;
use tt_types::ContentId;

use crate::error::{StoreError, StoreResult};
use crate::metadata::BlobMetadata;
use crate::traits::ObjectStore;

const METADATA_EXTENSION: &str = "meta";

/// One file per object under `<root>/objects/<2 hex>/<38 hex>`, with the
/// metadata record in a `.meta` JSON file beside it.
///
/// Files are written to a temporary file in the target directory and moved
/// into place, so a reader never sees a partially written payload.
#[derive(Debug)]
pub struct LooseObjectStore {
    objects_dir: PathBuf,
}

impl LooseObjectStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let objects_dir = root.as_ref().join("objects");
        fs::create_dir_all(&objects_dir)?;
        Ok(Self { objects_dir })
    }

    /// Directory holding the fan-out subdirectories.
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// Path of an object's payload file.
    pub fn object_path(&self, id: &ContentId) -> PathBuf {
        let hex = id.to_hex();
        self.objects_dir.join(&hex[..2]).join(&hex[2..])
    }

    /// Path of an object's metadata file.
    pub fn metadata_path(&self, id: &ContentId) -> PathBuf {
        self.object_path(id).with_extension(METADATA_EXTENSION)
    }
}

impl ObjectStore for LooseObjectStore {
    fn read_payload(&self, id: &ContentId) -> StoreResult<Option<Vec<u8>>> {
        read_optional(&self.object_path(id))
    }

    fn read_metadata(&self, id: &ContentId) -> StoreResult<Option<BlobMetadata>> {
        match read_optional(&self.metadata_path(id))? {
            Some(bytes) => BlobMetadata::from_json(&bytes)
                .map(Some)
                .map_err(|e| StoreError::CorruptObject {
                    id: *id,
                    reason: format!("unreadable metadata: {e}"),
                }),
            None => Ok(None),
        }
    }

    fn write_object(
        &self,
        id: &ContentId,
        payload: &[u8],
        metadata: &BlobMetadata,
    ) -> StoreResult<bool> {
        if id.is_null() {
            return Err(StoreError::NullContentId);
        }
        let path = self.object_path(id);
        if path.exists() {
            return Ok(false);
        }
        let dir = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "object path has no parent"))?;
        fs::create_dir_all(dir)?;

        let staged_payload = stage(dir, payload)?;
        let staged_metadata = stage(dir, &metadata.to_json()?)?;

        match staged_payload.persist_noclobber(&path) {
            Ok(_) => {}
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!(id = %id.short_hex(), "lost write race, keeping existing object");
                return Ok(false);
            }
            Err(e) => return Err(e.error.into()),
        }
        staged_metadata
            .persist(self.metadata_path(id))
            .map_err(|e| e.error)?;
        Ok(true)
    }

    fn exists(&self, id: &ContentId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }

    fn delete(&self, id: &ContentId) -> StoreResult<bool> {
        match fs::remove_file(self.metadata_path(id)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        match fs::remove_file(self.object_path(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn payload_len(&self, id: &ContentId) -> StoreResult<Option<u64>> {
        match fs::metadata(self.object_path(id)) {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn read_optional(path: &Path) -> StoreResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn stage(dir: &Path, bytes: &[u8]) -> StoreResult<NamedTempFile> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    Ok(file)
}
