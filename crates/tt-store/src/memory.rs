use std::collections::HashMap;
use std::sync::RwLock;

use tt_types::ContentId;

use crate::error::{StoreError, StoreResult};
use crate::metadata::BlobMetadata;
use crate::traits::ObjectStore;

#[derive(Clone)]
struct Entry {
    payload: Vec<u8>,
    metadata: BlobMetadata,
}

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Payload and metadata are inserted
/// together under one write lock, so readers never observe one without the
/// other.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ContentId, Entry>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total payload bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|entry| entry.payload.len() as u64)
            .sum()
    }

    /// Return a sorted list of all object IDs in the store.
    pub fn all_ids(&self) -> Vec<ContentId> {
        let map = self.objects.read().expect("lock poisoned");
        let mut ids: Vec<ContentId> = map.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read_payload(&self, id: &ContentId) -> StoreResult<Option<Vec<u8>>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(id).map(|entry| entry.payload.clone()))
    }

    fn read_metadata(&self, id: &ContentId) -> StoreResult<Option<BlobMetadata>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(id).map(|entry| entry.metadata))
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
        let mut map = self.objects.write().expect("lock poisoned");
        if map.contains_key(id) {
            return Ok(false);
        }
        map.insert(
            *id,
            Entry {
                payload: payload.to_vec(),
                metadata: *metadata,
            },
        );
        Ok(true)
    }

    fn exists(&self, id: &ContentId) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }

    fn delete(&self, id: &ContentId) -> StoreResult<bool> {
        let mut map = self.objects.write().expect("lock poisoned");
        Ok(map.remove(id).is_some())
    }

    fn payload_len(&self, id: &ContentId) -> StoreResult<Option<u64>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(id).map(|entry| entry.payload.len() as u64))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &count)
            .finish()
    }
}
