use tt_types::ContentId;

use crate::error::StoreResult;
use crate::metadata::BlobMetadata;

/// Content-addressed payload store with a metadata record per object.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The first writer of an ID wins and
///   later writes under the same ID are no-ops.
/// - A payload never becomes visible under a metadata record written by a
///   different writer.
/// - Concurrent reads are always safe.
/// - The store never interprets payload bytes.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read the stored payload of an object.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    fn read_payload(&self, id: &ContentId) -> StoreResult<Option<Vec<u8>>>;

    /// Read the metadata record of an object, if one was written.
    fn read_metadata(&self, id: &ContentId) -> StoreResult<Option<BlobMetadata>>;

    /// Store `payload` and `metadata` under `id` unless the ID is taken.
    ///
    /// Returns `true` if this call created the object. The payload is
    /// published first; the metadata record only by the writer whose payload
    /// won.
    fn write_object(
        &self,
        id: &ContentId,
        payload: &[u8],
        metadata: &BlobMetadata,
    ) -> StoreResult<bool>;

    /// Check whether an object's payload exists.
    fn exists(&self, id: &ContentId) -> StoreResult<bool>;

    /// Delete an object and its metadata. Returns `true` if it existed.
    ///
    /// Deleting the base of a delta chain makes every object above it
    /// unreadable.
    fn delete(&self, id: &ContentId) -> StoreResult<bool>;

    /// Size in bytes of the stored payload.
    ///
    /// Default implementation reads the payload. Backends may override.
    fn payload_len(&self, id: &ContentId) -> StoreResult<Option<u64>> {
        Ok(self.read_payload(id)?.map(|p| p.len() as u64))
    }
}
