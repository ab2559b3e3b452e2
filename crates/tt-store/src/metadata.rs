use serde::{Deserialize, Serialize};
use tt_types::ContentId;

use crate::error::{StoreError, StoreResult};

/// Per-object storage record kept alongside the payload.
///
/// Written once when the object is stored and never changed afterwards.
/// `base_id` is present exactly when `is_delta` is set; `chain_depth` counts
/// the delta links between this object and raw content (0 for raw objects).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub is_delta: bool,
    pub chain_depth: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_id: Option<ContentId>,
}

impl BlobMetadata {
    /// Metadata for an object stored verbatim.
    pub const fn raw() -> Self {
        Self {
            is_delta: false,
            chain_depth: 0,
            base_id: None,
        }
    }

    /// Metadata for an object stored as a delta against `base`.
    pub const fn delta(base: ContentId, chain_depth: u32) -> Self {
        Self {
            is_delta: true,
            chain_depth,
            base_id: Some(base),
        }
    }

    /// Serialize to the on-disk JSON form.
    pub fn to_json(&self) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Parse the on-disk JSON form.
    pub fn from_json(data: &[u8]) -> StoreResult<Self> {
        serde_json::from_slice(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

impl Default for BlobMetadata {
    fn default() -> Self {
        Self::raw()
    }
}
