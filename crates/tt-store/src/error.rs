use tt_delta::DeltaError;
use tt_types::ContentId;

/// Errors from blob storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ContentId),

    /// A delta object's base is missing from the store.
    #[error("base {base} of delta object {id} not found")]
    MissingBase { id: ContentId, base: ContentId },

    /// Chain resolution went deeper than the configured maximum.
    #[error("delta chain too deep at {id}: depth {depth}")]
    ChainDepthExceeded { id: ContentId, depth: u32 },

    /// Stored bytes look delta-encoded but no metadata says so.
    #[error("object {0} looks delta-encoded but has no delta metadata")]
    InconsistentMetadata(ContentId),

    /// The object data is malformed or cannot be decoded.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ContentId, reason: String },

    /// A stored delta failed to decode or replay.
    #[error("delta error: {0}")]
    Delta(#[from] DeltaError),

    /// Metadata serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration failed to parse or validate.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Attempted to write under the null content ID.
    #[error("cannot store object with null ID")]
    NullContentId,

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
