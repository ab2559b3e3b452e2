use thiserror::Error;

use crate::signature::{MAX_BLOCK_SIZE, MIN_BLOCK_SIZE};

/// Errors from signature generation, delta encoding, and delta replay.
#[derive(Debug, Error)]
pub enum DeltaError {
    /// Block size outside the supported range. Raised before any I/O.
    #[error("invalid block size {0}: must be within [{MIN_BLOCK_SIZE}, {MAX_BLOCK_SIZE}]")]
    InvalidBlockSize(u32),

    /// Wire data failed to decode.
    #[error("malformed wire data: {0}")]
    Format(#[from] FormatError),

    /// The basis ran out of bytes while replaying a copy.
    #[error("basis exhausted while copying from offset {offset}")]
    Reconstruction { offset: u64 },

    /// I/O error from a basis, target, or output stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decode-time violations of the signature and delta wire formats.
///
/// Every variant is fatal to the decode call that produced it; nothing is
/// ever partially accepted.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid magic: expected {expected}, got {actual}")]
    BadMagic { expected: String, actual: String },

    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u8),

    #[error("element count {count} exceeds limit {limit}")]
    CountOutOfBounds { count: u64, limit: u64 },

    #[error("length {length} exceeds limit {limit}")]
    LengthOutOfBounds { length: u64, limit: u64 },

    #[error("negative copy offset {0}")]
    NegativeOffset(i64),

    #[error("copy length must be positive")]
    NonPositiveLength,

    #[error("unknown op tag {0:#04x}")]
    UnknownOpTag(u8),

    #[error("unexpected end of input at byte {offset}: needed {needed} more")]
    UnexpectedEndOfInput { offset: usize, needed: usize },

    #[error("varint longer than 10 bytes at byte {offset}")]
    VarintOverflow { offset: usize },

    #[error("{0} trailing bytes after payload")]
    TrailingData(usize),
}

/// Result alias for delta operations.
pub type DeltaResult<T> = Result<T, DeltaError>;
