use sha1::{Digest, Sha1};
use tt_types::ContentId;

/// Strong digest used to confirm weak rolling-checksum candidates.
///
/// Signature generation and delta encoding take the strategy as a parameter
/// rather than reaching for a global, so tests and alternative digests can be
/// injected. Both sides of a signature/delta exchange must use the same
/// implementation.
pub trait StrongHash: Send + Sync {
    /// Digest a block of bytes.
    fn digest(&self, block: &[u8]) -> ContentId;
}

/// Plain SHA-1 over the block bytes, without any header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sha1Strong;

impl StrongHash for Sha1Strong {
    fn digest(&self, block: &[u8]) -> ContentId {
        ContentId::from_hash(Sha1::digest(block).into())
    }
}

impl<F> StrongHash for F
where
    F: Fn(&[u8]) -> ContentId + Send + Sync,
{
    fn digest(&self, block: &[u8]) -> ContentId {
        self(block)
    }
}
