use std::io::{self, Read};

use tt_crypto::{Sha1Strong, StrongHash};
use tt_types::ContentId;

use crate::error::{DeltaError, DeltaResult};
use crate::rolling::RollingChecksum;

/// Smallest accepted block size.
pub const MIN_BLOCK_SIZE: u32 = 64;
/// Largest accepted block size (1 MiB).
pub const MAX_BLOCK_SIZE: u32 = 1_048_576;

/// Check that `block_size` lies within `[MIN_BLOCK_SIZE, MAX_BLOCK_SIZE]`.
pub fn validate_block_size(block_size: u32) -> DeltaResult<()> {
    if (MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size) {
        Ok(())
    } else {
        Err(DeltaError::InvalidBlockSize(block_size))
    }
}

/// Checksums of one fixed-size chunk of a basis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockSignature {
    pub index: u32,
    pub weak: u32,
    pub strong: ContentId,
}

/// Block-by-block description of a basis.
///
/// Block `i` covers basis bytes `[i * block_size, i * block_size + len)`
/// where `len == block_size` for every block except possibly the last.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub block_size: u32,
    pub blocks: Vec<BlockSignature>,
}

impl Signature {
    pub fn new(block_size: u32, blocks: Vec<BlockSignature>) -> Self {
        Self { block_size, blocks }
    }

    /// Signature of an empty basis.
    pub fn empty(block_size: u32) -> Self {
        Self::new(block_size, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }
}

/// Chunks a basis stream into blocks and records `(weak, strong)` per block.
pub struct SignatureBuilder<'a> {
    block_size: u32,
    strong: &'a dyn StrongHash,
}

impl<'a> SignatureBuilder<'a> {
    /// Create a builder, rejecting out-of-range block sizes up front.
    pub fn new(block_size: u32, strong: &'a dyn StrongHash) -> DeltaResult<Self> {
        validate_block_size(block_size)?;
        Ok(Self { block_size, strong })
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Read `basis` to the end and produce its signature.
    pub fn build<R: Read>(&self, mut basis: R) -> DeltaResult<Signature> {
        let mut chunk = vec![0u8; self.block_size as usize];
        let mut blocks = Vec::new();
        loop {
            let n = read_full(&mut basis, &mut chunk)?;
            if n == 0 {
                break;
            }
            let block = &chunk[..n];
            blocks.push(BlockSignature {
                index: blocks.len() as u32,
                weak: RollingChecksum::of(block).weak(),
                strong: self.strong.digest(block),
            });
            if n < chunk.len() {
                break;
            }
        }
        Ok(Signature::new(self.block_size, blocks))
    }
}

/// Build a signature of `basis` with the default SHA-1 strong digest.
pub fn make_signature<R: Read>(basis: R, block_size: u32) -> DeltaResult<Signature> {
    SignatureBuilder::new(block_size, &Sha1Strong)?.build(basis)
}

/// Fill `buf` from `reader`, stopping early only at end of stream.
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
