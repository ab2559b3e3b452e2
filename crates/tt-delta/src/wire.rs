//! Binary wire formats for signatures and deltas.
//!
//! Signature layout:
//! ```text
//! "TTSG" 0x01
//! [u32 BE block size] [u32 BE block count]
//! per block: [u32 BE index] [u32 BE weak] [20 bytes strong]
//! ```
//!
//! Delta layout:
//! ```text
//! "TTDL" 0x01
//! [u32 BE block size] [varint op count]
//! per op: [tag u8] then
//!   tag 0 (insert): [varint length] [length bytes]
//!   tag 1 (copy):   [varint offset] [varint length]
//! ```
//!
//! Varints carry 7 payload bits per byte, least significant group first,
//! with the high bit as the continuation flag.

use std::io::{self, Write};

use tt_types::ContentId;

use crate::delta::{Delta, DeltaOp};
use crate::error::{DeltaResult, FormatError};
use crate::signature::{validate_block_size, BlockSignature, Signature};

pub const SIGNATURE_MAGIC: &[u8; 4] = b"TTSG";
pub const DELTA_MAGIC: &[u8; 4] = b"TTDL";
pub const FORMAT_VERSION: u8 = 1;

/// Most ops (and signature blocks) a decoder will accept.
pub const MAX_OP_COUNT: u64 = 10_000_000;
/// Largest insert payload a decoder will accept (100 MiB).
pub const MAX_INSERT_LEN: u64 = 100 * 1024 * 1024;
/// Longest varint encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

const TAG_INSERT: u8 = 0;
const TAG_COPY: u8 = 1;
const BLOCK_RECORD_LEN: usize = 4 + 4 + ContentId::LEN;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Serialize a signature.
pub fn encode_signature(signature: &Signature) -> Vec<u8> {
    let mut buf = Vec::with_capacity(13 + signature.blocks.len() * BLOCK_RECORD_LEN);
    buf.extend_from_slice(SIGNATURE_MAGIC);
    buf.push(FORMAT_VERSION);
    buf.extend_from_slice(&signature.block_size.to_be_bytes());
    buf.extend_from_slice(&(signature.blocks.len() as u32).to_be_bytes());
    for block in &signature.blocks {
        buf.extend_from_slice(&block.index.to_be_bytes());
        buf.extend_from_slice(&block.weak.to_be_bytes());
        buf.extend_from_slice(block.strong.as_bytes());
    }
    buf
}

/// Serialize a delta.
pub fn encode_delta(delta: &Delta) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(DELTA_MAGIC);
    buf.push(FORMAT_VERSION);
    buf.extend_from_slice(&delta.block_size.to_be_bytes());
    encode_varint(&mut buf, delta.ops.len() as u64);
    for op in &delta.ops {
        match op {
            DeltaOp::Insert { data } => {
                buf.push(TAG_INSERT);
                encode_varint(&mut buf, data.len() as u64);
                buf.extend_from_slice(data);
            }
            DeltaOp::Copy { offset, length } => {
                buf.push(TAG_COPY);
                encode_varint(&mut buf, *offset);
                encode_varint(&mut buf, u64::from(*length));
            }
        }
    }
    buf
}

/// Serialize a signature into a writer.
pub fn write_signature<W: Write>(signature: &Signature, mut writer: W) -> io::Result<()> {
    writer.write_all(&encode_signature(signature))
}

/// Serialize a delta into a writer.
pub fn write_delta<W: Write>(delta: &Delta, mut writer: W) -> io::Result<()> {
    writer.write_all(&encode_delta(delta))
}

/// Returns `true` if `bytes` open with the delta magic.
pub fn looks_like_delta(bytes: &[u8]) -> bool {
    bytes.starts_with(DELTA_MAGIC)
}

/// Encode a `u64` as a varint.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Parse a signature, rejecting anything malformed or out of bounds.
pub fn decode_signature(data: &[u8]) -> DeltaResult<Signature> {
    let mut reader = WireReader::new(data);
    reader.expect_header(SIGNATURE_MAGIC)?;
    let block_size = reader.u32_be()?;
    validate_block_size(block_size)?;

    let count = u64::from(reader.u32_be()?);
    if count > MAX_OP_COUNT {
        return Err(FormatError::CountOutOfBounds {
            count,
            limit: MAX_OP_COUNT,
        }
        .into());
    }
    // Refuse to allocate for records the input cannot contain.
    reader.ensure(count as usize * BLOCK_RECORD_LEN)?;

    let mut blocks = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let index = reader.u32_be()?;
        let weak = reader.u32_be()?;
        let strong = ContentId::from_hash(reader.array()?);
        blocks.push(BlockSignature {
            index,
            weak,
            strong,
        });
    }
    reader.finish()?;
    Ok(Signature::new(block_size, blocks))
}

/// Parse a delta, rejecting anything malformed or out of bounds.
pub fn decode_delta(data: &[u8]) -> DeltaResult<Delta> {
    let mut reader = WireReader::new(data);
    reader.expect_header(DELTA_MAGIC)?;
    let block_size = reader.u32_be()?;

    let count = reader.varint()?;
    if count > MAX_OP_COUNT {
        return Err(FormatError::CountOutOfBounds {
            count,
            limit: MAX_OP_COUNT,
        }
        .into());
    }

    // Every op takes at least two bytes on the wire.
    let mut ops = Vec::with_capacity((count as usize).min(reader.remaining() / 2));
    for _ in 0..count {
        let op = match reader.u8()? {
            TAG_INSERT => {
                let length = reader.varint()?;
                if length > MAX_INSERT_LEN {
                    return Err(FormatError::LengthOutOfBounds {
                        length,
                        limit: MAX_INSERT_LEN,
                    }
                    .into());
                }
                DeltaOp::Insert {
                    data: reader.take(length as usize)?.to_vec(),
                }
            }
            TAG_COPY => {
                let offset = reader.varint()?;
                if offset > i64::MAX as u64 {
                    return Err(FormatError::NegativeOffset(offset as i64).into());
                }
                let length = reader.varint()?;
                if length == 0 {
                    return Err(FormatError::NonPositiveLength.into());
                }
                let length = u32::try_from(length).map_err(|_| FormatError::LengthOutOfBounds {
                    length,
                    limit: u64::from(u32::MAX),
                })?;
                DeltaOp::Copy { offset, length }
            }
            tag => return Err(FormatError::UnknownOpTag(tag).into()),
        };
        ops.push(op);
    }
    reader.finish()?;
    Ok(Delta::new(block_size, ops))
}

/// Bounds-checked cursor over wire bytes.
struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn ensure(&self, needed: usize) -> Result<(), FormatError> {
        if self.remaining() < needed {
            return Err(FormatError::UnexpectedEndOfInput {
                offset: self.pos,
                needed: needed - self.remaining(),
            });
        }
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.take(N)?);
        Ok(arr)
    }

    fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    fn u32_be(&mut self) -> Result<u32, FormatError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn varint(&mut self) -> Result<u64, FormatError> {
        let start = self.pos;
        let mut value = 0u64;
        for i in 0..MAX_VARINT_LEN {
            let byte = self.u8()?;
            let bits = u64::from(byte & 0x7F);
            // The tenth byte may only contribute the top bit of a u64.
            if i == MAX_VARINT_LEN - 1 && bits > 1 {
                return Err(FormatError::VarintOverflow { offset: start });
            }
            value |= bits << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(FormatError::VarintOverflow { offset: start })
    }

    fn expect_header(&mut self, magic: &[u8; 4]) -> Result<(), FormatError> {
        let actual = self.take(magic.len()).map_err(|_| FormatError::BadMagic {
            expected: String::from_utf8_lossy(magic).into(),
            actual: String::from_utf8_lossy(&self.data[self.pos..]).into(),
        })?;
        if actual != magic {
            return Err(FormatError::BadMagic {
                expected: String::from_utf8_lossy(magic).into(),
                actual: String::from_utf8_lossy(actual).into(),
            });
        }
        match self.u8()? {
            FORMAT_VERSION => Ok(()),
            other => Err(FormatError::UnsupportedVersion(other)),
        }
    }

    fn finish(&self) -> Result<(), FormatError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(FormatError::TrailingData(n)),
        }
    }
}
