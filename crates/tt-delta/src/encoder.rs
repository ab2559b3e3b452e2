use std::collections::VecDeque;
use std::io::{BufReader, Bytes, Read};

use rustc_hash::FxHashMap;
use tracing::trace;
use tt_crypto::{Sha1Strong, StrongHash};

use crate::buffer::{InsertAccumulator, RingBuffer};
use crate::delta::{coalesce, Delta, DeltaOp};
use crate::error::DeltaResult;
use crate::rolling::RollingChecksum;
use crate::signature::{read_full, BlockSignature, Signature};

/// Streaming buffer size, and the largest `Insert` the encoder emits.
pub const STREAM_CHUNK_LEN: usize = 64 * 1024;

/// Strong-digest attempts allowed for short windows between two matches.
///
/// Short windows can only ever match the basis's last block. On repetitive
/// data (long zero runs) every short prefix may collide with that block's
/// weak checksum; the budget keeps those checks from turning the scan
/// quadratic. Exhausting it only forgoes a short copy. A window the stream
/// ended on is always checked whole, outside the budget.
const SHORT_CHECK_BUDGET: u32 = 4;

/// Scans a target stream against a signature and emits copy/insert ops.
pub struct DeltaEncoder<'a> {
    signature: &'a Signature,
    strong: &'a dyn StrongHash,
    /// weak checksum -> indices into `signature.blocks`, in block order.
    buckets: FxHashMap<u32, Vec<usize>>,
}

impl<'a> DeltaEncoder<'a> {
    pub fn new(signature: &'a Signature, strong: &'a dyn StrongHash) -> Self {
        let mut buckets: FxHashMap<u32, Vec<usize>> = FxHashMap::default();
        for (pos, block) in signature.blocks.iter().enumerate() {
            buckets.entry(block.weak).or_default().push(pos);
        }
        Self {
            signature,
            strong,
            buckets,
        }
    }

    /// Read `target` to the end and produce a delta against the signature.
    pub fn encode<R: Read>(&self, target: R) -> DeltaResult<Delta> {
        let ops = if self.signature.blocks.is_empty() {
            self.encode_literal(target)?
        } else {
            coalesce(self.scan(target)?)
        };
        let delta = Delta::new(self.signature.block_size, ops);
        trace!(
            ops = delta.op_count(),
            copied = delta.copy_len(),
            literal = delta.literal_len(),
            "delta encoded"
        );
        Ok(delta)
    }

    /// Nothing to copy from: the whole target becomes inserts.
    fn encode_literal<R: Read>(&self, mut target: R) -> DeltaResult<Vec<DeltaOp>> {
        let mut ops = Vec::new();
        let mut chunk = vec![0u8; STREAM_CHUNK_LEN];
        loop {
            let n = read_full(&mut target, &mut chunk)?;
            if n == 0 {
                break;
            }
            ops.push(DeltaOp::Insert {
                data: chunk[..n].to_vec(),
            });
            if n < chunk.len() {
                break;
            }
        }
        Ok(ops)
    }

    fn scan<R: Read>(&self, target: R) -> DeltaResult<Vec<DeltaOp>> {
        let block_size = self.signature.block_size as usize;
        let mut input = TargetBytes::new(target);
        let mut window = RingBuffer::with_capacity(block_size);
        let mut rolling = RollingChecksum::new();
        let mut literals = InsertAccumulator::new(STREAM_CHUNK_LEN);
        let mut ops = Vec::new();
        let mut budget = SHORT_CHECK_BUDGET;
        // Earliest prefix of the filling window equal to the basis's last block.
        let mut short_prefix: Option<(usize, BlockSignature)> = None;
        let mut next_index: Option<u32> = None;
        let mut eof = false;

        loop {
            // Advance to the next window state; every state is checked once.
            if eof {
                drain_front(&mut window, &mut rolling, &mut literals, &mut ops);
            } else if window.is_full() {
                match input.next()? {
                    Some(byte) => {
                        if let Some(out) = window.push_back(byte) {
                            rolling.roll(out, byte);
                            literals.push(out, &mut ops);
                        }
                    }
                    None => {
                        eof = true;
                        budget = SHORT_CHECK_BUDGET;
                        drain_front(&mut window, &mut rolling, &mut literals, &mut ops);
                    }
                }
            } else {
                match input.next()? {
                    Some(byte) => {
                        window.push_back(byte);
                        rolling.push(byte);
                        if !window.is_full() {
                            // A short prefix only counts if the stream ends
                            // before the window fills.
                            if short_prefix.is_none() {
                                short_prefix = self
                                    .match_last(&mut window, rolling.weak(), Some(&mut budget))
                                    .map(|block| (window.len(), block));
                            }
                            continue;
                        }
                    }
                    None => {
                        eof = true;
                        budget = SHORT_CHECK_BUDGET;
                        let whole = if window.is_empty() {
                            None
                        } else {
                            self.match_last(&mut window, rolling.weak(), None)
                        };
                        if let Some(block) = whole {
                            push_copy(&mut ops, &mut literals, block, block_size, window.len());
                            window.clear();
                            rolling.reset();
                        } else if let Some((len, block)) = short_prefix.take() {
                            push_copy(&mut ops, &mut literals, block, block_size, len);
                            let rest = window.as_slice()[len..].to_vec();
                            input.unread(&rest);
                            window.clear();
                            rolling.reset();
                            next_index = block.index.checked_add(1);
                            eof = false;
                        } else {
                            drain_front(&mut window, &mut rolling, &mut literals, &mut ops);
                        }
                        short_prefix = None;
                    }
                }
            }

            if window.is_empty() {
                if eof {
                    break;
                }
                continue;
            }

            short_prefix = None;
            if let Some(block) =
                self.find_match(&mut window, rolling.weak(), &mut budget, next_index)
            {
                push_copy(&mut ops, &mut literals, block, block_size, window.len());
                window.clear();
                rolling.reset();
                budget = SHORT_CHECK_BUDGET;
                next_index = block.index.checked_add(1);
            }
        }

        literals.flush_into(&mut ops);
        Ok(ops)
    }

    /// Find a block whose strong digest equals the digest of the current
    /// window. The block right after the previous copy (`next`) wins a tie,
    /// otherwise the first in signature order.
    fn find_match(
        &self,
        window: &mut RingBuffer,
        weak: u32,
        budget: &mut u32,
        next: Option<u32>,
    ) -> Option<BlockSignature> {
        if !window.is_full() {
            return self.match_last(window, weak, Some(budget));
        }
        let candidates = self.buckets.get(&weak)?;
        let digest = self.strong.digest(window.as_slice());
        let mut matching = candidates
            .iter()
            .map(|&pos| self.signature.blocks[pos])
            .filter(|block| block.strong == digest);
        let first = matching.next()?;
        if next.is_none() || Some(first.index) == next {
            return Some(first);
        }
        Some(matching.find(|block| Some(block.index) == next).unwrap_or(first))
    }

    /// Compare a short window against the basis's last block, the only block
    /// a short window can equal. `budget` limits strong digests on weak hits.
    fn match_last(
        &self,
        window: &mut RingBuffer,
        weak: u32,
        budget: Option<&mut u32>,
    ) -> Option<BlockSignature> {
        let last = *self.signature.blocks.last()?;
        if last.weak != weak {
            return None;
        }
        if let Some(budget) = budget {
            if *budget == 0 {
                return None;
            }
            *budget -= 1;
        }
        (self.strong.digest(window.as_slice()) == last.strong).then_some(last)
    }
}

/// Encode `target` against `signature` with the default SHA-1 strong digest.
pub fn make_delta<R: Read>(target: R, signature: &Signature) -> DeltaResult<Delta> {
    DeltaEncoder::new(signature, &Sha1Strong).encode(target)
}

/// Target bytes, with room to hand back bytes the scan has already read.
struct TargetBytes<R> {
    unread: VecDeque<u8>,
    inner: Bytes<BufReader<R>>,
    done: bool,
}

impl<R: Read> TargetBytes<R> {
    fn new(target: R) -> Self {
        Self {
            unread: VecDeque::new(),
            inner: BufReader::with_capacity(STREAM_CHUNK_LEN, target).bytes(),
            done: false,
        }
    }

    fn next(&mut self) -> DeltaResult<Option<u8>> {
        if let Some(byte) = self.unread.pop_front() {
            return Ok(Some(byte));
        }
        if self.done {
            return Ok(None);
        }
        let byte = self.inner.next().transpose()?;
        self.done = byte.is_none();
        Ok(byte)
    }

    /// Queue `bytes` to be read again, ahead of any bytes not yet returned.
    fn unread(&mut self, bytes: &[u8]) {
        for &byte in bytes.iter().rev() {
            self.unread.push_front(byte);
        }
    }
}

fn push_copy(
    ops: &mut Vec<DeltaOp>,
    literals: &mut InsertAccumulator,
    block: BlockSignature,
    block_size: usize,
    length: usize,
) {
    literals.flush_into(ops);
    ops.push(DeltaOp::Copy {
        offset: u64::from(block.index) * block_size as u64,
        length: length as u32,
    });
}

fn drain_front(
    window: &mut RingBuffer,
    rolling: &mut RollingChecksum,
    literals: &mut InsertAccumulator,
    ops: &mut Vec<DeltaOp>,
) {
    if let Some(out) = window.pop_front() {
        rolling.trim_front(out);
        literals.push(out, ops);
    }
}
