/// One step of a delta: copy a basis range or insert literal bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeltaOp {
    /// Copy `length` bytes of the basis starting at `offset`.
    Copy { offset: u64, length: u32 },
    /// Emit `data` verbatim.
    Insert { data: Vec<u8> },
}

impl DeltaOp {
    /// Number of target bytes this op produces.
    pub fn target_len(&self) -> u64 {
        match self {
            Self::Copy { length, .. } => u64::from(*length),
            Self::Insert { data } => data.len() as u64,
        }
    }
}

/// An ordered copy/insert program that rebuilds a target from a basis.
///
/// Applying `ops` in order to the basis the originating signature was taken
/// from reproduces the target byte for byte.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Delta {
    pub block_size: u32,
    pub ops: Vec<DeltaOp>,
}

impl Delta {
    pub fn new(block_size: u32, ops: Vec<DeltaOp>) -> Self {
        Self { block_size, ops }
    }

    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// Length of the target this delta reconstructs.
    pub fn target_len(&self) -> u64 {
        self.ops.iter().map(DeltaOp::target_len).sum()
    }

    /// Bytes carried literally in `Insert` ops.
    pub fn literal_len(&self) -> u64 {
        self.ops
            .iter()
            .filter(|op| matches!(op, DeltaOp::Insert { .. }))
            .map(DeltaOp::target_len)
            .sum()
    }

    /// Bytes reproduced from the basis by `Copy` ops.
    pub fn copy_len(&self) -> u64 {
        self.target_len() - self.literal_len()
    }
}

/// Merge adjacent `Copy` ops whose basis ranges are contiguous.
///
/// A merge is skipped when the combined length would not fit in a `u32`.
pub fn coalesce(ops: Vec<DeltaOp>) -> Vec<DeltaOp> {
    let mut merged: Vec<DeltaOp> = Vec::with_capacity(ops.len());
    for op in ops {
        if let (
            Some(DeltaOp::Copy {
                offset: prev_offset,
                length: prev_length,
            }),
            DeltaOp::Copy { offset, length },
        ) = (merged.last_mut(), &op)
        {
            if prev_offset.checked_add(u64::from(*prev_length)) == Some(*offset) {
                if let Some(sum) = prev_length.checked_add(*length) {
                    *prev_length = sum;
                    continue;
                }
            }
        }
        merged.push(op);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy(offset: u64, length: u32) -> DeltaOp {
        DeltaOp::Copy { offset, length }
    }

    fn insert(data: &[u8]) -> DeltaOp {
        DeltaOp::Insert {
            data: data.to_vec(),
        }
    }

    #[test]
    fn coalesce_merges_contiguous_copies() {
        let ops = vec![copy(0, 64), copy(64, 64), copy(128, 10)];
        assert_eq!(coalesce(ops), vec![copy(0, 138)]);
    }

    #[test]
    fn coalesce_keeps_gaps_and_reorders() {
        let ops = vec![copy(64, 64), copy(0, 64), copy(200, 64)];
        assert_eq!(coalesce(ops.clone()), ops);
    }

    #[test]
    fn coalesce_does_not_merge_across_inserts() {
        let ops = vec![copy(0, 64), insert(b"x"), copy(64, 64)];
        assert_eq!(coalesce(ops.clone()), ops);
    }

    #[test]
    fn coalesce_respects_u32_limit() {
        let ops = vec![copy(0, u32::MAX), copy(u64::from(u32::MAX), 1)];
        assert_eq!(coalesce(ops.clone()), ops);
    }

    #[test]
    fn length_accounting() {
        let delta = Delta::new(64, vec![copy(0, 100), insert(b"hello"), copy(500, 20)]);
        assert_eq!(delta.op_count(), 3);
        assert_eq!(delta.target_len(), 125);
        assert_eq!(delta.literal_len(), 5);
        assert_eq!(delta.copy_len(), 120);
    }
}
