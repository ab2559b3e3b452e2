//! Scan buffers: the fixed-capacity sliding window and the literal
//! accumulator the encoder drains into `Insert` ops.

use crate::delta::DeltaOp;

/// Fixed-capacity circular byte window.
///
/// Pushing into a full buffer overwrites and returns the oldest byte, which
/// is exactly the byte the rolling checksum needs to evict.
#[derive(Clone, Debug)]
pub struct RingBuffer {
    buffer: Vec<u8>,
    /// Index of the oldest byte.
    head: usize,
    len: usize,
}

impl RingBuffer {
    /// Create an empty buffer holding at most `capacity` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        Self {
            buffer: vec![0u8; capacity],
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.buffer.len()
    }

    /// Append a byte, returning the evicted oldest byte if the buffer was full.
    #[inline]
    pub fn push_back(&mut self, byte: u8) -> Option<u8> {
        if self.len < self.buffer.len() {
            let pos = (self.head + self.len) % self.buffer.len();
            self.buffer[pos] = byte;
            self.len += 1;
            None
        } else {
            let outgoing = self.buffer[self.head];
            self.buffer[self.head] = byte;
            self.head = (self.head + 1) % self.buffer.len();
            Some(outgoing)
        }
    }

    /// Remove and return the oldest byte.
    #[inline]
    pub fn pop_front(&mut self) -> Option<u8> {
        if self.len == 0 {
            return None;
        }
        let byte = self.buffer[self.head];
        self.head = (self.head + 1) % self.buffer.len();
        self.len -= 1;
        Some(byte)
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Contiguous view of the contents, oldest byte first.
    ///
    /// Rotates the backing storage in place when the contents wrap.
    pub fn as_slice(&mut self) -> &[u8] {
        let end = self.head + self.len;
        if end <= self.buffer.len() {
            return &self.buffer[self.head..end];
        }
        self.buffer.rotate_left(self.head);
        self.head = 0;
        &self.buffer[..self.len]
    }
}

/// Growable buffer of literal bytes awaiting emission as `Insert` ops.
///
/// Pending bytes are emitted once they reach `chunk_len`, so no single
/// `Insert` grows past that size no matter how long a stretch of unmatched
/// target data is.
#[derive(Clone, Debug)]
pub struct InsertAccumulator {
    pending: Vec<u8>,
    chunk_len: usize,
}

impl InsertAccumulator {
    pub fn new(chunk_len: usize) -> Self {
        let chunk_len = chunk_len.max(1);
        Self {
            pending: Vec::new(),
            chunk_len,
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Add one literal byte.
    #[inline]
    pub fn push(&mut self, byte: u8, ops: &mut Vec<DeltaOp>) {
        self.pending.push(byte);
        if self.pending.len() >= self.chunk_len {
            self.flush_into(ops);
        }
    }

    /// Add a run of literal bytes.
    pub fn extend(&mut self, mut bytes: &[u8], ops: &mut Vec<DeltaOp>) {
        while !bytes.is_empty() {
            let room = self.chunk_len - self.pending.len();
            let (head, rest) = bytes.split_at(room.min(bytes.len()));
            self.pending.extend_from_slice(head);
            if self.pending.len() >= self.chunk_len {
                self.flush_into(ops);
            }
            bytes = rest;
        }
    }

    /// Emit pending bytes as one `Insert`. Does nothing when empty.
    pub fn flush_into(&mut self, ops: &mut Vec<DeltaOp>) {
        if self.pending.is_empty() {
            return;
        }
        let data = std::mem::replace(
            &mut self.pending,
            Vec::with_capacity(self.chunk_len.min(4096)),
        );
        ops.push(DeltaOp::Insert { data });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_empty() {
        let buf = RingBuffer::with_capacity(4);
        assert!(buf.is_empty());
        assert!(!buf.is_full());
        assert_eq!(buf.capacity(), 4);
    }

    #[test]
    fn push_when_full_returns_outgoing() {
        let mut buf = RingBuffer::with_capacity(3);
        assert_eq!(buf.push_back(1), None);
        assert_eq!(buf.push_back(2), None);
        assert_eq!(buf.push_back(3), None);
        assert!(buf.is_full());
        assert_eq!(buf.push_back(4), Some(1));
        assert_eq!(buf.push_back(5), Some(2));
        assert_eq!(buf.as_slice(), &[3, 4, 5]);
    }

    #[test]
    fn as_slice_unwraps_rotated_contents() {
        let mut buf = RingBuffer::with_capacity(4);
        for b in 0..10u8 {
            buf.push_back(b);
        }
        assert_eq!(buf.as_slice(), &[6, 7, 8, 9]);
        // Still behaves as a FIFO after the rotation.
        assert_eq!(buf.push_back(10), Some(6));
        assert_eq!(buf.as_slice(), &[7, 8, 9, 10]);
    }

    #[test]
    fn pop_front_drains_in_order() {
        let mut buf = RingBuffer::with_capacity(3);
        for b in [1, 2, 3, 4] {
            buf.push_back(b);
        }
        assert_eq!(buf.pop_front(), Some(2));
        assert_eq!(buf.pop_front(), Some(3));
        assert_eq!(buf.as_slice(), &[4]);
        assert_eq!(buf.pop_front(), Some(4));
        assert_eq!(buf.pop_front(), None);
    }

    #[test]
    fn clear_resets() {
        let mut buf = RingBuffer::with_capacity(2);
        buf.push_back(9);
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.as_slice(), &[] as &[u8]);
    }

    #[test]
    #[should_panic(expected = "capacity must be non-zero")]
    fn zero_capacity_panics() {
        let _ = RingBuffer::with_capacity(0);
    }

    #[test]
    fn accumulator_flushes_at_chunk_len() {
        let mut acc = InsertAccumulator::new(4);
        let mut ops = Vec::new();
        acc.extend(b"abcdefghij", &mut ops);
        assert_eq!(ops.len(), 2);
        assert_eq!(acc.len(), 2);
        acc.push(b'k', &mut ops);
        acc.flush_into(&mut ops);
        let joined: Vec<u8> = ops
            .iter()
            .flat_map(|op| match op {
                DeltaOp::Insert { data } => data.clone(),
                DeltaOp::Copy { .. } => unreachable!(),
            })
            .collect();
        assert_eq!(joined, b"abcdefghijk");
        assert!(acc.is_empty());
    }

    #[test]
    fn empty_flush_emits_nothing() {
        let mut acc = InsertAccumulator::new(16);
        let mut ops = Vec::new();
        acc.flush_into(&mut ops);
        assert!(ops.is_empty());
    }
}
