//! Adler-style weak checksum over a sliding byte window.
//!
//! Two 16-bit accumulators: `a` is the byte sum, `b` the running sum of `a`
//! after each byte. Sliding the window by one byte costs O(1), which is what
//! keeps target scanning linear in the target length.

/// Rolling weak checksum.
///
/// The checksum does not own the window bytes; the caller supplies the byte
/// leaving the window when rolling or trimming.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RollingChecksum {
    a: u32,
    b: u32,
    len: usize,
}

impl RollingChecksum {
    /// Create a checksum with zeroed state.
    pub const fn new() -> Self {
        Self { a: 0, b: 0, len: 0 }
    }

    /// Compute the checksum of `block` from scratch.
    pub fn of(block: &[u8]) -> Self {
        let mut sum = Self::new();
        sum.update(block);
        sum
    }

    /// Reset to the empty state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Number of bytes currently covered.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no bytes are covered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append one byte to the window without evicting anything.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.a = (self.a + u32::from(byte)) & 0xffff;
        self.b = (self.b + self.a) & 0xffff;
        self.len += 1;
    }

    /// Append a run of bytes without evicting anything.
    pub fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    /// Slide a full window by one byte: `outgoing` leaves, `incoming` enters.
    #[inline]
    pub fn roll(&mut self, outgoing: u8, incoming: u8) {
        debug_assert!(self.len > 0, "rolling an empty window");
        let out = u32::from(outgoing);
        let window = self.len as u32;
        self.a = self.a.wrapping_sub(out).wrapping_add(u32::from(incoming)) & 0xffff;
        self.b = self
            .b
            .wrapping_sub(window.wrapping_mul(out))
            .wrapping_add(self.a)
            & 0xffff;
    }

    /// Drop the oldest byte without adding a new one (window shrinks by one).
    #[inline]
    pub fn trim_front(&mut self, outgoing: u8) {
        debug_assert!(self.len > 0, "trimming an empty window");
        let out = u32::from(outgoing);
        let window = self.len as u32;
        self.a = self.a.wrapping_sub(out) & 0xffff;
        self.b = self.b.wrapping_sub(window.wrapping_mul(out)) & 0xffff;
        self.len -= 1;
    }

    /// The 32-bit weak checksum: `(b << 16) | a`.
    #[inline]
    pub fn weak(&self) -> u32 {
        (self.b << 16) | self.a
    }
}
