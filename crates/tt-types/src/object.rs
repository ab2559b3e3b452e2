use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content-addressed identifier for stored content.
///
/// A `ContentId` is the 160-bit digest of an object's *plaintext* bytes. It
/// never depends on how those bytes are stored, so a blob keeps the same id
/// whether it is held raw or as a delta against another version. Ordering is
/// plain byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId([u8; 20]);

impl ContentId {
    /// Length of the digest in bytes.
    pub const LEN: usize = 20;

    /// Create a `ContentId` from a pre-computed digest.
    pub const fn from_hash(hash: [u8; 20]) -> Self {
        Self(hash)
    }

    /// Create a `ContentId` from a digest slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        let arr: [u8; 20] = bytes.try_into().map_err(|_| TypeError::InvalidLength {
            expected: Self::LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// The null content ID (all zeros). Represents "no object".
    pub const fn null() -> Self {
        Self([0u8; 20])
    }

    /// Returns `true` if this is the null content ID.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// The raw 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.short_hex())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ContentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 20]> for ContentId {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<ContentId> for [u8; 20] {
    fn from(id: ContentId) -> Self {
        id.0
    }
}

impl AsRef<[u8]> for ContentId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContentId {
        let mut bytes = [0u8; 20];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8 * 13;
        }
        ContentId::from_hash(bytes)
    }

    #[test]
    fn null_is_all_zeros() {
        let null = ContentId::null();
        assert!(null.is_null());
        assert_eq!(null.as_bytes(), &[0u8; 20]);
        assert!(!sample().is_null());
    }

    #[test]
    fn hex_roundtrip() {
        let id = sample();
        let hex = id.to_hex();
        assert_eq!(hex.len(), 40);
        let parsed = ContentId::from_hex(&hex).unwrap();
        assert_eq!(id, parsed);
        assert_eq!(hex.parse::<ContentId>().unwrap(), id);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = ContentId::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 20,
                actual: 2
            }
        );
    }

    #[test]
    fn from_hex_rejects_garbage() {
        let err = ContentId::from_hex("zz").unwrap_err();
        assert!(matches!(err, TypeError::InvalidHex(_)));
    }

    #[test]
    fn from_slice_checks_length() {
        assert!(ContentId::from_slice(&[1u8; 20]).is_ok());
        assert!(ContentId::from_slice(&[1u8; 32]).is_err());
    }

    #[test]
    fn short_hex_is_8_chars() {
        assert_eq!(sample().short_hex().len(), 8);
        assert!(format!("{:?}", sample()).starts_with("ContentId("));
    }

    #[test]
    fn display_is_full_hex() {
        let id = sample();
        assert_eq!(format!("{id}"), id.to_hex());
    }

    #[test]
    fn serde_roundtrip() {
        let id = sample();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: ContentId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn ordering_is_byte_order() {
        let mut low = [0u8; 20];
        let mut high = [0u8; 20];
        low[19] = 0xff;
        high[0] = 0x01;
        assert!(ContentId::from_hash(low) < ContentId::from_hash(high));
    }
}
