//! Hashing primitives for TinyTrack.
//!
//! Provides domain-separated SHA-1 content addressing and the pluggable
//! strong-digest strategy used to confirm rolling-checksum matches.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod hasher;
pub mod strong;

pub use hasher::ContentHasher;
pub use strong::{Sha1Strong, StrongHash};
