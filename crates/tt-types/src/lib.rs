//! Foundation types for TinyTrack.
//!
//! Every other `tt` crate depends on `tt-types`. The crate is deliberately
//! small: the only identity in the system is the [`ContentId`], the 160-bit
//! digest that addresses stored content.

pub mod error;
pub mod object;

pub use error::TypeError;
pub use object::ContentId;
