//! Content-addressed blob storage with delta chains for TinyTrack.
//!
//! Every blob is identified by the git-style SHA-1 of its content
//! (`sha1("blob <len>\0" + data)`). A new version may be stored as a delta
//! against the version it replaces, producing chains of deltas that end at a
//! raw object.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`LooseObjectStore`] -- one file per object under `objects/<2 hex>/`
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written; the first writer of an ID wins.
//! 2. A delta is written only after it has been replayed and hashed back to
//!    the ID it is stored under. Any failure along the way stores raw bytes.
//! 3. Chains never grow past [`StoreConfig::max_chain_depth`], and reads
//!    refuse to follow them further.
//! 4. Objects without metadata are raw, unless their bytes carry the delta
//!    magic, in which case reads fail loudly.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod chained;
pub mod config;
pub mod error;
pub mod loose;
pub mod memory;
pub mod metadata;
pub mod traits;

pub use chained::{ChainedBlobStore, ObjectStats, StoreOutcome};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use loose::LooseObjectStore;
pub use memory::InMemoryObjectStore;
pub use metadata::BlobMetadata;
pub use traits::ObjectStore;
