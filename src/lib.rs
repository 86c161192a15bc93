//! Duplicate-equivalence engine: finds sets of regular files whose byte
//! contents are bit-for-bit identical across one or more filesystem
//! roots, by size-bucketing and then progressively partitioning
//! candidates by directly-compared buffers — never by hashing.
//!
//! The core (size-bucketing, equivalence partitioning, the stream pool,
//! and the adaptive resource controller) lives in [`engine`],
//! [`partition`], [`stream_pool`], [`resource`], and [`indexer`]. Walking,
//! reporting, preference strategies, and delete/coalesce are separate,
//! cleanly-interfaced collaborators, not part of the core.

pub mod cli;
pub mod engine;
pub mod entry;
pub mod error;
pub mod identity;
pub mod indexer;
pub mod partition;
pub mod postprocess;
pub mod prefer;
pub mod progress;
pub mod report;
pub mod resource;
pub mod stream_pool;
pub mod walker;

pub use engine::{Engine, EngineConfig};
pub use entry::{FileEntry, Root};
pub use error::{Error, Result};
pub use identity::{FileInstance, StorageId};
pub use partition::DuplicateSet;
pub use resource::ResourceBounds;
