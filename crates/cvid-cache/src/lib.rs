//! Walk cache for compiler-visible identities.
//!
//! The first walk of every node is remembered. Any later walk that disagrees
//! with the remembered one means some node changed underneath the compiler,
//! which would silently invalidate every digest computed from it; the cache
//! re-walks everything it has seen and fails with a report naming each
//! changed node.
//!
//! # Key Types
//!
//! - [`WalkCache`] -- First-observed records, keyed by node identity
//! - [`CacheEntry`] -- One cached node and its record
//! - [`InstabilityReport`] -- Every node whose walk changed, with diffs
//! - [`CacheError`] -- Fatal instability faults

pub mod cache;
pub mod entry;
pub mod error;
pub mod report;

pub use cache::{WalkCache, DEFAULT_MAX_REPORTED};
pub use entry::CacheEntry;
pub use error::{CacheError, CacheResult};
pub use report::{InstabilityReport, UnstableNode};
