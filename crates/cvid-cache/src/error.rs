//! Error types for the cache crate.

use crate::report::InstabilityReport;

/// Faults raised when a cached walk no longer reproduces.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// One or more cached nodes walk differently than when first seen.
    #[error("{0}")]
    Unstable(Box<InstabilityReport>),

    /// A node's record changed, yet re-walking the cache found nothing.
    #[error("found unstable object {node}, but the instability check found no changed node")]
    UnattributedMismatch { node: String },
}

impl CacheError {
    /// The report, if this is an attributed instability.
    pub fn report(&self) -> Option<&InstabilityReport> {
        match self {
            Self::Unstable(report) => Some(report),
            Self::UnattributedMismatch { .. } => None,
        }
    }
}

/// Convenience alias for cache results.
pub type CacheResult<T> = Result<T, CacheError>;
