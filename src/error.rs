//! Errors reported by the batch engine.
//!
//! Only resource acquisition failures and broken caller contracts are errors.
//! A candidate that does not match is ordinary control flow and is reported
//! through [`MIN_WEIGHT`](crate::MIN_WEIGHT) or an empty result.

use std::collections::TryReserveError;

use rayon::ThreadPoolBuildError;
use thiserror::Error;

/// Failure of a batch call. A failed call never yields partial output.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The worker threads could not be started
    #[error("failed to start worker threads: {0}")]
    Spawn(#[from] ThreadPoolBuildError),

    /// Candidate positions are `u32`, a batch cannot hold more candidates
    #[error("{count} candidates exceed the limit of {} per batch", u32::MAX)]
    TooManyCandidates {
        /// Number of candidates passed in
        count: usize,
    },

    /// A per-call buffer could not be allocated
    #[error("out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),

    /// `highlights` was called with a candidate that does not match the pattern
    #[error("candidate {index} does not match the pattern it is being highlighted for")]
    HighlightMismatch {
        /// Position of the offending candidate in the input
        index: usize,
    },

    /// A task panicked on a worker thread
    #[error("a worker task panicked")]
    TaskPanicked,
}

/// Result type of the batch engine
pub type Result<T> = std::result::Result<T, EngineError>;
