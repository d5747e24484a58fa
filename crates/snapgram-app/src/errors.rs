//! Failure outcomes of mutations and cached reads
//!
//! Both distinguish a silent failure (the backend answered with no usable
//! result) from a rejection. The distinction is kept for logging and tests;
//! the user sees the same one-shot notice either way.

use snapgram_core::BackendError;

/// Why a mutation ended in the Error state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// The call resolved without a usable result
    #[error("operation returned no result")]
    NoResult,

    /// The call was rejected
    #[error("operation rejected: {0}")]
    Rejected(#[from] BackendError),
}

impl MutationError {
    /// Resolved without a result rather than being rejected.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::NoResult)
    }
}

/// Why a cached read could not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The read resolved without a value
    #[error("query returned no result")]
    NoResult,

    /// The read was rejected
    #[error("query failed: {0}")]
    Backend(#[from] BackendError),
}
