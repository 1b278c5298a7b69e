//! Error types for the consensus core

use thiserror::Error;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the consensus and consistency engines
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Graph or partition input is unusable: empty, mismatched node sets,
    /// invalid weights or parameters
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The community detection oracle failed
    #[error("community detection failed: {0}")]
    Oracle(String),

    /// The re-clustering loop hit its iteration cap without the candidate
    /// partitions agreeing
    #[error("consensus did not converge after {iterations} iterations")]
    NonConvergence {
        /// Number of iterations attempted
        iterations: usize,
    },
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedInput(msg.into())
    }
}
