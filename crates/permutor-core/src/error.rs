//! Error types for the core crate.

use thiserror::Error;

/// Errors that can occur when constructing core types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Candidate exceeds the maximum supported length.
    #[error("candidate too long: {len} bytes (max {max})")]
    CandidateTooLong { len: usize, max: usize },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
