//! Error types for the worker.

use permutor_core::CoreError;
use permutor_queue::QueueError;
use thiserror::Error;

/// Errors loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Could not read the file.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file exists but is not valid JSON for [`crate::WorkerConfig`].
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors that can occur during worker operations.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Queue backend error.
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// Candidate decoding error.
    #[error("candidate error: {0}")]
    Candidate(#[from] CoreError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for worker operations.
pub type Result<T> = std::result::Result<T, WorkerError>;
