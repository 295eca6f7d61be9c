//! Error types for the queue module.

use thiserror::Error;

/// Errors that can occur during queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Consumer group does not exist on the stream.
    ///
    /// Reads require `ensure_group` to have been called first.
    #[error("consumer group {group} missing on stream {stream}")]
    GroupMissing { stream: String, group: String },

    /// Runtime-level failure (task join, poisoned lock).
    #[error("runtime error: {0}")]
    Runtime(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
