//! Service configuration, loaded from a JSON file.
//!
//! A missing file is not an error: the worker starts with defaults, the
//! same way the file is optional for local runs. A present-but-malformed
//! file is fatal at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use permutor_core::ExpandMode;

use crate::error::ConfigError;

/// Configuration for the worker service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    /// Path to the SQLite queue database.
    pub db_path: PathBuf,
    /// Stream candidates are read from.
    pub inbound_stream: String,
    /// Stream rearrangements are published to.
    pub outbound_stream: String,
    /// Consumer-group name shared by cooperating worker instances.
    pub group: String,
    /// This worker's consumer identity within the group.
    pub consumer: String,
    /// Polling interval for the inbound stream, in milliseconds.
    pub poll_interval_ms: u64,
    /// Expansion strategy.
    pub mode: ExpandMode,
    /// Emit a progress event every N published rearrangements.
    /// Zero disables the per-emission cadence; per-candidate events remain.
    pub progress_every: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("permutor.db"),
            inbound_stream: "candidates".to_string(),
            outbound_stream: "rearrangements".to_string(),
            group: "permutor-workers".to_string(),
            consumer: "worker-1".to_string(),
            poll_interval_ms: 500,
            mode: ExpandMode::default(),
            progress_every: 100,
        }
    }
}

impl WorkerConfig {
    /// Load configuration from a JSON file.
    ///
    /// Returns defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "config file absent, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// The polling interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
