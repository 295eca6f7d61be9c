//! Progress reporting: counters the orchestrator mirrors outward.
//!
//! Progress is observability only. It is rebuilt from zero on every start
//! and never consulted for control flow, so losing it in a crash costs
//! nothing. The orchestrator hands a snapshot to a single reporter after
//! each step; there is no broadcast fan-out and no shared mutable state.

use permutor_core::Candidate;
use tracing::info;

/// A snapshot of the worker's progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    /// Source candidates fully processed (expanded, published, acked).
    pub processed: u64,
    /// Rearrangements handed to the outbound publisher.
    pub emitted: u64,
    /// The most recently emitted rearrangement.
    pub last: Option<Candidate>,
    /// When this snapshot was taken (Unix ms).
    pub at_millis: i64,
}

impl Progress {
    /// A fresh zeroed progress record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one published rearrangement.
    pub(crate) fn record_emitted(&mut self, candidate: &Candidate) {
        self.emitted += 1;
        self.last = Some(candidate.clone());
        self.at_millis = now_millis();
    }

    /// Record one fully processed source candidate.
    pub(crate) fn record_processed(&mut self) {
        self.processed += 1;
        self.at_millis = now_millis();
    }
}

/// Sink for progress snapshots.
///
/// Side effect only; implementations must not influence processing.
pub trait ProgressReporter: Send + Sync {
    /// Observe a progress snapshot.
    fn report(&self, progress: &Progress);
}

/// Reporter that emits structured tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl LogReporter {
    /// Create a new log reporter.
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for LogReporter {
    fn report(&self, progress: &Progress) {
        info!(
            processed = progress.processed,
            emitted = progress.emitted,
            last = progress.last.as_ref().map(|c| c.to_hex()).as_deref().unwrap_or("-"),
            "progress"
        );
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let mut progress = Progress::new();
        let candidate = Candidate::new(vec![1, 2]).unwrap();

        progress.record_emitted(&candidate);
        progress.record_emitted(&candidate);
        progress.record_processed();

        assert_eq!(progress.emitted, 2);
        assert_eq!(progress.processed, 1);
        assert_eq!(progress.last.as_ref().unwrap().as_slice(), &[1, 2]);
    }
}
