//! # Permutor Worker
//!
//! The permutor service: pulls candidate byte sequences from an inbound
//! durable stream, expands each into rearrangements, republishes every
//! rearrangement to an outbound stream, and only then acknowledges the
//! source message.
//!
//! ## Reliability model
//!
//! Delivery is at-least-once. The single correctness rule is ordering: a
//! candidate is acknowledged only after its entire expansion has been
//! handed to the outbound publisher. A crash at any earlier point leaves
//! the candidate pending, and the next start reclaims and reprocesses it.
//! Duplicate outbound messages after such a recovery are a documented,
//! accepted cost; idempotent consumption is a downstream concern.
//!
//! ## Key Types
//!
//! - [`Worker`] - The orchestrator state machine
//! - [`WorkerConfig`] - JSON-loaded service configuration
//! - [`Progress`] / [`ProgressReporter`] - Observability-only counters

pub mod config;
pub mod error;
pub mod progress;
pub mod worker;

pub use config::WorkerConfig;
pub use error::{ConfigError, Result, WorkerError};
pub use progress::{LogReporter, Progress, ProgressReporter};
pub use worker::{Worker, WorkerState};
