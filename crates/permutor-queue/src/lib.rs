//! # Permutor Queue
//!
//! Durable-queue abstraction for permutor. Provides a trait-based interface
//! over an append-only stream with consumer-group semantics, with SQLite and
//! in-memory implementations.
//!
//! ## Overview
//!
//! A *stream* is a named, append-only sequence of messages with totally
//! ordered, queue-assigned ids. A *consumer group* holds a delivery cursor
//! per stream plus a pending-entry list: a message delivered to a consumer
//! stays pending until it is acknowledged, so a consumer that crashes
//! mid-work leaves a durable record that a successor can reclaim.
//!
//! ## Key Types
//!
//! - [`QueueReader`] / [`QueueWriter`] - The async consumer/producer traits
//! - [`SqliteQueue`] - SQLite-based persistent backend
//! - [`MemoryQueue`] - In-memory backend for tests
//! - [`Message`] - Delivered envelope (id, payload, delivery metadata)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use permutor_queue::{QueueReader, QueueWriter, SqliteQueue};
//!
//! async fn example() {
//!     let queue = SqliteQueue::open("permutor.db").unwrap();
//!     queue.ensure_group("candidates", "workers").await.unwrap();
//!
//!     queue.publish("candidates", vec![1, 2, 3].into()).await.unwrap();
//!
//!     if let Some(message) = queue.read_next("candidates", "workers", "worker-1").await.unwrap() {
//!         // ... process ...
//!         queue.acknowledge("candidates", "workers", message.id).await.unwrap();
//!     }
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **At-least-once**: an unacknowledged message is redelivered via
//!   [`QueueReader::reclaim_pending`], never silently dropped
//! - **Idempotent group creation**: `ensure_group` never fails on an
//!   existing group
//! - **Idempotent acknowledge**: acking an id that is no longer pending is
//!   a no-op

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{QueueError, Result};
pub use memory::MemoryQueue;
pub use sqlite::SqliteQueue;
pub use traits::{Message, MessageId, QueueReader, QueueWriter};
