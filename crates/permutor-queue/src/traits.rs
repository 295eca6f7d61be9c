//! Queue traits: the abstract consumer and producer interfaces.
//!
//! These traits allow the worker to be backend-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests); both implement the
//! reader and the writer side.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// A queue-assigned message identifier.
///
/// Totally ordered within a stream; ids are assigned in append order and
/// never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl MessageId {
    /// The raw sequence value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A delivered message envelope.
///
/// Produced by [`QueueReader::read_next`] and
/// [`QueueReader::reclaim_pending`]; the backend records a matching
/// pending entry that lives until [`QueueReader::acknowledge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Queue-assigned id, ordered within the stream.
    pub id: MessageId,
    /// The message payload.
    pub payload: Bytes,
    /// Consumer group this delivery belongs to.
    pub group: String,
    /// Consumer currently owning the pending entry.
    pub consumer: String,
    /// When this delivery happened (Unix ms).
    pub delivered_at: i64,
    /// Total deliveries of this message, reclaims included.
    pub delivery_count: u32,
}

/// The consumer side of a durable stream with consumer-group semantics.
///
/// Delivery guarantee is at-least-once: a message is only removed from the
/// group's pending list by an explicit acknowledge, so a crash between
/// delivery and acknowledge leaves it reclaimable.
#[async_trait]
pub trait QueueReader: Send + Sync {
    /// Idempotently create a consumer group on a stream.
    ///
    /// Safe to call when the group already exists; the existing delivery
    /// cursor is left untouched.
    async fn ensure_group(&self, stream: &str, group: &str) -> Result<()>;

    /// Re-own every pending entry of the group for this stream.
    ///
    /// Entries claimed by *any* consumer are reassigned to `consumer`
    /// regardless of idle time and returned in original stream order.
    /// This is the crash-recovery path: work a previous process claimed
    /// but never acknowledged comes back here.
    async fn reclaim_pending(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
    ) -> Result<Vec<Message>>;

    /// Deliver the next not-yet-delivered message, if any.
    ///
    /// Non-blocking poll: returns `Ok(None)` when the stream has nothing
    /// past the group cursor. On delivery the group cursor advances and a
    /// pending entry is recorded for `consumer`.
    async fn read_next(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
    ) -> Result<Option<Message>>;

    /// Mark a message as fully handled.
    ///
    /// Permanently frees the pending entry. Acknowledging an id that is
    /// not pending is a no-op, not an error.
    async fn acknowledge(&self, stream: &str, group: &str, id: MessageId) -> Result<()>;
}

/// The producer side of a durable stream.
#[async_trait]
pub trait QueueWriter: Send + Sync {
    /// Append one message to a stream.
    ///
    /// Returns once the backend has durably accepted the message.
    async fn publish(&self, stream: &str, payload: Bytes) -> Result<MessageId>;
}
