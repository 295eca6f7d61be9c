//! In-memory implementation of the queue traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{QueueError, Result};
use crate::traits::{Message, MessageId, QueueReader, QueueWriter};

/// In-memory queue backend.
///
/// All data is lost when the queue is dropped. Thread-safe via RwLock.
pub struct MemoryQueue {
    inner: RwLock<MemoryQueueInner>,
}

#[derive(Default)]
struct MemoryQueueInner {
    /// Messages per stream, keyed by seq.
    messages: HashMap<String, BTreeMap<u64, Bytes>>,

    /// Delivery cursor per (stream, group).
    cursors: HashMap<(String, String), u64>,

    /// Pending entries per (stream, group), keyed by seq.
    pending: HashMap<(String, String), BTreeMap<u64, PendingState>>,
}

#[derive(Clone)]
struct PendingState {
    consumer: String,
    delivered_at: i64,
    delivery_count: u32,
}

impl MemoryQueue {
    /// Create a new empty in-memory queue.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryQueueInner::default()),
        }
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueReader for MemoryQueue {
    async fn ensure_group(&self, stream: &str, group: &str) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner
            .cursors
            .entry((stream.to_string(), group.to_string()))
            .or_insert(0);
        Ok(())
    }

    async fn reclaim_pending(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
    ) -> Result<Vec<Message>> {
        let mut inner = self.inner.write().unwrap();
        let key = (stream.to_string(), group.to_string());
        let now = now_millis();

        let Some(pending) = inner.pending.get(&key) else {
            return Ok(Vec::new());
        };
        let seqs: Vec<u64> = pending.keys().copied().collect();

        let mut messages = Vec::with_capacity(seqs.len());
        for seq in seqs {
            let payload = inner
                .messages
                .get(stream)
                .and_then(|m| m.get(&seq))
                .cloned()
                .ok_or_else(|| {
                    QueueError::Runtime(format!("pending entry {} has no message", seq))
                })?;

            let entry = inner
                .pending
                .get_mut(&key)
                .and_then(|p| p.get_mut(&seq))
                .expect("seq collected from this map");
            entry.consumer = consumer.to_string();
            entry.delivered_at = now;
            entry.delivery_count += 1;

            messages.push(Message {
                id: MessageId(seq),
                payload,
                group: group.to_string(),
                consumer: consumer.to_string(),
                delivered_at: now,
                delivery_count: entry.delivery_count,
            });
        }

        Ok(messages)
    }

    async fn read_next(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
    ) -> Result<Option<Message>> {
        let mut inner = self.inner.write().unwrap();
        let key = (stream.to_string(), group.to_string());

        let cursor = *inner
            .cursors
            .get(&key)
            .ok_or_else(|| QueueError::GroupMissing {
                stream: stream.to_string(),
                group: group.to_string(),
            })?;

        let next = inner.messages.get(stream).and_then(|messages| {
            messages
                .range(cursor + 1..)
                .next()
                .map(|(&seq, payload)| (seq, payload.clone()))
        });

        let Some((seq, payload)) = next else {
            return Ok(None);
        };

        let now = now_millis();
        inner.cursors.insert(key.clone(), seq);
        inner.pending.entry(key).or_default().insert(
            seq,
            PendingState {
                consumer: consumer.to_string(),
                delivered_at: now,
                delivery_count: 1,
            },
        );

        Ok(Some(Message {
            id: MessageId(seq),
            payload,
            group: group.to_string(),
            consumer: consumer.to_string(),
            delivered_at: now,
            delivery_count: 1,
        }))
    }

    async fn acknowledge(&self, stream: &str, group: &str, id: MessageId) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let key = (stream.to_string(), group.to_string());
        if let Some(pending) = inner.pending.get_mut(&key) {
            pending.remove(&id.as_u64());
        }
        Ok(())
    }
}

#[async_trait]
impl QueueWriter for MemoryQueue {
    async fn publish(&self, stream: &str, payload: Bytes) -> Result<MessageId> {
        let mut inner = self.inner.write().unwrap();
        let messages = inner.messages.entry(stream.to_string()).or_default();
        let seq = messages.keys().next_back().copied().unwrap_or(0) + 1;
        messages.insert(seq, payload);
        Ok(MessageId(seq))
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
