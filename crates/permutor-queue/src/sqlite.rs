//! SQLite implementation of the queue traits.
//!
//! This is the primary durable backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::{QueueError, Result};
use crate::migration;
use crate::traits::{Message, MessageId, QueueReader, QueueWriter};

/// SQLite-based queue backend.
///
/// Thread-safe via internal Mutex. All operations use `spawn_blocking`
/// to avoid blocking the async runtime. Cursor updates and appends run
/// inside transactions, so a delivery is never observable without its
/// pending entry.
pub struct SqliteQueue {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteQueue {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking closure against the connection on a blocking thread.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|e| QueueError::Runtime(format!("mutex poisoned: {}", e)))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| QueueError::Runtime(format!("spawn_blocking failed: {}", e)))?
    }
}

/// Look up a group's delivery cursor within a transaction.
fn group_cursor(conn: &Connection, stream: &str, group: &str) -> Result<u64> {
    conn.query_row(
        "SELECT last_delivered_seq FROM consumer_groups WHERE stream = ?1 AND group_name = ?2",
        params![stream, group],
        |row| row.get::<_, i64>(0),
    )
    .optional()?
    .map(|seq| seq as u64)
    .ok_or_else(|| QueueError::GroupMissing {
        stream: stream.to_string(),
        group: group.to_string(),
    })
}

#[async_trait]
impl QueueReader for SqliteQueue {
    async fn ensure_group(&self, stream: &str, group: &str) -> Result<()> {
        let stream = stream.to_string();
        let group = group.to_string();

        self.with_conn(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO consumer_groups (stream, group_name, last_delivered_seq, created_at)
                 VALUES (?1, ?2, 0, ?3)",
                params![stream, group, now_millis()],
            )?;
            if inserted > 0 {
                debug!(stream = %stream, group = %group, "consumer group created");
            }
            Ok(())
        })
        .await
    }

    async fn reclaim_pending(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
    ) -> Result<Vec<Message>> {
        let stream = stream.to_string();
        let group = group.to_string();
        let consumer = consumer.to_string();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let now = now_millis();

            let messages = {
                let mut stmt = tx.prepare(
                    "SELECT p.seq, m.payload, p.delivery_count
                     FROM pending_entries p
                     JOIN messages m ON m.stream = p.stream AND m.seq = p.seq
                     WHERE p.stream = ?1 AND p.group_name = ?2
                     ORDER BY p.seq",
                )?;

                let rows = stmt.query_map(params![stream, group], |row| {
                    let seq: i64 = row.get(0)?;
                    let payload: Vec<u8> = row.get(1)?;
                    let delivery_count: u32 = row.get(2)?;
                    Ok(Message {
                        id: MessageId(seq as u64),
                        payload: Bytes::from(payload),
                        group: group.clone(),
                        consumer: consumer.clone(),
                        delivered_at: now,
                        // +1 for the delivery happening right now
                        delivery_count: delivery_count + 1,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            };

            tx.execute(
                "UPDATE pending_entries
                 SET consumer = ?3, delivered_at = ?4, delivery_count = delivery_count + 1
                 WHERE stream = ?1 AND group_name = ?2",
                params![stream, group, consumer, now],
            )?;

            tx.commit()?;
            Ok(messages)
        })
        .await
    }

    async fn read_next(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
    ) -> Result<Option<Message>> {
        let stream = stream.to_string();
        let group = group.to_string();
        let consumer = consumer.to_string();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let cursor = group_cursor(&tx, &stream, &group)?;

            let next: Option<(i64, Vec<u8>)> = tx
                .query_row(
                    "SELECT seq, payload FROM messages
                     WHERE stream = ?1 AND seq > ?2
                     ORDER BY seq LIMIT 1",
                    params![stream, cursor as i64],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let Some((seq, payload)) = next else {
                tx.commit()?;
                return Ok(None);
            };

            let now = now_millis();
            tx.execute(
                "UPDATE consumer_groups SET last_delivered_seq = ?3
                 WHERE stream = ?1 AND group_name = ?2",
                params![stream, group, seq],
            )?;
            tx.execute(
                "INSERT INTO pending_entries (stream, group_name, seq, consumer, delivered_at, delivery_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1)",
                params![stream, group, seq, consumer, now],
            )?;
            tx.commit()?;

            Ok(Some(Message {
                id: MessageId(seq as u64),
                payload: Bytes::from(payload),
                group,
                consumer,
                delivered_at: now,
                delivery_count: 1,
            }))
        })
        .await
    }

    async fn acknowledge(&self, stream: &str, group: &str, id: MessageId) -> Result<()> {
        let stream = stream.to_string();
        let group = group.to_string();

        self.with_conn(move |conn| {
            // Deleting an already-acknowledged entry is a no-op.
            conn.execute(
                "DELETE FROM pending_entries
                 WHERE stream = ?1 AND group_name = ?2 AND seq = ?3",
                params![stream, group, id.as_u64() as i64],
            )?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl QueueWriter for SqliteQueue {
    async fn publish(&self, stream: &str, payload: Bytes) -> Result<MessageId> {
        let stream = stream.to_string();
        let payload = payload.to_vec();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let next: i64 = tx.query_row(
                "SELECT COALESCE(MAX(seq), 0) + 1 FROM messages WHERE stream = ?1",
                params![stream],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT INTO messages (stream, seq, payload, appended_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![stream, next, payload, now_millis()],
            )?;
            tx.commit()?;

            Ok(MessageId(next as u64))
        })
        .await
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

    #[tokio::test]
    async fn test_publish_assigns_ordered_ids() {
        let queue = SqliteQueue::open_memory().unwrap();

        let a = queue.publish("in", Bytes::from_static(&[1])).await.unwrap();
        let b = queue.publish("in", Bytes::from_static(&[2])).await.unwrap();
        assert!(a < b);

        // Ids are per-stream.
        let other = queue.publish("out", Bytes::from_static(&[3])).await.unwrap();
        assert_eq!(other, MessageId(1));
    }

    #[tokio::test]
    async fn test_ensure_group_idempotent() {
        let queue = SqliteQueue::open_memory().unwrap();

        queue.ensure_group("in", "workers").await.unwrap();
        queue.publish("in", Bytes::from_static(&[1])).await.unwrap();
        queue.read_next("in", "workers", "w1").await.unwrap().unwrap();

        // Re-ensuring must not reset the cursor.
        queue.ensure_group("in", "workers").await.unwrap();
        assert!(queue.read_next("in", "workers", "w1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_next_requires_group() {
        let queue = SqliteQueue::open_memory().unwrap();
        queue.publish("in", Bytes::from_static(&[1])).await.unwrap();

        let err = queue.read_next("in", "nope", "w1").await.unwrap_err();
        assert!(matches!(err, QueueError::GroupMissing { .. }));
    }

    #[tokio::test]
    async fn test_read_ack_lifecycle() {
        let queue = SqliteQueue::open_memory().unwrap();
        queue.ensure_group("in", "workers").await.unwrap();
        queue.publish("in", Bytes::from_static(&[7, 8])).await.unwrap();

        let message = queue.read_next("in", "workers", "w1").await.unwrap().unwrap();
        assert_eq!(message.payload.as_ref(), &[7, 8]);
        assert_eq!(message.consumer, "w1");
        assert_eq!(message.delivery_count, 1);

        // Nothing new while the first is pending.
        assert!(queue.read_next("in", "workers", "w1").await.unwrap().is_none());

        queue.acknowledge("in", "workers", message.id).await.unwrap();
        let reclaimed = queue.reclaim_pending("in", "workers", "w1").await.unwrap();
        assert!(reclaimed.is_empty());
    }

    #[tokio::test]
    async fn test_acknowledge_idempotent() {
        let queue = SqliteQueue::open_memory().unwrap();
        queue.ensure_group("in", "workers").await.unwrap();
        queue.publish("in", Bytes::from_static(&[1])).await.unwrap();

        let message = queue.read_next("in", "workers", "w1").await.unwrap().unwrap();
        queue.acknowledge("in", "workers", message.id).await.unwrap();
        queue.acknowledge("in", "workers", message.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_reclaim_transfers_ownership_in_order() {
        let queue = SqliteQueue::open_memory().unwrap();
        queue.ensure_group("in", "workers").await.unwrap();
        for byte in [1u8, 2, 3] {
            queue.publish("in", Bytes::copy_from_slice(&[byte])).await.unwrap();
        }

        // A first consumer claims two messages, then "crashes" without acking.
        queue.read_next("in", "workers", "w-old").await.unwrap().unwrap();
        queue.read_next("in", "workers", "w-old").await.unwrap().unwrap();

        let reclaimed = queue.reclaim_pending("in", "workers", "w-new").await.unwrap();
        assert_eq!(reclaimed.len(), 2);
        assert_eq!(reclaimed[0].id, MessageId(1));
        assert_eq!(reclaimed[1].id, MessageId(2));
        for message in &reclaimed {
            assert_eq!(message.consumer, "w-new");
            assert_eq!(message.delivery_count, 2);
        }

        // The third message was never delivered and still reads fresh.
        let fresh = queue.read_next("in", "workers", "w-new").await.unwrap().unwrap();
        assert_eq!(fresh.id, MessageId(3));
    }

    #[tokio::test]
    async fn test_pending_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.db");

        {
            let queue = SqliteQueue::open(&path).unwrap();
            queue.ensure_group("in", "workers").await.unwrap();
            queue.publish("in", Bytes::from_static(&[7, 8])).await.unwrap();
            queue.read_next("in", "workers", "w1").await.unwrap().unwrap();
            // Dropped without acknowledging.
        }

        let queue = SqliteQueue::open(&path).unwrap();
        let reclaimed = queue.reclaim_pending("in", "workers", "w2").await.unwrap();
        assert_eq!(reclaimed.len(), 1);
        assert_eq!(reclaimed[0].payload.as_ref(), &[7, 8]);
    }
}
