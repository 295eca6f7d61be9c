//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use bytes::Bytes;

use permutor_queue::{MemoryQueue, Message, MessageId, QueueReader, QueueWriter};

/// An in-memory queue pre-wired with an inbound stream name.
pub struct QueueFixture {
    /// The shared queue backend.
    pub queue: Arc<MemoryQueue>,
    /// Stream candidates are seeded into.
    pub inbound_stream: String,
}

impl QueueFixture {
    /// Create a fixture around a fresh in-memory queue.
    pub fn new(inbound_stream: &str) -> Self {
        Self {
            queue: Arc::new(MemoryQueue::new()),
            inbound_stream: inbound_stream.to_string(),
        }
    }

    /// Publish each payload to the inbound stream, in order.
    pub async fn seed(&self, payloads: &[&[u8]]) -> Vec<MessageId> {
        let mut ids = Vec::with_capacity(payloads.len());
        for payload in payloads {
            let id = self
                .queue
                .publish(&self.inbound_stream, Bytes::copy_from_slice(payload))
                .await
                .expect("memory publish cannot fail");
            ids.push(id);
        }
        ids
    }

    /// Drain every undelivered message of a stream through a throwaway
    /// verification group, acknowledging as it goes.
    pub async fn drain(&self, stream: &str) -> Vec<Message> {
        self.queue
            .ensure_group(stream, "testkit-verify")
            .await
            .expect("ensure_group cannot fail in memory");
        let mut out = Vec::new();
        while let Some(message) = self
            .queue
            .read_next(stream, "testkit-verify", "testkit")
            .await
            .expect("memory read cannot fail")
        {
            self.queue
                .acknowledge(stream, "testkit-verify", message.id)
                .await
                .expect("memory ack cannot fail");
            out.push(message);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_and_drain() {
        let fixture = QueueFixture::new("candidates");
        let ids = fixture.seed(&[&[1, 2], &[3]]).await;
        assert_eq!(ids.len(), 2);

        let drained = fixture.drain("candidates").await;
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].payload.as_ref(), &[1, 2]);
        assert_eq!(drained[1].payload.as_ref(), &[3]);
    }
}
