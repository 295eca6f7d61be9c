//! The orchestrator: wires reader, engine, writer, and progress together.
//!
//! Lifecycle: `Starting → Recovering → Polling ⇄ Processing → Stopping →
//! Stopped`. Exactly one source candidate is in flight at a time, so the
//! resource bound is one candidate's full fan-out, and the ordering
//! invariant (acknowledge only after the whole expansion has been
//! published) holds trivially.
//!
//! Cancellation is cooperative and observed only at the polling boundary;
//! an in-flight candidate always finishes publish-all-then-ack first.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use permutor_core::{expand, Candidate};
use permutor_queue::{Message, QueueReader, QueueWriter};

use crate::config::WorkerConfig;
use crate::error::Result;
use crate::progress::{Progress, ProgressReporter};

/// Lifecycle states of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Ensuring consumer groups exist.
    Starting,
    /// Draining reclaimed pending work before accepting anything new.
    Recovering,
    /// Waiting for the next inbound candidate.
    Polling,
    /// Expanding and republishing one candidate.
    Processing,
    /// Shutdown observed; tearing down.
    Stopping,
    /// Terminal.
    Stopped,
}

/// The worker orchestrator.
///
/// Generic over the queue backend (one type serving both the reader and
/// the writer side) and the progress sink.
pub struct Worker<Q, R> {
    queue: Arc<Q>,
    reporter: R,
    config: WorkerConfig,
    progress: Progress,
    state: WorkerState,
}

impl<Q, R> Worker<Q, R>
where
    Q: QueueReader + QueueWriter,
    R: ProgressReporter,
{
    /// Create a worker over a queue backend.
    pub fn new(queue: Arc<Q>, reporter: R, config: WorkerConfig) -> Self {
        Self {
            queue,
            reporter,
            config,
            progress: Progress::new(),
            state: WorkerState::Starting,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Current progress counters.
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle phases
    // ─────────────────────────────────────────────────────────────────────

    /// Starting phase: ensure consumer groups on both streams.
    ///
    /// Both calls are idempotent. Failure here is fatal; the worker never
    /// reaches the polling loop.
    pub async fn start(&mut self) -> Result<()> {
        self.queue
            .ensure_group(&self.config.inbound_stream, &self.config.group)
            .await?;
        self.queue
            .ensure_group(&self.config.outbound_stream, &self.config.group)
            .await?;
        info!(
            inbound = %self.config.inbound_stream,
            outbound = %self.config.outbound_stream,
            group = %self.config.group,
            consumer = %self.config.consumer,
            "worker started"
        );
        self.state = WorkerState::Recovering;
        Ok(())
    }

    /// Recovering phase: reclaim and reprocess every pending entry.
    ///
    /// Messages a previous instance claimed but never acknowledged run
    /// through the normal processing path, in original stream order,
    /// before any new message is read. A message whose processing fails
    /// again stays pending for the next recovery; only a backend failure
    /// of the reclaim itself is returned to the caller.
    pub async fn recover(&mut self) -> Result<usize> {
        let reclaimed = self
            .queue
            .reclaim_pending(
                &self.config.inbound_stream,
                &self.config.group,
                &self.config.consumer,
            )
            .await?;

        if !reclaimed.is_empty() {
            info!(count = reclaimed.len(), "reclaimed pending candidates");
        }

        let total = reclaimed.len();
        for message in reclaimed {
            self.state = WorkerState::Processing;
            if let Err(e) = self.process(&message).await {
                warn!(id = %message.id, error = %e, "reprocessing reclaimed candidate failed");
            }
        }

        self.state = WorkerState::Polling;
        Ok(total)
    }

    /// One polling tick: read and, if present, process the next candidate.
    ///
    /// Returns whether a message was processed. `Ok(false)` is the normal
    /// idle case, not an error.
    pub async fn poll_once(&mut self) -> Result<bool> {
        let next = self
            .queue
            .read_next(
                &self.config.inbound_stream,
                &self.config.group,
                &self.config.consumer,
            )
            .await?;

        let Some(message) = next else {
            return Ok(false);
        };

        self.state = WorkerState::Processing;
        let result = self.process(&message).await;
        self.state = WorkerState::Polling;
        result.map(|_| true)
    }

    /// Processing phase for one candidate.
    ///
    /// Publishes every rearrangement, one at a time, and acknowledges the
    /// source message only after the expansion is exhausted. Any failure
    /// leaves the message un-acknowledged, which is the recovery record.
    pub async fn process(&mut self, message: &Message) -> Result<()> {
        let candidate = Candidate::try_from(message.payload.as_ref())?;
        debug!(
            id = %message.id,
            candidate = %candidate,
            mode = ?self.config.mode,
            "expanding candidate"
        );

        let every = self.config.progress_every;
        for rearrangement in expand(&candidate, self.config.mode) {
            let payload = rearrangement.clone().into_bytes();
            self.queue
                .publish(&self.config.outbound_stream, payload)
                .await?;
            self.progress.record_emitted(&rearrangement);
            if every > 0 && self.progress.emitted % every == 0 {
                self.reporter.report(&self.progress);
            }
        }

        self.queue
            .acknowledge(&self.config.inbound_stream, &self.config.group, message.id)
            .await?;
        self.progress.record_processed();
        self.reporter.report(&self.progress);
        debug!(id = %message.id, "candidate acknowledged");
        Ok(())
    }

    /// Run the worker until the shutdown signal flips.
    ///
    /// Startup failure is returned immediately. Everything after that is
    /// retried on the polling cadence: a failed reclaim repeats next tick
    /// (recovery always completes before the first fresh read), and a
    /// failed processing tick leaves its candidate pending and keeps
    /// polling.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        self.start().await?;

        let mut recovered = false;
        loop {
            if *shutdown.borrow() {
                break;
            }

            if !recovered {
                match self.recover().await {
                    Ok(_) => {
                        recovered = true;
                        continue;
                    }
                    Err(e) => {
                        warn!(error = %e, "recovery failed, retrying next tick");
                    }
                }
            } else {
                match self.poll_once().await {
                    // Drain available work before idling again.
                    Ok(true) => continue,
                    Ok(false) => {}
                    Err(e) => {
                        warn!(error = %e, "polling tick failed");
                    }
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
                _ = shutdown.changed() => {}
            }
        }

        self.state = WorkerState::Stopping;
        info!(
            processed = self.progress.processed,
            emitted = self.progress.emitted,
            "worker stopping"
        );
        self.state = WorkerState::Stopped;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    use permutor_queue::MemoryQueue;

    use super::*;
    use crate::error::WorkerError;

    /// Reporter that records every snapshot it sees.
    #[derive(Default)]
    struct CollectingReporter {
        snapshots: Mutex<Vec<Progress>>,
    }

    impl ProgressReporter for CollectingReporter {
        fn report(&self, progress: &Progress) {
            self.snapshots.lock().unwrap().push(progress.clone());
        }
    }

    fn test_config() -> WorkerConfig {
        WorkerConfig {
            poll_interval_ms: 5,
            progress_every: 2,
            ..WorkerConfig::default()
        }
    }

    async fn drain_outbound(queue: &MemoryQueue, stream: &str) -> Vec<Vec<u8>> {
        queue.ensure_group(stream, "verify").await.unwrap();
        let mut out = Vec::new();
        while let Some(message) = queue.read_next(stream, "verify", "v").await.unwrap() {
            out.push(message.payload.to_vec());
            queue.acknowledge(stream, "verify", message.id).await.unwrap();
        }
        out
    }

    #[tokio::test]
    async fn test_processes_candidate_end_to_end() {
        let queue = Arc::new(MemoryQueue::new());
        let config = test_config();
        let mut worker = Worker::new(Arc::clone(&queue), CollectingReporter::default(), config.clone());

        worker.start().await.unwrap();
        queue
            .publish(&config.inbound_stream, vec![1u8, 2, 3].into())
            .await
            .unwrap();

        assert_eq!(worker.recover().await.unwrap(), 0);
        assert!(worker.poll_once().await.unwrap());
        assert!(!worker.poll_once().await.unwrap());

        let outputs: BTreeSet<Vec<u8>> = drain_outbound(&queue, &config.outbound_stream)
            .await
            .into_iter()
            .collect();
        let expected: BTreeSet<Vec<u8>> = [
            vec![1, 2, 3],
            vec![1, 3, 2],
            vec![2, 1, 3],
            vec![2, 3, 1],
            vec![3, 1, 2],
            vec![3, 2, 1],
        ]
        .into_iter()
        .collect();
        assert_eq!(outputs, expected);

        assert_eq!(worker.progress().processed, 1);
        assert_eq!(worker.progress().emitted, 6);

        // Fully acknowledged: nothing to reclaim.
        let pending = queue
            .reclaim_pending(&config.inbound_stream, &config.group, "probe")
            .await
            .unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_recover_reprocesses_in_order() {
        let queue = Arc::new(MemoryQueue::new());
        let config = test_config();

        queue
            .ensure_group(&config.inbound_stream, &config.group)
            .await
            .unwrap();
        queue
            .publish(&config.inbound_stream, vec![1u8, 2].into())
            .await
            .unwrap();
        queue
            .publish(&config.inbound_stream, vec![3u8, 4].into())
            .await
            .unwrap();

        // A previous instance claims both, then crashes before acking.
        queue
            .read_next(&config.inbound_stream, &config.group, "w-dead")
            .await
            .unwrap()
            .unwrap();
        queue
            .read_next(&config.inbound_stream, &config.group, "w-dead")
            .await
            .unwrap()
            .unwrap();

        let mut worker = Worker::new(Arc::clone(&queue), CollectingReporter::default(), config.clone());
        worker.start().await.unwrap();
        assert_eq!(worker.recover().await.unwrap(), 2);
        assert_eq!(worker.state(), WorkerState::Polling);

        // [1,2] expands before [3,4]: original stream order.
        let outputs = drain_outbound(&queue, &config.outbound_stream).await;
        assert_eq!(outputs.len(), 4);
        assert!(outputs[..2].iter().all(|o| o == &[1, 2] || o == &[2, 1]));
        assert!(outputs[2..].iter().all(|o| o == &[3, 4] || o == &[4, 3]));
    }

    #[tokio::test]
    async fn test_oversized_candidate_stays_pending() {
        let queue = Arc::new(MemoryQueue::new());
        let config = test_config();
        let mut worker = Worker::new(Arc::clone(&queue), CollectingReporter::default(), config.clone());

        worker.start().await.unwrap();
        queue
            .publish(&config.inbound_stream, vec![0u8; 33].into())
            .await
            .unwrap();

        let err = worker.poll_once().await.unwrap_err();
        assert!(matches!(err, WorkerError::Candidate(_)));

        // Not acknowledged: still reclaimable.
        let pending = queue
            .reclaim_pending(&config.inbound_stream, &config.group, "probe")
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn test_progress_cadence() {
        let queue = Arc::new(MemoryQueue::new());
        let config = test_config(); // progress_every = 2
        let reporter = Arc::new(CollectingReporter::default());

        struct SharedReporter(Arc<CollectingReporter>);
        impl ProgressReporter for SharedReporter {
            fn report(&self, progress: &Progress) {
                self.0.report(progress);
            }
        }

        let mut worker = Worker::new(
            Arc::clone(&queue),
            SharedReporter(Arc::clone(&reporter)),
            config.clone(),
        );
        worker.start().await.unwrap();
        queue
            .publish(&config.inbound_stream, vec![1u8, 2, 3].into())
            .await
            .unwrap();
        worker.poll_once().await.unwrap();

        // 6 emissions at every-2 cadence plus the per-candidate report.
        let snapshots = reporter.snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 4);
        assert_eq!(snapshots.last().unwrap().processed, 1);
        assert_eq!(snapshots.last().unwrap().emitted, 6);
    }

    #[tokio::test]
    async fn test_run_honors_shutdown() {
        let queue = Arc::new(MemoryQueue::new());
        let config = test_config();
        let mut worker = Worker::new(Arc::clone(&queue), CollectingReporter::default(), config);

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            worker.run(rx).await.unwrap();
            worker
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        tx.send(true).unwrap();
        let worker = handle.await.unwrap();
        assert_eq!(worker.state(), WorkerState::Stopped);
    }

    #[tokio::test]
    async fn test_substitute_mode() {
        let queue = Arc::new(MemoryQueue::new());
        let config = WorkerConfig {
            mode: permutor_core::ExpandMode::Substitute,
            ..test_config()
        };
        let mut worker = Worker::new(Arc::clone(&queue), CollectingReporter::default(), config.clone());

        worker.start().await.unwrap();
        queue
            .publish(&config.inbound_stream, vec![1u8, 2].into())
            .await
            .unwrap();
        worker.poll_once().await.unwrap();

        let outputs = drain_outbound(&queue, &config.outbound_stream).await;
        assert_eq!(outputs, vec![vec![1, 1], vec![2, 2]]);
    }
}
