//! Indexing task
//!
//! `IndexingTask` is one schedulable drain. It can be run inline, from
//! any thread, or periodically by a `PeriodicIndexer` on the tokio
//! runtime.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::errors::IndexResult;
use super::synchronizer::{DrainReport, IndexSynchronizer};
use crate::observability::{log_event, log_event_with_fields, Event};

/// A single sweep of the pending index queue
#[derive(Clone)]
pub struct IndexingTask {
    synchronizer: Arc<IndexSynchronizer>,
}

impl IndexingTask {
    pub fn new(synchronizer: Arc<IndexSynchronizer>) -> Self {
        Self { synchronizer }
    }

    /// Drain the queue once. Safe to call concurrently; runs serialize.
    pub fn run(&self) -> IndexResult<DrainReport> {
        self.synchronizer.drain()
    }
}

/// Runs an `IndexingTask` on a fixed interval until shut down
pub struct PeriodicIndexer {
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl PeriodicIndexer {
    /// Start the loop on the current tokio runtime.
    pub fn spawn(task: IndexingTask, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let interval_ms = interval.as_millis().to_string();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            log_event_with_fields(Event::IndexerStarted, &[("interval_ms", &interval_ms)]);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let task = task.clone();
                        match tokio::task::spawn_blocking(move || task.run()).await {
                            Ok(Ok(_)) => {}
                            Ok(Err(e)) => log_event_with_fields(
                                Event::IndexSweepFailed,
                                &[("code", e.code()), ("error", &e.to_string())],
                            ),
                            Err(e) => log_event_with_fields(
                                Event::IndexSweepFailed,
                                &[("error", &e.to_string())],
                            ),
                        }
                    }
                    _ = &mut shutdown_rx => break,
                }
            }

            log_event(Event::IndexerStopped);
        });

        Self {
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    /// Stop the loop and wait for an in-flight sweep to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.handle).await;
    }
}
