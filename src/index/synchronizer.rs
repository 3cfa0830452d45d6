//! Index synchronizer
//!
//! Keeps the search index in step with the record store. Writers
//! enqueue jobs and return at once; drains apply them later, and
//! `flush` is the barrier for callers that must see their writes.
//!
//! # Invariants
//!
//! - Only one drain runs at a time
//! - A drain works on a snapshot of the queue taken atomically
//! - Jobs of one drain become visible to searches together
//! - `applied_seq` never passes a job that is still pending
//! - Index failures never touch the record store

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;

use super::document::{DocumentBuilder, IndexDocument};
use super::errors::{IndexError, IndexResult};
use super::query::Query;
use super::queue::{IndexJob, PendingEntry, PendingQueue};
use super::search::{SearchHit, SearchIndex};
use crate::config::Settings;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};

/// What one drain did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub written: usize,
    pub removed: usize,
    /// Failed jobs put back for the next drain
    pub retried: usize,
    /// Failed jobs given up on
    pub dropped: usize,
}

impl DrainReport {
    pub fn processed(&self) -> usize {
        self.written + self.removed + self.retried + self.dropped
    }
}

#[derive(Debug, Default)]
struct SyncState {
    pending: PendingQueue,
    /// Sequence number of the latest enqueue
    enqueued: u64,
    /// Every enqueue up to this sequence number has been applied
    applied: u64,
    draining: bool,
}

enum IndexOp {
    Write(IndexDocument),
    Delete(String),
}

/// Pending queue, drain and flush barrier over one search index
pub struct IndexSynchronizer {
    state: Mutex<SyncState>,
    progress: Condvar,
    index: RwLock<SearchIndex>,
    builder: Box<dyn DocumentBuilder>,
    settings: Arc<Settings>,
    metrics: Arc<MetricsRegistry>,
}

impl IndexSynchronizer {
    pub fn new(
        builder: Box<dyn DocumentBuilder>,
        settings: Arc<Settings>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            state: Mutex::new(SyncState::default()),
            progress: Condvar::new(),
            index: RwLock::new(SearchIndex::new()),
            builder,
            settings,
            metrics,
        }
    }

    fn lock_state(&self) -> IndexResult<MutexGuard<'_, SyncState>> {
        self.state.lock().map_err(|_| IndexError::poisoned("index queue"))
    }

    /// Queue a job; returns its sequence number.
    pub fn enqueue(&self, job: IndexJob) -> IndexResult<u64> {
        let mut state = self.lock_state()?;
        state.enqueued += 1;
        let seq = state.enqueued;
        state.pending.push(job, seq);
        Ok(seq)
    }

    /// Apply every pending job.
    ///
    /// Waits for a drain already in progress, then runs one.
    pub fn drain(&self) -> IndexResult<DrainReport> {
        let mut state = self.lock_state()?;
        while state.draining {
            state = self
                .progress
                .wait(state)
                .map_err(|_| IndexError::poisoned("index queue"))?;
        }
        state.draining = true;
        drop(state);
        self.drain_claimed()
    }

    /// Block until every job enqueued before this call is applied.
    pub fn flush(&self, timeout: Duration) -> IndexResult<()> {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut state = self.lock_state()?;
        let target = state.enqueued;

        loop {
            if state.applied >= target {
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                let pending = state.pending.len();
                drop(state);
                self.metrics.increment_flush_timeouts();
                let waited_ms = started.elapsed().as_millis() as u64;
                log_event_with_fields(
                    Event::IndexFlushTimeout,
                    &[("pending", &pending.to_string()), ("waited_ms", &waited_ms.to_string())],
                );
                return Err(IndexError::SyncTimeout { waited_ms, pending });
            }

            if state.draining {
                let (guard, _) = self
                    .progress
                    .wait_timeout(state, deadline - now)
                    .map_err(|_| IndexError::poisoned("index queue"))?;
                state = guard;
            } else {
                state.draining = true;
                drop(state);
                self.drain_claimed()?;
                state = self.lock_state()?;
            }
        }
    }

    /// Run one drain; the caller has set `draining`.
    fn drain_claimed(&self) -> IndexResult<DrainReport> {
        let mut claim = DrainClaim {
            sync: self,
            watermark: None,
        };

        let (batch, snapshot_seq) = {
            let mut state = self.lock_state()?;
            (state.pending.take_all(), state.enqueued)
        };

        let mut report = DrainReport::default();
        if batch.is_empty() {
            claim.watermark = Some(snapshot_seq);
            return Ok(report);
        }

        self.metrics.increment_drains();
        log_event_with_fields(Event::IndexDrainBegin, &[("jobs", &batch.len().to_string())]);

        let mut ops = Vec::with_capacity(batch.len());
        let mut failed: Vec<(PendingEntry, IndexError)> = Vec::new();
        for entry in batch {
            let built = match &entry.job {
                IndexJob::Remove { uuid, .. } => Ok(IndexOp::Delete(uuid.clone())),
                IndexJob::Add(record) | IndexJob::Update(record) => {
                    self.builder.build(record).map(IndexOp::Write)
                }
            };
            match built {
                Ok(op) => ops.push(op),
                Err(err) => failed.push((entry, err)),
            }
        }

        {
            let mut index = self
                .index
                .write()
                .map_err(|_| IndexError::poisoned("search index"))?;
            for op in ops {
                match op {
                    IndexOp::Write(doc) => {
                        index.apply_write(doc);
                        report.written += 1;
                        self.metrics.increment_index_writes();
                    }
                    IndexOp::Delete(uuid) => {
                        index.apply_delete(&uuid);
                        report.removed += 1;
                        self.metrics.increment_index_removals();
                    }
                }
            }
        }

        let mut watermark = snapshot_seq;
        if !failed.is_empty() {
            let max_retries = self.settings.max_index_retries();
            let mut state = self.lock_state()?;
            for (mut entry, err) in failed {
                entry.attempts += 1;
                let uuid = entry.job.uuid().to_string();
                let attempts = entry.attempts.to_string();

                if entry.attempts > max_retries {
                    report.dropped += 1;
                    log_event_with_fields(
                        Event::IndexJobDropped,
                        &[("attempts", &attempts), ("reason", &err.to_string()), ("uuid", &uuid)],
                    );
                    continue;
                }

                // Requeued or superseded, the write is still unapplied.
                watermark = watermark.min(entry.first_seq.saturating_sub(1));
                if state.pending.requeue(entry) {
                    report.retried += 1;
                    self.metrics.increment_index_retries();
                    log_event_with_fields(
                        Event::IndexJobRetry,
                        &[("attempts", &attempts), ("reason", &err.to_string()), ("uuid", &uuid)],
                    );
                }
            }
        }
        claim.watermark = Some(watermark);

        log_event_with_fields(
            Event::IndexDrainComplete,
            &[
                ("dropped", &report.dropped.to_string()),
                ("removed", &report.removed.to_string()),
                ("retried", &report.retried.to_string()),
                ("written", &report.written.to_string()),
            ],
        );
        Ok(report)
    }

    /// Ranked documents matching `query`
    pub fn search(&self, query: &Query) -> IndexResult<Vec<SearchHit>> {
        let index = self
            .index
            .read()
            .map_err(|_| IndexError::poisoned("search index"))?;
        Ok(index.search(query))
    }

    /// Indexed document for `uuid`
    pub fn document(&self, uuid: &str) -> IndexResult<Option<IndexDocument>> {
        let index = self
            .index
            .read()
            .map_err(|_| IndexError::poisoned("search index"))?;
        Ok(index.get(uuid).cloned())
    }

    /// Number of indexed documents
    pub fn indexed_len(&self) -> IndexResult<usize> {
        let index = self
            .index
            .read()
            .map_err(|_| IndexError::poisoned("search index"))?;
        Ok(index.len())
    }

    pub fn pending_len(&self) -> IndexResult<usize> {
        Ok(self.lock_state()?.pending.len())
    }

    pub fn enqueued_seq(&self) -> IndexResult<u64> {
        Ok(self.lock_state()?.enqueued)
    }

    pub fn applied_seq(&self) -> IndexResult<u64> {
        Ok(self.lock_state()?.applied)
    }
}

/// Releases the drain slot, publishing the new watermark if any.
struct DrainClaim<'a> {
    sync: &'a IndexSynchronizer,
    watermark: Option<u64>,
}

impl Drop for DrainClaim<'_> {
    fn drop(&mut self) {
        let mut state = self
            .sync
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(watermark) = self.watermark {
            state.applied = state.applied.max(watermark);
        }
        state.draining = false;
        self.sync.progress.notify_all();
    }
}
