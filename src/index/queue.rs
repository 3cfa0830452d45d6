//! Pending index work
//!
//! Keyed by record id, in first-enqueue order across ids. A new job for
//! an id already pending is merged into the existing entry:
//!
//! | pending \ new | ADD          | UPDATE       | REMOVE |
//! |---------------|--------------|--------------|--------|
//! | ADD           | ADD (new)    | ADD (new)    | REMOVE |
//! | UPDATE        | UPDATE (new) | UPDATE (new) | REMOVE |
//! | REMOVE        | REMOVE       | REMOVE       | REMOVE |

use std::fmt;

use indexmap::IndexMap;

use crate::record::{Record, RecordId};

/// Kind of index work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Add,
    Update,
    Remove,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Add => write!(f, "ADD"),
            JobKind::Update => write!(f, "UPDATE"),
            JobKind::Remove => write!(f, "REMOVE"),
        }
    }
}

/// One unit of index work
#[derive(Debug, Clone, PartialEq)]
pub enum IndexJob {
    /// Index a new record
    Add(Record),
    /// Reindex a changed record
    Update(Record),
    /// Drop a deleted record from the index
    Remove { id: RecordId, uuid: String },
}

impl IndexJob {
    pub fn remove(record: &Record) -> Self {
        IndexJob::Remove {
            id: record.id,
            uuid: record.uuid.clone(),
        }
    }

    pub fn id(&self) -> RecordId {
        match self {
            IndexJob::Add(r) | IndexJob::Update(r) => r.id,
            IndexJob::Remove { id, .. } => *id,
        }
    }

    pub fn uuid(&self) -> &str {
        match self {
            IndexJob::Add(r) | IndexJob::Update(r) => &r.uuid,
            IndexJob::Remove { uuid, .. } => uuid,
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            IndexJob::Add(_) => JobKind::Add,
            IndexJob::Update(_) => JobKind::Update,
            IndexJob::Remove { .. } => JobKind::Remove,
        }
    }

    /// Job standing for a pending job of kind `pending` followed by `self`
    fn merged_after(self, pending: JobKind) -> Option<IndexJob> {
        match (pending, self) {
            (JobKind::Remove, _) => None,
            (_, remove @ IndexJob::Remove { .. }) => Some(remove),
            (JobKind::Add, IndexJob::Add(r) | IndexJob::Update(r)) => Some(IndexJob::Add(r)),
            (JobKind::Update, IndexJob::Add(r) | IndexJob::Update(r)) => Some(IndexJob::Update(r)),
        }
    }
}

/// A queued job with its bookkeeping
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub job: IndexJob,
    /// Sequence number of the latest enqueue merged into this entry
    pub seq: u64,
    /// Sequence number of the oldest enqueue this entry still stands for
    pub first_seq: u64,
    /// Failed attempts so far
    pub attempts: u32,
}

/// Coalescing FIFO of index jobs
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: IndexMap<RecordId, PendingEntry>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `job`; returns true when it was merged into a pending entry.
    ///
    /// A merged entry keeps its place in line.
    pub fn push(&mut self, job: IndexJob, seq: u64) -> bool {
        let id = job.id();
        match self.entries.get_mut(&id) {
            Some(entry) => {
                if let Some(merged) = job.merged_after(entry.job.kind()) {
                    entry.job = merged;
                }
                entry.seq = seq;
                entry.attempts = 0;
                true
            }
            None => {
                self.entries.insert(
                    id,
                    PendingEntry {
                        job,
                        seq,
                        first_seq: seq,
                        attempts: 0,
                    },
                );
                false
            }
        }
    }

    /// Put back a failed entry unless a newer job for its id arrived.
    ///
    /// A newer job keeps its content but takes over the failed entry's
    /// `first_seq`, since applying it also covers the failed write.
    pub fn requeue(&mut self, entry: PendingEntry) -> bool {
        let id = entry.job.id();
        if let Some(newer) = self.entries.get_mut(&id) {
            newer.first_seq = newer.first_seq.min(entry.first_seq);
            return false;
        }
        self.entries.insert(id, entry);
        true
    }

    /// Remove and return every entry in queue order
    pub fn take_all(&mut self) -> Vec<PendingEntry> {
        std::mem::take(&mut self.entries).into_values().collect()
    }

    pub fn get(&self, id: RecordId) -> Option<&PendingEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
