//! Search index subsystem for metacat
//!
//! The index is derived, in-memory state kept in step with the record
//! store through a coalescing job queue.
//!
//! # Design Principles
//!
//! - Derived state: the store is the source of truth, never the index
//! - Asynchronous by default: writers enqueue, drains apply
//! - Deterministic: BTreeMap postings, stable result ranking
//!
//! # Invariants
//!
//! - Index updates happen after store writes
//! - After `flush`, every earlier write is searchable
//! - A REMOVE is never overtaken by an earlier ADD or UPDATE

mod document;
mod errors;
mod postings;
mod query;
mod queue;
mod search;
mod synchronizer;
mod task;

pub use document::{
    tokenize, DocumentBuilder, ExpandingDocumentBuilder, IndexDocument, PlainDocumentBuilder,
    FIELD_ANY, FIELD_HARVESTED, FIELD_ID, FIELD_IS_TEMPLATE, FIELD_OWNER, FIELD_POPULARITY,
    FIELD_ROOT, FIELD_SOURCE, FIELD_UUID,
};
pub use errors::{IndexError, IndexResult};
pub use postings::Postings;
pub use query::Query;
pub use queue::{IndexJob, JobKind, PendingEntry, PendingQueue};
pub use search::{SearchHit, SearchIndex};
pub use synchronizer::{DrainReport, IndexSynchronizer};
pub use task::{IndexingTask, PeriodicIndexer};
