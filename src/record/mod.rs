//! Record store subsystem
//!
//! # Design Principles
//!
//! - The store is the single source of truth
//! - Mutations of one record are linearized through `RecordStore::lock`
//! - Invalid content is rejected before anything is written

mod content;
mod errors;
mod lock;
mod store;
mod types;

pub use content::{parse_content, root_name};
pub use errors::{RecordError, RecordErrorCode, RecordResult, Severity};
pub use lock::{LockTable, RecordLock};
pub use store::RecordStore;
pub use types::{Record, RecordHandle, RecordId, RecordMetadata, RecordType};
