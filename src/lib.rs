//! metacat - A metadata catalog core with cross-reference integrity
//!
//! Records may embed local cross-references (XLinks) to other records.
//! The catalog keeps a search index in sync with the record store and
//! refuses deletes that would leave dangling references.

pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod guard;
pub mod index;
pub mod notify;
pub mod observability;
pub mod record;
pub mod xlink;

pub use catalog::{Catalog, UpdateOptions};
pub use error::{CatalogError, CatalogResult};
