//! Local cross-references (XLinks)
//!
//! Records point at other records by uuid. This module finds those
//! pointers, resolves them, and answers "who references this record".
//!
//! # Design Principles
//!
//! - Edges are derived from content, never stored on their own
//! - Reverse lookups are queries over the edge set
//! - A missing target never invalidates the referencing record

mod errors;
mod extract;
mod graph;
mod resolver;

pub use errors::{ReferenceError, ReferenceResult};
pub use extract::{expand, extract_references, target_of, Expansion, XLink, HREF_KEYS};
pub use graph::{CrossReference, ReferenceGraph};
pub use resolver::{NoRemoteResolution, ReferenceResolver, ResolutionPort};

/// Build a local href pointing at `uuid`
pub fn local_href(uuid: &str) -> String {
    format!("local://xml.metadata.get?uuid={}", uuid)
}
