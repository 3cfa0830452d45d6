//! Reference resolution
//!
//! Local targets are read from the record store. Targets the store does
//! not hold are asked of a pluggable `ResolutionPort`.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use super::errors::{ReferenceError, ReferenceResult};
use super::extract::{expand, extract_references, Expansion, XLink};
use super::graph::ReferenceGraph;
use crate::observability::{log_event_with_fields, Event};
use crate::record::{RecordId, RecordStore};

/// Fetches content for targets not held locally
pub trait ResolutionPort: Send + Sync {
    fn fetch(&self, uuid: &str) -> Result<Value, String>;
}

/// Port used when nothing outside the store can be reached
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRemoteResolution;

impl ResolutionPort for NoRemoteResolution {
    fn fetch(&self, _uuid: &str) -> Result<Value, String> {
        Err("target is not a local record".to_string())
    }
}

/// Extraction, resolution and reverse lookup of cross-references
pub struct ReferenceResolver {
    store: Arc<RecordStore>,
    graph: ReferenceGraph,
    port: Box<dyn ResolutionPort>,
}

impl ReferenceResolver {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self::with_port(store, Box::new(NoRemoteResolution))
    }

    pub fn with_port(store: Arc<RecordStore>, port: Box<dyn ResolutionPort>) -> Self {
        Self {
            store,
            graph: ReferenceGraph::new(),
            port,
        }
    }

    /// The derived edge set
    pub fn graph(&self) -> &ReferenceGraph {
        &self.graph
    }

    /// Cross-references in a content tree
    pub fn extract_references(&self, content: &Value) -> BTreeSet<XLink> {
        extract_references(content)
    }

    /// Content of the record `target_uuid` names
    pub fn resolve(&self, target_uuid: &str) -> ReferenceResult<Value> {
        let local = self
            .store
            .get_by_uuid(target_uuid)
            .map_err(|e| ReferenceError::unresolved(target_uuid, e.message()))?;
        if let Some(record) = local {
            return Ok(record.content);
        }

        self.port
            .fetch(target_uuid)
            .map_err(|reason| ReferenceError::unresolved(target_uuid, reason))
    }

    /// Copy of `content` with every resolvable target substituted inline.
    ///
    /// Unresolved targets are logged and left as bare markers.
    pub fn expand(&self, content: &Value) -> Expansion {
        let expansion = expand(content, |uuid| self.resolve(uuid));
        for err in &expansion.unresolved {
            if let ReferenceError::Unresolved { uuid, reason } = err {
                log_event_with_fields(
                    Event::ReferenceUnresolved,
                    &[("target_uuid", uuid), ("reason", reason)],
                );
            }
        }
        expansion
    }

    /// Records currently referencing `target_uuid`
    pub fn reverse_references(&self, target_uuid: &str) -> ReferenceResult<BTreeSet<RecordId>> {
        self.graph.reverse_references(target_uuid)
    }

    /// Number of records currently referencing `target_uuid`
    pub fn reverse_count(&self, target_uuid: &str) -> ReferenceResult<usize> {
        Ok(self.graph.reverse_references(target_uuid)?.len())
    }

    /// Rebuild the graph from the full store
    pub fn rebuild(&self) -> ReferenceResult<()> {
        let records = self
            .store
            .snapshot()
            .map_err(|e| ReferenceError::Internal(e.message().to_string()))?;
        self.graph.rebuild(&records)
    }
}
