//! Reference graph
//!
//! Explicit directed-edge set derived from record content. Records
//! never hold pointers to each other; "who points at me" is a query
//! over the reverse map.
//!
//! # Invariants
//!
//! - `incoming[u]` contains `r` iff some edge of `outgoing[r]` targets `u`
//! - Edges reflect committed store state only

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use super::errors::{ReferenceError, ReferenceResult};
use super::extract::{extract_references, XLink};
use crate::record::{Record, RecordId};

/// A directed edge `from → to_uuid`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct CrossReference {
    pub from: RecordId,
    pub to_uuid: String,
    pub location: String,
}

#[derive(Debug, Default)]
struct GraphState {
    outgoing: BTreeMap<RecordId, BTreeSet<XLink>>,
    incoming: BTreeMap<String, BTreeSet<RecordId>>,
}

/// Forward and reverse reference maps
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    state: RwLock<GraphState>,
}

impl ReferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ReferenceResult<RwLockReadGuard<'_, GraphState>> {
        self.state
            .read()
            .map_err(|_| ReferenceError::Internal("reference graph lock poisoned".into()))
    }

    fn write(&self) -> ReferenceResult<RwLockWriteGuard<'_, GraphState>> {
        self.state
            .write()
            .map_err(|_| ReferenceError::Internal("reference graph lock poisoned".into()))
    }

    /// Replace every outgoing edge of `from`.
    pub fn set_references(&self, from: RecordId, links: BTreeSet<XLink>) -> ReferenceResult<()> {
        let mut state = self.write()?;
        detach(&mut state, from);
        if links.is_empty() {
            return Ok(());
        }
        for link in &links {
            state
                .incoming
                .entry(link.target_uuid.clone())
                .or_default()
                .insert(from);
        }
        state.outgoing.insert(from, links);
        Ok(())
    }

    /// Recompute the outgoing edges of a record from its content
    pub fn refresh(&self, record: &Record) -> ReferenceResult<()> {
        self.set_references(record.id, extract_references(&record.content))
    }

    /// Drop every outgoing edge of `from`
    pub fn remove_record(&self, from: RecordId) -> ReferenceResult<()> {
        let mut state = self.write()?;
        detach(&mut state, from);
        Ok(())
    }

    /// Rebuild the whole graph from a store snapshot
    pub fn rebuild<'a, I>(&self, records: I) -> ReferenceResult<()>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut fresh = GraphState::default();
        for record in records {
            let links = extract_references(&record.content);
            if links.is_empty() {
                continue;
            }
            for link in &links {
                fresh
                    .incoming
                    .entry(link.target_uuid.clone())
                    .or_default()
                    .insert(record.id);
            }
            fresh.outgoing.insert(record.id, links);
        }
        *self.write()? = fresh;
        Ok(())
    }

    /// Records whose content references `target_uuid`
    pub fn reverse_references(&self, target_uuid: &str) -> ReferenceResult<BTreeSet<RecordId>> {
        Ok(self
            .read()?
            .incoming
            .get(target_uuid)
            .cloned()
            .unwrap_or_default())
    }

    /// Outgoing edges of a record, ordered by target then location
    pub fn outgoing(&self, from: RecordId) -> ReferenceResult<Vec<CrossReference>> {
        let state = self.read()?;
        Ok(state
            .outgoing
            .get(&from)
            .map(|links| {
                links
                    .iter()
                    .map(|l| CrossReference {
                        from,
                        to_uuid: l.target_uuid.clone(),
                        location: l.location.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Total number of edges
    pub fn edge_count(&self) -> ReferenceResult<usize> {
        Ok(self.read()?.outgoing.values().map(BTreeSet::len).sum())
    }

    /// Leave the state lock poisoned, as a panicking writer would
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _state = self.state.write();
            panic!("writer panicked while holding the graph");
        }));
    }
}

fn detach(state: &mut GraphState, from: RecordId) {
    let Some(old) = state.outgoing.remove(&from) else {
        return;
    };
    for link in old {
        if let Some(sources) = state.incoming.get_mut(&link.target_uuid) {
            sources.remove(&from);
            if sources.is_empty() {
                state.incoming.remove(&link.target_uuid);
            }
        }
    }
}
