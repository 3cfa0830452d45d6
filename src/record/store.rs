//! Authoritative record store
//!
//! The store is the source of truth for content, ownership and type.
//! Every other structure in the catalog is derived from it.
//!
//! # Invariants
//!
//! - A uuid is unique across live records and never changes
//! - Record ids are never reused
//! - A mutation is visible to `get` as soon as the call returns

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::content::root_name;
use super::errors::{RecordError, RecordResult};
use super::lock::{LockTable, RecordLock};
use super::types::{Record, RecordId, RecordMetadata};

#[derive(Debug, Default)]
struct StoreState {
    records: BTreeMap<RecordId, Record>,
    by_uuid: HashMap<String, RecordId>,
}

/// In-memory record store
#[derive(Debug)]
pub struct RecordStore {
    state: RwLock<StoreState>,
    next_id: AtomicU64,
    locks: LockTable,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            next_id: AtomicU64::new(1),
            locks: LockTable::new(),
        }
    }

    /// Serialize mutations of `id` for as long as the guard lives
    pub fn lock(&self, id: RecordId) -> RecordLock<'_> {
        self.locks.lock(id)
    }

    fn read(&self) -> RecordResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| RecordError::internal("record store lock poisoned"))
    }

    fn write(&self) -> RecordResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| RecordError::internal("record store lock poisoned"))
    }

    /// Insert a new record.
    ///
    /// Fails with a validation error, leaving the store untouched, if
    /// the content is not a record tree or the uuid is empty or taken.
    pub fn insert(&self, content: Value, metadata: RecordMetadata) -> RecordResult<Record> {
        let root = root_name(&content)?;

        let uuid = match metadata.uuid {
            Some(uuid) if uuid.trim().is_empty() => {
                return Err(RecordError::validation("uuid must not be empty"))
            }
            Some(uuid) => uuid,
            None => Uuid::new_v4().to_string(),
        };

        let mut state = self.write()?;
        if state.by_uuid.contains_key(&uuid) {
            return Err(RecordError::validation(format!("uuid '{}' is already in use", uuid)));
        }

        let id = RecordId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let now = Utc::now();
        let record = Record {
            id,
            uuid: uuid.clone(),
            record_type: metadata.record_type,
            owner: metadata.owner,
            source_id: metadata.source_id,
            root,
            content,
            popularity: metadata.popularity,
            harvested: metadata.harvested,
            created_at: now,
            changed_at: now,
        };

        state.by_uuid.insert(uuid, id);
        state.records.insert(id, record.clone());
        Ok(record)
    }

    /// Replace the content of an existing record.
    ///
    /// Identity, ownership and type are preserved; `root` follows the
    /// new content.
    pub fn update(&self, id: RecordId, content: Value) -> RecordResult<Record> {
        let root = root_name(&content)?;

        let mut state = self.write()?;
        let record = state
            .records
            .get_mut(&id)
            .ok_or_else(|| RecordError::not_found(id))?;

        record.root = root;
        record.content = content;
        record.changed_at = Utc::now();
        Ok(record.clone())
    }

    /// Remove a record, returning its last state
    pub fn delete(&self, id: RecordId) -> RecordResult<Record> {
        let mut state = self.write()?;
        let record = state
            .records
            .remove(&id)
            .ok_or_else(|| RecordError::not_found(id))?;
        state.by_uuid.remove(&record.uuid);
        Ok(record)
    }

    pub fn get(&self, id: RecordId) -> RecordResult<Option<Record>> {
        Ok(self.read()?.records.get(&id).cloned())
    }

    pub fn get_by_uuid(&self, uuid: &str) -> RecordResult<Option<Record>> {
        let state = self.read()?;
        Ok(state
            .by_uuid
            .get(uuid)
            .and_then(|id| state.records.get(id))
            .cloned())
    }

    pub fn id_of(&self, uuid: &str) -> RecordResult<Option<RecordId>> {
        Ok(self.read()?.by_uuid.get(uuid).copied())
    }

    pub fn len(&self) -> RecordResult<usize> {
        Ok(self.read()?.records.len())
    }

    pub fn is_empty(&self) -> RecordResult<bool> {
        Ok(self.len()? == 0)
    }

    /// All live ids in ascending order
    pub fn ids(&self) -> RecordResult<Vec<RecordId>> {
        Ok(self.read()?.records.keys().copied().collect())
    }

    /// Every live record in id order
    pub fn snapshot(&self) -> RecordResult<Vec<Record>> {
        Ok(self.read()?.records.values().cloned().collect())
    }
}
