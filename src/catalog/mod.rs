//! Catalog
//!
//! Wires the record store, reference resolver, deletion guard, index
//! synchronizer and removal notifications into one operation surface.
//!
//! # Invariants
//!
//! - Mutations of one record id are serialized
//! - The reference graph and index queue are updated only after the
//!   store mutation is visible to `get`
//! - A refused or invalid write changes nothing
//! - Index and listener failures never undo a store mutation

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{CatalogConfig, Settings};
use crate::error::{CatalogError, CatalogResult};
use crate::guard::{DeletionGuard, DeletionVerdict};
use crate::index::{
    ExpandingDocumentBuilder, IndexJob, IndexSynchronizer, IndexingTask, Query, SearchHit,
};
use crate::notify::{NotificationPort, RecordRemoved};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::record::{parse_content, Record, RecordHandle, RecordId, RecordMetadata, RecordStore};
use crate::xlink::{NoRemoteResolution, ReferenceResolver, ResolutionPort};

/// Index handling for an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOptions {
    /// Reindex the updated record itself
    #[serde(default = "default_true")]
    pub reindex: bool,
    /// Reindex the records referencing it (xlink resolver only)
    #[serde(default = "default_true")]
    pub refresh_references: bool,
}

fn default_true() -> bool {
    true
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            reindex: true,
            refresh_references: true,
        }
    }
}

/// The metadata catalog
pub struct Catalog {
    store: Arc<RecordStore>,
    resolver: Arc<ReferenceResolver>,
    guard: DeletionGuard,
    synchronizer: Arc<IndexSynchronizer>,
    notifications: NotificationPort,
    settings: Arc<Settings>,
    metrics: Arc<MetricsRegistry>,
}

impl Catalog {
    pub fn new(config: &CatalogConfig) -> Self {
        Self::with_port(config, Box::new(NoRemoteResolution))
    }

    /// Catalog resolving non-local references through `port`
    pub fn with_port(config: &CatalogConfig, port: Box<dyn ResolutionPort>) -> Self {
        let store = Arc::new(RecordStore::new());
        let settings = Arc::new(Settings::from_config(config));
        let metrics = Arc::new(MetricsRegistry::new());
        let resolver = Arc::new(ReferenceResolver::with_port(Arc::clone(&store), port));

        let builder = ExpandingDocumentBuilder::new(
            Arc::clone(&resolver),
            Arc::clone(&settings),
            Arc::clone(&metrics),
        );
        let synchronizer = Arc::new(IndexSynchronizer::new(
            Box::new(builder),
            Arc::clone(&settings),
            Arc::clone(&metrics),
        ));

        Self {
            guard: DeletionGuard::new(Arc::clone(&resolver), Arc::clone(&settings)),
            store,
            resolver,
            synchronizer,
            notifications: NotificationPort::new(),
            settings,
            metrics,
        }
    }

    /// Store a new record and queue it for indexing.
    pub fn insert(&self, content: Value, metadata: RecordMetadata) -> CatalogResult<RecordHandle> {
        let inserted = self.store.insert(content, metadata).map_err(|e| {
            log_event_with_fields(Event::RecordRejected, &[("reason", e.message())]);
            CatalogError::from(e)
        })?;

        let _lock = self.store.lock(inserted.id);
        // Re-read under the lock: a concurrent update may already have landed.
        let Some(record) = self.store.get(inserted.id)? else {
            return Ok(inserted.handle());
        };

        self.resolver.graph().refresh(&record)?;
        let handle = record.handle();
        let record_type = record.record_type;
        self.synchronizer.enqueue(IndexJob::Add(record))?;

        self.metrics.increment_inserts();
        log_event_with_fields(
            Event::RecordInserted,
            &[
                ("id", &handle.id.to_string()),
                ("type", record_type.as_str()),
                ("uuid", &handle.uuid),
            ],
        );
        Ok(handle)
    }

    /// Parse `text` as record content, then insert it
    pub fn insert_raw(&self, text: &str, metadata: RecordMetadata) -> CatalogResult<RecordHandle> {
        let content = parse_content(text).map_err(|e| {
            log_event_with_fields(Event::RecordRejected, &[("reason", e.message())]);
            CatalogError::from(e)
        })?;
        self.insert(content, metadata)
    }

    /// Replace a record's content.
    pub fn update(
        &self,
        id: RecordId,
        content: Value,
        options: UpdateOptions,
    ) -> CatalogResult<RecordHandle> {
        let record = {
            let _lock = self.store.lock(id);
            let record = self.store.update(id, content)?;
            self.resolver.graph().refresh(&record)?;
            if options.reindex {
                self.synchronizer.enqueue(IndexJob::Update(record.clone()))?;
            }
            record
        };

        self.metrics.increment_updates();
        log_event_with_fields(
            Event::RecordUpdated,
            &[
                ("id", &record.id.to_string()),
                ("reindex", &options.reindex.to_string()),
                ("uuid", &record.uuid),
            ],
        );

        if options.refresh_references && self.settings.xlink_resolver_enabled() {
            self.refresh_referrers(&record.uuid, record.id);
        }
        Ok(record.handle())
    }

    /// Delete a record if no other record references it, or if policy
    /// allows deleting referenced records.
    pub fn delete(&self, id: RecordId) -> CatalogResult<Record> {
        let removed = {
            let _lock = self.store.lock(id);
            let record = self.store.get(id)?.ok_or(CatalogError::NotFound(id))?;

            if let DeletionVerdict::Forbidden { referencing_count } =
                self.guard.can_delete(&record.uuid, Some(id))?
            {
                self.metrics.increment_deletes_forbidden();
                log_event_with_fields(
                    Event::DeletionForbidden,
                    &[
                        ("id", &id.to_string()),
                        ("referencing_count", &referencing_count.to_string()),
                        ("uuid", &record.uuid),
                    ],
                );
                return Err(CatalogError::DeletionForbidden {
                    uuid: record.uuid,
                    referencing_count,
                });
            }

            let removed = self.store.delete(id)?;
            self.resolver.graph().remove_record(id)?;
            self.synchronizer.enqueue(IndexJob::remove(&removed))?;
            removed
        };

        self.metrics.increment_deletes();
        log_event_with_fields(
            Event::RecordDeleted,
            &[
                ("id", &removed.id.to_string()),
                ("type", removed.record_type.as_str()),
                ("uuid", &removed.uuid),
            ],
        );

        // Referrers now index a dangling reference.
        if self.settings.xlink_resolver_enabled() {
            self.refresh_referrers(&removed.uuid, removed.id);
        }

        self.notifications
            .publish(&RecordRemoved::from(&removed), &self.metrics);
        Ok(removed)
    }

    /// Would deleting `id` be allowed right now?
    pub fn can_delete(&self, id: RecordId) -> CatalogResult<DeletionVerdict> {
        let record = self.store.get(id)?.ok_or(CatalogError::NotFound(id))?;
        Ok(self.guard.can_delete(&record.uuid, Some(id))?)
    }

    /// Reindex referrers of a committed write.
    ///
    /// The write already happened, so a failure is logged and counted,
    /// never returned.
    fn refresh_referrers(&self, uuid: &str, except: RecordId) {
        if let Err(e) = self.reindex_referrers(uuid, except) {
            self.metrics.increment_referrer_reindex_failures();
            log_event_with_fields(
                Event::ReferrerReindexFailed,
                &[("code", e.code()), ("error", &e.to_string()), ("uuid", uuid)],
            );
        }
    }

    /// Queue an UPDATE for every record referencing `uuid`
    fn reindex_referrers(&self, uuid: &str, except: RecordId) -> CatalogResult<usize> {
        let mut queued = 0;
        for referrer in self.resolver.reverse_references(uuid)? {
            if referrer == except {
                continue;
            }
            let _lock = self.store.lock(referrer);
            if let Some(record) = self.store.get(referrer)? {
                self.synchronizer.enqueue(IndexJob::Update(record))?;
                queued += 1;
            }
        }
        Ok(queued)
    }

    pub fn get(&self, id: RecordId) -> CatalogResult<Option<Record>> {
        Ok(self.store.get(id)?)
    }

    pub fn get_by_uuid(&self, uuid: &str) -> CatalogResult<Option<Record>> {
        Ok(self.store.get_by_uuid(uuid)?)
    }

    /// Block until every write made so far is searchable, or the
    /// configured flush timeout elapses.
    pub fn flush_index(&self) -> CatalogResult<()> {
        Ok(self.synchronizer.flush(self.settings.flush_timeout())?)
    }

    /// Ranked search over the index as of the last drain
    pub fn search(&self, query: &Query) -> CatalogResult<Vec<SearchHit>> {
        Ok(self.synchronizer.search(query)?)
    }

    /// A drain of this catalog's index queue, for scheduling
    pub fn indexing_task(&self) -> IndexingTask {
        IndexingTask::new(Arc::clone(&self.synchronizer))
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn notifications(&self) -> &NotificationPort {
        &self.notifications
    }

    pub fn resolver(&self) -> &Arc<ReferenceResolver> {
        &self.resolver
    }

    pub fn synchronizer(&self) -> &Arc<IndexSynchronizer> {
        &self.synchronizer
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::FIELD_ANY;
    use crate::record::RecordType;
    use crate::xlink::local_href;
    use serde_json::json;

    fn catalog() -> Catalog {
        Catalog::new(&CatalogConfig::default())
    }

    fn meta(record_type: RecordType) -> RecordMetadata {
        RecordMetadata::new(record_type, 1, "local")
    }

    #[test]
    fn test_insert_is_searchable_after_flush() {
        let catalog = catalog();
        let handle = catalog
            .insert(json!({"MD_Metadata": {"title": "Rivers"}}), meta(RecordType::Document))
            .unwrap();

        assert!(catalog.search(&Query::any("rivers")).unwrap().is_empty());
        catalog.flush_index().unwrap();

        let hits = catalog.search(&Query::any("rivers")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].uuid, handle.uuid);
        assert_eq!(catalog.metrics().snapshot().inserts, 1);
    }

    #[test]
    fn test_insert_raw_rejects_garbage() {
        let catalog = catalog();
        let err = catalog.insert_raw("<xml/>", meta(RecordType::Document)).unwrap_err();
        assert_eq!(err.code(), "METACAT_VALIDATION_FAILED");
        assert!(catalog.store().is_empty().unwrap());
    }

    #[test]
    fn test_update_without_reindex_leaves_index_stale() {
        let catalog = catalog();
        let handle = catalog
            .insert(json!({"MD_Metadata": {"title": "old"}}), meta(RecordType::Document))
            .unwrap();
        catalog.flush_index().unwrap();

        let options = UpdateOptions {
            reindex: false,
            refresh_references: false,
        };
        catalog
            .update(handle.id, json!({"MD_Metadata": {"title": "new"}}), options)
            .unwrap();
        catalog.flush_index().unwrap();

        assert_eq!(catalog.search(&Query::any("old")).unwrap().len(), 1);
        assert!(catalog.search(&Query::any("new")).unwrap().is_empty());
    }

    #[test]
    fn test_update_unknown_id() {
        let catalog = catalog();
        let err = catalog
            .update(RecordId(9), json!({"MD_Metadata": {}}), UpdateOptions::default())
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(RecordId(9))));
    }

    #[test]
    fn test_delete_removes_from_index() {
        let catalog = catalog();
        let handle = catalog
            .insert(json!({"MD_Metadata": {"title": "doomed"}}), meta(RecordType::Document))
            .unwrap();
        catalog.flush_index().unwrap();

        let removed = catalog.delete(handle.id).unwrap();
        assert_eq!(removed.uuid, handle.uuid);
        catalog.flush_index().unwrap();

        assert!(catalog.search(&Query::any("doomed")).unwrap().is_empty());
        assert!(catalog.get(handle.id).unwrap().is_none());
        assert!(matches!(
            catalog.delete(handle.id).unwrap_err(),
            CatalogError::NotFound(_)
        ));
    }

    #[test]
    fn test_forbidden_delete_changes_nothing() {
        let catalog = catalog();
        let contact = catalog
            .insert(
                json!({"CI_ResponsibleParty": {"individualName": "babar"}}),
                meta(RecordType::SubTemplate),
            )
            .unwrap();
        catalog
            .insert(
                json!({"MD_Metadata": {"contact": {"xlink:href": local_href(&contact.uuid)}}}),
                meta(RecordType::Template),
            )
            .unwrap();

        let err = catalog.delete(contact.id).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DeletionForbidden { referencing_count: 1, .. }
        ));
        assert!(catalog.get(contact.id).unwrap().is_some());
        assert_eq!(catalog.metrics().snapshot().deletes_forbidden, 1);
        assert_eq!(
            catalog.can_delete(contact.id).unwrap(),
            DeletionVerdict::Forbidden { referencing_count: 1 }
        );
    }

    #[test]
    fn test_referrer_reindex_failure_is_absorbed() {
        let catalog = catalog();
        let contact = catalog
            .insert(
                json!({"CI_ResponsibleParty": {"individualName": "babar"}}),
                meta(RecordType::SubTemplate),
            )
            .unwrap();

        catalog.resolver().graph().poison();
        assert!(catalog.resolver().reverse_references(&contact.uuid).is_err());

        // Runs after a committed write: must neither fail nor panic.
        catalog.refresh_referrers(&contact.uuid, contact.id);
        assert_eq!(catalog.metrics().snapshot().referrer_reindex_failures, 1);
        assert!(catalog.get(contact.id).unwrap().is_some());
    }

    #[test]
    fn test_deleting_target_reindexes_referrers() {
        let config = CatalogConfig {
            xlink_resolver_enabled: true,
            allow_referenced_deletion: true,
            ..CatalogConfig::default()
        };
        let catalog = Catalog::new(&config);
        let contact = catalog
            .insert(
                json!({"CI_ResponsibleParty": {"individualName": "babar"}}),
                meta(RecordType::SubTemplate),
            )
            .unwrap();
        let map = catalog
            .insert(
                json!({"MD_Metadata": {"contact": {"xlink:href": local_href(&contact.uuid)}}}),
                meta(RecordType::Template),
            )
            .unwrap();
        catalog.flush_index().unwrap();
        let doc = catalog.synchronizer().document(&map.uuid).unwrap().unwrap();
        assert!(doc.has_term(FIELD_ANY, "babar"));

        catalog.delete(contact.id).unwrap();
        catalog.flush_index().unwrap();

        let doc = catalog.synchronizer().document(&map.uuid).unwrap().unwrap();
        assert!(!doc.has_term(FIELD_ANY, "babar"));
    }
}
