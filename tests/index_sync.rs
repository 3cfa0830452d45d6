//! Index Synchronization Tests
//!
//! Tests for index queue invariants:
//! - Pending jobs for one record coalesce into one
//! - Flush is a barrier: writes made before it are searchable after it
//! - Concurrent updates of one record leave the index at its last content

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use metacat::config::CatalogConfig;
use metacat::index::{JobKind, PeriodicIndexer, Query, FIELD_ANY};
use metacat::record::{RecordMetadata, RecordType};
use metacat::{Catalog, UpdateOptions};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::new(&CatalogConfig::default()))
}

fn meta() -> RecordMetadata {
    RecordMetadata::new(RecordType::Document, 1, "local")
}

fn titled(title: &str) -> serde_json::Value {
    json!({"MD_Metadata": {"title": title}})
}

// =============================================================================
// Coalescing Tests
// =============================================================================

/// An insert followed by updates is one pending ADD carrying the last content.
#[test]
fn test_insert_then_updates_coalesce() {
    let catalog = catalog();
    let handle = catalog.insert(titled("first"), meta()).unwrap();
    for title in ["second", "third", "fourth"] {
        catalog
            .update(handle.id, titled(title), UpdateOptions::default())
            .unwrap();
    }

    let sync = catalog.synchronizer();
    assert_eq!(sync.pending_len().unwrap(), 1);
    assert_eq!(sync.enqueued_seq().unwrap(), 4);

    let report = catalog.indexing_task().run().unwrap();
    assert_eq!(report.written, 1);
    assert_eq!(catalog.metrics().snapshot().index_writes, 1);

    let doc = sync.document(&handle.uuid).unwrap().unwrap();
    assert!(doc.has_term(FIELD_ANY, "fourth"));
    assert!(!doc.has_term(FIELD_ANY, "first"));
}

/// A delete after pending writes leaves only the removal.
#[test]
fn test_delete_supersedes_pending_writes() {
    let catalog = catalog();
    let handle = catalog.insert(titled("ephemeral"), meta()).unwrap();
    catalog
        .update(handle.id, titled("still ephemeral"), UpdateOptions::default())
        .unwrap();
    catalog.delete(handle.id).unwrap();

    // Removal is keyed by id, so the queue holds a single REMOVE.
    let report = catalog.indexing_task().run().unwrap();
    assert_eq!(report.written, 0);
    assert_eq!(report.removed, 1);
    assert!(catalog.search(&Query::any("ephemeral")).unwrap().is_empty());
}

/// Job kinds render as their queue names.
#[test]
fn test_job_kind_names() {
    assert_eq!(JobKind::Add.to_string(), "ADD");
    assert_eq!(JobKind::Update.to_string(), "UPDATE");
    assert_eq!(JobKind::Remove.to_string(), "REMOVE");
}

// =============================================================================
// Flush Barrier Tests
// =============================================================================

/// Every writer sees its own insert after its own flush.
#[test]
fn test_flush_barrier_across_threads() {
    let catalog = catalog();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let catalog = Arc::clone(&catalog);
            thread::spawn(move || {
                let term = format!("writer{}", i);
                let handle = catalog.insert(titled(&term), meta()).unwrap();
                catalog.flush_index().unwrap();

                let hits = catalog.search(&Query::any(&term)).unwrap();
                assert_eq!(hits.len(), 1);
                assert_eq!(hits[0].uuid, handle.uuid);
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(catalog.synchronizer().indexed_len().unwrap(), 8);
    assert_eq!(catalog.synchronizer().pending_len().unwrap(), 0);
}

/// Flush with nothing pending returns at once.
#[test]
fn test_flush_idle() {
    let catalog = catalog();
    catalog.flush_index().unwrap();
    assert_eq!(catalog.metrics().snapshot().flush_timeouts, 0);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

/// Racing updates of one record: the index ends at the stored content.
#[test]
fn test_concurrent_updates_same_record() {
    let catalog = catalog();
    let handle = catalog.insert(titled("v0"), meta()).unwrap();

    let workers: Vec<_> = (1..=6)
        .map(|i| {
            let catalog = Arc::clone(&catalog);
            let id = handle.id;
            thread::spawn(move || {
                for round in 0..10 {
                    let title = format!("v{}r{}", i, round);
                    catalog
                        .update(id, titled(&title), UpdateOptions::default())
                        .unwrap();
                    if round % 3 == 0 {
                        catalog.indexing_task().run().unwrap();
                    }
                }
            })
        })
        .collect();

    for w in workers {
        w.join().unwrap();
    }
    catalog.flush_index().unwrap();

    let stored = catalog.get(handle.id).unwrap().unwrap();
    let stored_title = stored.content["MD_Metadata"]["title"].as_str().unwrap().to_string();
    let doc = catalog
        .synchronizer()
        .document(&handle.uuid)
        .unwrap()
        .unwrap();

    assert!(doc.has_term(FIELD_ANY, &stored_title));
    assert_eq!(doc.values(FIELD_ANY).filter(|t| t.starts_with('v')).count(), 1);
}

// =============================================================================
// Periodic Indexer Tests
// =============================================================================

/// The background indexer makes writes searchable without a flush.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_periodic_indexer_catches_up() {
    let catalog = catalog();
    let indexer = PeriodicIndexer::spawn(catalog.indexing_task(), Duration::from_millis(10));

    let handle = catalog.insert(titled("background"), meta()).unwrap();
    let mut hits = Vec::new();
    for _ in 0..200 {
        hits = catalog.search(&Query::any("background")).unwrap();
        if !hits.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].uuid, handle.uuid);

    indexer.shutdown().await;
}
