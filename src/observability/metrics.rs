//! Catalog counters
//!
//! - Counters only
//! - Monotonic increase, except the live record gauge
//! - Thread-safe, Relaxed ordering

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Metrics registry containing all operational counters
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    inserts: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
    deletes_forbidden: AtomicU64,
    records: AtomicU64,
    index_writes: AtomicU64,
    index_removals: AtomicU64,
    index_retries: AtomicU64,
    drains: AtomicU64,
    flush_timeouts: AtomicU64,
    unresolved_references: AtomicU64,
    listener_failures: AtomicU64,
    referrer_reindex_failures: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_inserts(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
        self.records.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_updates(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deletes(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.records.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn increment_deletes_forbidden(&self) {
        self.deletes_forbidden.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_index_writes(&self) {
        self.index_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_index_removals(&self) {
        self.index_removals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_index_retries(&self) {
        self.index_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_drains(&self) {
        self.drains.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_flush_timeouts(&self) {
        self.flush_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_unresolved_references(&self, n: u64) {
        self.unresolved_references.fetch_add(n, Ordering::Relaxed);
    }

    pub fn increment_listener_failures(&self) {
        self.listener_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_referrer_reindex_failures(&self) {
        self.referrer_reindex_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Total index document writes
    pub fn index_writes(&self) -> u64 {
        self.index_writes.load(Ordering::Relaxed)
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            inserts: self.inserts.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            deletes_forbidden: self.deletes_forbidden.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            index_writes: self.index_writes.load(Ordering::Relaxed),
            index_removals: self.index_removals.load(Ordering::Relaxed),
            index_retries: self.index_retries.load(Ordering::Relaxed),
            drains: self.drains.load(Ordering::Relaxed),
            flush_timeouts: self.flush_timeouts.load(Ordering::Relaxed),
            unresolved_references: self.unresolved_references.load(Ordering::Relaxed),
            listener_failures: self.listener_failures.load(Ordering::Relaxed),
            referrer_reindex_failures: self.referrer_reindex_failures.load(Ordering::Relaxed),
        }
    }

    /// Snapshot rendered as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
    pub deletes_forbidden: u64,
    pub records: u64,
    pub index_writes: u64,
    pub index_removals: u64,
    pub index_retries: u64,
    pub drains: u64,
    pub flush_timeouts: u64,
    pub unresolved_references: u64,
    pub listener_failures: u64,
    pub referrer_reindex_failures: u64,
}
