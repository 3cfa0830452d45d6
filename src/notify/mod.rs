//! Record removal notifications
//!
//! Fire-and-forget fan-out to external listeners. Listeners run
//! synchronously in registration order; a listener that fails or
//! panics is logged and skipped, and never affects the delete that
//! triggered it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{PoisonError, RwLock};

use serde::Serialize;

use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::record::{Record, RecordId, RecordType};

/// Payload delivered after a record has been deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRemoved {
    pub id: RecordId,
    pub uuid: String,
    pub record_type: RecordType,
    pub owner: u64,
}

impl From<&Record> for RecordRemoved {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id,
            uuid: record.uuid.clone(),
            record_type: record.record_type,
            owner: record.owner,
        }
    }
}

/// An external consumer of removal events
pub trait RemovalListener: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    fn on_removed(&self, event: &RecordRemoved) -> Result<(), String>;
}

/// Listener that writes one log line per removal
#[derive(Debug, Default)]
pub struct LoggingListener;

impl RemovalListener for LoggingListener {
    fn name(&self) -> &str {
        "logging"
    }

    fn on_removed(&self, event: &RecordRemoved) -> Result<(), String> {
        log_event_with_fields(
            Event::RecordRemovedNotified,
            &[
                ("id", &event.id.to_string()),
                ("type", event.record_type.as_str()),
                ("uuid", &event.uuid),
            ],
        );
        Ok(())
    }
}

/// Outcome of one publish
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Registered removal listeners
#[derive(Default)]
pub struct NotificationPort {
    listeners: RwLock<Vec<Box<dyn RemovalListener>>>,
}

impl NotificationPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it will be called after those already present
    pub fn subscribe(&self, listener: Box<dyn RemovalListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Deliver `event` to every listener, isolating failures
    pub fn publish(&self, event: &RecordRemoved, metrics: &MetricsRegistry) -> PublishReport {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        let mut report = PublishReport::default();

        for listener in listeners.iter() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.on_removed(event)));
            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(reason)) => Some(reason),
                Err(_) => Some("listener panicked".to_string()),
            };

            match failure {
                None => report.delivered += 1,
                Some(reason) => {
                    report.failed += 1;
                    metrics.increment_listener_failures();
                    log_event_with_fields(
                        Event::ListenerFailed,
                        &[("listener", listener.name()), ("reason", &reason), ("uuid", &event.uuid)],
                    );
                }
            }
        }

        report
    }
}
