//! Observable catalog events
//!
//! Every log line the catalog writes names one of these events.

use std::fmt;

use super::logger::Severity;

/// Observable events in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded
    ConfigLoaded,
    /// A setting changed at runtime
    SettingChanged,
    /// Request loop serving
    Serving,

    // Record store
    /// Record inserted
    RecordInserted,
    /// Record updated
    RecordUpdated,
    /// Record deleted
    RecordDeleted,
    /// Write rejected for invalid content
    RecordRejected,

    // Reference integrity
    /// Delete refused because the record is still referenced
    DeletionForbidden,
    /// A cross-reference target could not be resolved
    ReferenceUnresolved,

    // Indexing
    /// Drain started
    IndexDrainBegin,
    /// Drain finished
    IndexDrainComplete,
    /// A job failed and was requeued
    IndexJobRetry,
    /// A job exhausted its retries and was dropped
    IndexJobDropped,
    /// Flush deadline exceeded
    IndexFlushTimeout,
    /// Periodic indexer started
    IndexerStarted,
    /// Periodic indexer stopped
    IndexerStopped,
    /// A periodic sweep failed
    IndexSweepFailed,
    /// Records referencing a changed record could not be queued
    ReferrerReindexFailed,

    // Notifications
    /// Removal notification observed by a listener
    RecordRemovedNotified,
    /// A removal listener failed
    ListenerFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SettingChanged => "SETTING_CHANGED",
            Event::Serving => "SERVING",
            Event::RecordInserted => "RECORD_INSERTED",
            Event::RecordUpdated => "RECORD_UPDATED",
            Event::RecordDeleted => "RECORD_DELETED",
            Event::RecordRejected => "RECORD_REJECTED",
            Event::DeletionForbidden => "DELETION_FORBIDDEN",
            Event::ReferenceUnresolved => "REFERENCE_UNRESOLVED",
            Event::IndexDrainBegin => "INDEX_DRAIN_BEGIN",
            Event::IndexDrainComplete => "INDEX_DRAIN_COMPLETE",
            Event::IndexJobRetry => "INDEX_JOB_RETRY",
            Event::IndexJobDropped => "INDEX_JOB_DROPPED",
            Event::IndexFlushTimeout => "INDEX_FLUSH_TIMEOUT",
            Event::IndexerStarted => "INDEXER_STARTED",
            Event::IndexerStopped => "INDEXER_STOPPED",
            Event::IndexSweepFailed => "INDEX_SWEEP_FAILED",
            Event::ReferrerReindexFailed => "REFERRER_REINDEX_FAILED",
            Event::RecordRemovedNotified => "RECORD_REMOVED",
            Event::ListenerFailed => "LISTENER_FAILED",
        }
    }

    /// Severity a line for this event is written at
    pub fn severity(&self) -> Severity {
        match self {
            Event::IndexDrainBegin | Event::IndexDrainComplete => Severity::Trace,
            Event::RecordRejected
            | Event::DeletionForbidden
            | Event::ReferenceUnresolved
            | Event::IndexJobRetry
            | Event::IndexFlushTimeout
            | Event::ListenerFailed => Severity::Warn,
            Event::IndexJobDropped | Event::IndexSweepFailed | Event::ReferrerReindexFailed => {
                Severity::Error
            }
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_upper_snake() {
        let events = [
            Event::ConfigLoaded,
            Event::RecordInserted,
            Event::DeletionForbidden,
            Event::IndexFlushTimeout,
            Event::RecordRemovedNotified,
            Event::ListenerFailed,
        ];
        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(Event::RecordInserted.severity(), Severity::Info);
        assert_eq!(Event::DeletionForbidden.severity(), Severity::Warn);
        assert_eq!(Event::IndexJobDropped.severity(), Severity::Error);
        assert_eq!(Event::IndexDrainBegin.severity(), Severity::Trace);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::RecordRemovedNotified), "RECORD_REMOVED");
    }
}
