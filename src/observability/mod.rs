//! Observability for the catalog
//!
//! - Structured logging (JSON lines)
//! - Typed events
//! - Operational counters
//!
//! Observability is read-only: nothing here can fail a catalog operation.
//!
//! ```ignore
//! use metacat::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::RecordInserted, &[("uuid", "abc")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity, Sink};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log an event at its default severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log an event with fields at its default severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
