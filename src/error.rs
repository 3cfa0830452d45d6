//! Catalog error taxonomy
//!
//! Every failure a catalog operation reports is one of these. Subsystem
//! errors convert into it so callers deal with a single type.
//!
//! Severities:
//! - REJECT: the request was refused, nothing changed
//! - RECOVERABLE: the write succeeded, a derived step lagged or failed
//! - FATAL: internal state can no longer be trusted

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::index::IndexError;
use crate::record::{RecordError, RecordErrorCode, RecordId};
use crate::xlink::ReferenceError;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Reject,
    Recoverable,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Recoverable => write!(f, "RECOVERABLE"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Catalog errors
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Record {0} not found")]
    NotFound(RecordId),

    #[error("Record {uuid} is referenced by {referencing_count} other record(s)")]
    DeletionForbidden {
        uuid: String,
        referencing_count: usize,
    },

    #[error("Reference to {uuid} could not be resolved: {reason}")]
    ReferenceUnresolved { uuid: String, reason: String },

    #[error("Index did not catch up within {waited_ms}ms ({pending} jobs pending)")]
    IndexSyncTimeout { waited_ms: u64, pending: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::Validation(_) => "METACAT_VALIDATION_FAILED",
            CatalogError::NotFound(_) => "METACAT_RECORD_NOT_FOUND",
            CatalogError::DeletionForbidden { .. } => "METACAT_DELETION_FORBIDDEN",
            CatalogError::ReferenceUnresolved { .. } => "METACAT_REFERENCE_UNRESOLVED",
            CatalogError::IndexSyncTimeout { .. } => "METACAT_INDEX_SYNC_TIMEOUT",
            CatalogError::Config(e) => e.code(),
            CatalogError::Internal(_) => "METACAT_INTERNAL",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            CatalogError::ReferenceUnresolved { .. } | CatalogError::IndexSyncTimeout { .. } => {
                Severity::Recoverable
            }
            CatalogError::Internal(_) => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl From<RecordError> for CatalogError {
    fn from(err: RecordError) -> Self {
        match (err.code(), err.record_id()) {
            (RecordErrorCode::NotFound, Some(id)) => CatalogError::NotFound(id),
            (RecordErrorCode::ValidationFailed, _) => {
                CatalogError::Validation(err.message().to_string())
            }
            _ => CatalogError::Internal(err.message().to_string()),
        }
    }
}

impl From<ReferenceError> for CatalogError {
    fn from(err: ReferenceError) -> Self {
        match err {
            ReferenceError::Unresolved { uuid, reason } => {
                CatalogError::ReferenceUnresolved { uuid, reason }
            }
            ReferenceError::Internal(msg) => CatalogError::Internal(msg),
        }
    }
}

impl From<IndexError> for CatalogError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::SyncTimeout { waited_ms, pending } => {
                CatalogError::IndexSyncTimeout { waited_ms, pending }
            }
            other => CatalogError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_errors_convert() {
        let err: CatalogError = RecordError::not_found(RecordId(4)).into();
        assert!(matches!(err, CatalogError::NotFound(RecordId(4))));
        assert_eq!(err.code(), "METACAT_RECORD_NOT_FOUND");
        assert_eq!(err.severity(), Severity::Reject);

        let err: CatalogError = RecordError::validation("bad tree").into();
        assert_eq!(err.code(), "METACAT_VALIDATION_FAILED");

        let err: CatalogError = RecordError::internal("poisoned").into();
        assert_eq!(err.severity(), Severity::Fatal);
    }

    #[test]
    fn test_index_timeout_is_recoverable() {
        let err: CatalogError = IndexError::SyncTimeout {
            waited_ms: 10,
            pending: 1,
        }
        .into();
        assert_eq!(err.code(), "METACAT_INDEX_SYNC_TIMEOUT");
        assert_eq!(err.severity(), Severity::Recoverable);
    }

    #[test]
    fn test_forbidden_message() {
        let err = CatalogError::DeletionForbidden {
            uuid: "contact".into(),
            referencing_count: 2,
        };
        assert_eq!(err.code(), "METACAT_DELETION_FORBIDDEN");
        assert!(err.to_string().contains("2 other record"));
    }

    #[test]
    fn test_config_error_keeps_code() {
        let err: CatalogError = ConfigError::UnknownSetting("nope".into()).into();
        assert_eq!(err.code(), "METACAT_UNKNOWN_SETTING");
        assert_eq!(format!("{}", err), "Unknown setting: nope");
    }
}
