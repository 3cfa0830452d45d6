//! Index error types
//!
//! Error codes:
//! - METACAT_INDEX_SYNC_TIMEOUT (RECOVERABLE)
//! - METACAT_INDEX_BUILD_FAILED (RECOVERABLE)
//! - METACAT_INDEX_INTERNAL (FATAL)

use thiserror::Error;

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Index errors
#[derive(Debug, Clone, Error)]
pub enum IndexError {
    #[error("index flush timed out after {waited_ms}ms with {pending} jobs pending")]
    SyncTimeout { waited_ms: u64, pending: usize },

    #[error("index document for {uuid} could not be built: {reason}")]
    Build { uuid: String, reason: String },

    #[error("index internal error: {0}")]
    Internal(String),
}

impl IndexError {
    pub fn build(uuid: impl Into<String>, reason: impl Into<String>) -> Self {
        IndexError::Build {
            uuid: uuid.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn poisoned(what: &str) -> Self {
        IndexError::Internal(format!("{} lock poisoned", what))
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::SyncTimeout { .. } => "METACAT_INDEX_SYNC_TIMEOUT",
            IndexError::Build { .. } => "METACAT_INDEX_BUILD_FAILED",
            IndexError::Internal(_) => "METACAT_INDEX_INTERNAL",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, IndexError::Internal(_))
    }
}
