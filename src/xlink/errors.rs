//! Cross-reference errors

use thiserror::Error;

/// Result type for reference operations
pub type ReferenceResult<T> = Result<T, ReferenceError>;

/// Cross-reference errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    /// Target missing locally and the resolution port could not supply it.
    /// Recoverable: the referencing record stays valid.
    #[error("Reference to '{uuid}' unresolved: {reason}")]
    Unresolved { uuid: String, reason: String },

    #[error("Reference graph unavailable: {0}")]
    Internal(String),
}

impl ReferenceError {
    pub fn unresolved(uuid: impl Into<String>, reason: impl Into<String>) -> Self {
        ReferenceError::Unresolved {
            uuid: uuid.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ReferenceError::Unresolved { .. } => "METACAT_REFERENCE_UNRESOLVED",
            ReferenceError::Internal(_) => "METACAT_GRAPH_INTERNAL",
        }
    }

    /// Whether the caller may carry on without the target
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ReferenceError::Unresolved { .. })
    }
}
