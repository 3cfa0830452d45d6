//! Record store errors
//!
//! Error codes:
//! - METACAT_VALIDATION_FAILED (REJECT)
//! - METACAT_RECORD_NOT_FOUND (REJECT)
//! - METACAT_STORE_INTERNAL (FATAL)

use std::fmt;

use super::types::RecordId;

/// Severity levels for record store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Request rejected, nothing was written
    Reject,
    /// Store state can no longer be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Record store error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordErrorCode {
    /// Content is not a well-formed record tree
    ValidationFailed,
    /// Unknown record id
    NotFound,
    /// Poisoned store lock
    Internal,
}

impl RecordErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            RecordErrorCode::ValidationFailed => "METACAT_VALIDATION_FAILED",
            RecordErrorCode::NotFound => "METACAT_RECORD_NOT_FOUND",
            RecordErrorCode::Internal => "METACAT_STORE_INTERNAL",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            RecordErrorCode::Internal => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for RecordErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Record store error with context
#[derive(Debug, Clone)]
pub struct RecordError {
    code: RecordErrorCode,
    message: String,
    record_id: Option<RecordId>,
}

impl RecordError {
    /// Content failed validation
    pub fn validation(reason: impl Into<String>) -> Self {
        Self {
            code: RecordErrorCode::ValidationFailed,
            message: reason.into(),
            record_id: None,
        }
    }

    /// No record with this id
    pub fn not_found(id: RecordId) -> Self {
        Self {
            code: RecordErrorCode::NotFound,
            message: format!("Record {} not found", id),
            record_id: Some(id),
        }
    }

    /// Internal store failure
    pub fn internal(reason: impl Into<String>) -> Self {
        Self {
            code: RecordErrorCode::Internal,
            message: reason.into(),
            record_id: None,
        }
    }

    pub fn code(&self) -> RecordErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Record id if the error concerns a specific record
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for RecordError {}

/// Result type for record store operations
pub type RecordResult<T> = Result<T, RecordError>;
