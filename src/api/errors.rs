//! API error types
//!
//! API errors are pass-through: catalog error codes reach the client
//! unchanged. Only malformed requests get API-specific codes.

use std::fmt;

use crate::error::{CatalogError, Severity as CatalogSeverity};

/// API error severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Request failed, the catalog is fine
    Error,
    /// Catalog state can no longer be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// API-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Request is not valid JSON or misses a field
    InvalidRequest,
    /// Unknown `op`
    UnknownOperation,
}

impl ApiErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ApiErrorCode::InvalidRequest => "METACAT_INVALID_REQUEST",
            ApiErrorCode::UnknownOperation => "METACAT_UNKNOWN_OPERATION",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// API error with preserved catalog error information
#[derive(Debug, Clone)]
pub struct ApiError {
    code: String,
    message: String,
    severity: Severity,
}

impl ApiError {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self {
            code: ApiErrorCode::InvalidRequest.code().to_string(),
            message: reason.into(),
            severity: Severity::Error,
        }
    }

    pub fn unknown_operation(op: impl Into<String>) -> Self {
        Self {
            code: ApiErrorCode::UnknownOperation.code().to_string(),
            message: format!("Unknown operation: {}", op.into()),
            severity: Severity::Error,
        }
    }

    /// No record carries `uuid`
    pub fn uuid_not_found(uuid: &str) -> Self {
        Self {
            code: "METACAT_RECORD_NOT_FOUND".to_string(),
            message: format!("Record with uuid {} not found", uuid),
            severity: Severity::Error,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            severity: match err.severity() {
                CatalogSeverity::Fatal => Severity::Fatal,
                _ => Severity::Error,
            },
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
