//! API response types
//!
//! `{"status":"ok","data":...}` or
//! `{"status":"error","code":...,"message":...}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::ApiError;

/// Success response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub status: String,
    pub data: Value,
}

impl SuccessResponse {
    pub fn new(data: Value) -> Self {
        Self {
            status: "ok".to_string(),
            data,
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn from_error(err: &ApiError) -> Self {
        Self {
            status: "error".to_string(),
            code: err.code().to_string(),
            message: err.message().to_string(),
        }
    }
}

/// Unified response type
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    Success(SuccessResponse),
    Error(ErrorResponse),
}

impl Response {
    pub fn success(data: Value) -> Self {
        Response::Success(SuccessResponse::new(data))
    }

    /// Success with no payload
    pub fn ok() -> Self {
        Response::success(Value::Null)
    }

    pub fn error(err: &ApiError) -> Self {
        Response::Error(ErrorResponse::from_error(err))
    }

    /// One-line JSON rendering
    pub fn to_json(&self) -> String {
        // Only strings and JSON values inside; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"status":"error","code":"METACAT_INTERNAL","message":"unserializable response"}"#
                .to_string()
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_response() {
        let json = Response::success(json!({"id": 1, "uuid": "abc"})).to_json();
        assert_eq!(json, r#"{"status":"ok","data":{"id":1,"uuid":"abc"}}"#);
    }

    #[test]
    fn test_ok_response() {
        assert_eq!(Response::ok().to_json(), r#"{"status":"ok","data":null}"#);
    }

    #[test]
    fn test_error_response() {
        let resp = Response::error(&ApiError::invalid_request("missing id"));
        assert!(!resp.is_success());
        let json = resp.to_json();
        assert!(json.contains("\"status\":\"error\""));
        assert!(json.contains("METACAT_INVALID_REQUEST"));
        assert!(json.contains("missing id"));
    }
}
