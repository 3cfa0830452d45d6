//! API Layer for metacat
//!
//! One JSON object per request, one JSON object per response.
//!
//! # Design Principles
//!
//! - Error codes passed through unchanged from the catalog
//! - No request is partially applied
//!
//! # Supported Operations
//!
//! - insert
//! - update
//! - delete
//! - get
//! - flush
//! - search
//! - set_setting
//! - can_delete

mod errors;
mod handler;
mod request;
mod response;

pub use errors::{ApiError, ApiErrorCode, ApiResult, Severity};
pub use handler::ApiHandler;
pub use request::{GetRequest, InsertRequest, Request, UpdateRequest};
pub use response::{ErrorResponse, Response, SuccessResponse};
