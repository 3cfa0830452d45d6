//! API request types
//!
//! JSON request parsing for all supported operations.

use serde::Deserialize;
use serde_json::Value;

use super::errors::{ApiError, ApiResult};
use crate::catalog::UpdateOptions;
use crate::index::Query;
use crate::record::{RecordId, RecordMetadata, RecordType};

/// Insert request
#[derive(Debug, Clone)]
pub struct InsertRequest {
    /// A record tree, or a string holding one as JSON text
    pub content: Value,
    pub metadata: RecordMetadata,
}

/// Update request
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub id: RecordId,
    pub content: Value,
    pub options: UpdateOptions,
}

/// Lookup by id or by uuid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetRequest {
    Id(RecordId),
    Uuid(String),
}

/// Unified request envelope
#[derive(Debug, Clone)]
pub enum Request {
    Insert(InsertRequest),
    Update(UpdateRequest),
    Delete(RecordId),
    Get(GetRequest),
    Flush,
    Search(Query),
    SetSetting { key: String, value: Value },
    CanDelete(RecordId),
}

/// Raw request for parsing
#[derive(Debug, Clone, Deserialize)]
struct RawRequest {
    op: String,
    #[serde(default)]
    id: Option<RecordId>,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    content: Option<Value>,
    #[serde(default, rename = "type")]
    record_type: Option<RecordType>,
    #[serde(default)]
    owner: Option<u64>,
    #[serde(default)]
    source_id: Option<String>,
    #[serde(default)]
    popularity: Option<u64>,
    #[serde(default)]
    harvested: Option<bool>,
    #[serde(default)]
    reindex: Option<bool>,
    #[serde(default)]
    refresh_references: Option<bool>,
    #[serde(default)]
    query: Option<Query>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    value: Option<Value>,
}

fn required<T>(field: Option<T>, name: &str) -> ApiResult<T> {
    field.ok_or_else(|| ApiError::invalid_request(format!("Missing {}", name)))
}

impl Request {
    /// Parse a request from JSON string
    pub fn parse(json: &str) -> ApiResult<Self> {
        let raw: RawRequest = serde_json::from_str(json)
            .map_err(|e| ApiError::invalid_request(format!("Invalid JSON: {}", e)))?;

        match raw.op.as_str() {
            "insert" => {
                let content = required(raw.content, "content")?;
                let record_type = required(raw.record_type, "type")?;
                let owner = required(raw.owner, "owner")?;
                let source_id = required(raw.source_id, "source_id")?;

                let mut metadata = RecordMetadata::new(record_type, owner, source_id)
                    .with_popularity(raw.popularity.unwrap_or(0))
                    .harvested(raw.harvested.unwrap_or(false));
                if let Some(uuid) = raw.uuid {
                    metadata = metadata.with_uuid(uuid);
                }
                Ok(Request::Insert(InsertRequest { content, metadata }))
            }
            "update" => {
                let defaults = UpdateOptions::default();
                Ok(Request::Update(UpdateRequest {
                    id: required(raw.id, "id")?,
                    content: required(raw.content, "content")?,
                    options: UpdateOptions {
                        reindex: raw.reindex.unwrap_or(defaults.reindex),
                        refresh_references: raw
                            .refresh_references
                            .unwrap_or(defaults.refresh_references),
                    },
                }))
            }
            "delete" => Ok(Request::Delete(required(raw.id, "id")?)),
            "get" => match (raw.id, raw.uuid) {
                (Some(id), _) => Ok(Request::Get(GetRequest::Id(id))),
                (None, Some(uuid)) => Ok(Request::Get(GetRequest::Uuid(uuid))),
                (None, None) => Err(ApiError::invalid_request("Missing id or uuid")),
            },
            "flush" => Ok(Request::Flush),
            "search" => Ok(Request::Search(raw.query.unwrap_or(Query::All))),
            "set_setting" => Ok(Request::SetSetting {
                key: required(raw.key, "key")?,
                value: required(raw.value, "value")?,
            }),
            "can_delete" => Ok(Request::CanDelete(required(raw.id, "id")?)),
            other => Err(ApiError::unknown_operation(other)),
        }
    }
}
