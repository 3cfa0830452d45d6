//! Record types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Internal record handle, allocated by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(RecordId)
    }
}

/// Kind of catalog record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordType {
    /// A regular metadata record
    Document,
    /// A template new records are created from
    Template,
    /// A reusable fragment other records point at
    SubTemplate,
}

impl RecordType {
    /// Single-letter template flag stored in the index
    pub fn template_flag(&self) -> &'static str {
        match self {
            RecordType::Document => "n",
            RecordType::Template => "y",
            RecordType::SubTemplate => "s",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Document => "DOCUMENT",
            RecordType::Template => "TEMPLATE",
            RecordType::SubTemplate => "SUB_TEMPLATE",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-supplied attributes of a new record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Stable identity; generated when absent
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub owner: u64,
    pub source_id: String,
    #[serde(default)]
    pub popularity: u64,
    #[serde(default)]
    pub harvested: bool,
}

impl RecordMetadata {
    pub fn new(record_type: RecordType, owner: u64, source_id: impl Into<String>) -> Self {
        Self {
            uuid: None,
            record_type,
            owner,
            source_id: source_id.into(),
            popularity: 0,
            harvested: false,
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn with_popularity(mut self, popularity: u64) -> Self {
        self.popularity = popularity;
        self
    }

    pub fn harvested(mut self, harvested: bool) -> Self {
        self.harvested = harvested;
        self
    }
}

/// A stored catalog record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: RecordId,
    /// Assigned once at insert, never changes
    pub uuid: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub owner: u64,
    pub source_id: String,
    /// Name of the content's root element
    pub root: String,
    pub content: Value,
    pub popularity: u64,
    pub harvested: bool,
    pub created_at: DateTime<Utc>,
    pub changed_at: DateTime<Utc>,
}

impl Record {
    /// `{id, uuid}` pair returned by write operations
    pub fn handle(&self) -> RecordHandle {
        RecordHandle {
            id: self.id,
            uuid: self.uuid.clone(),
        }
    }
}

/// Identity pair of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordHandle {
    pub id: RecordId,
    pub uuid: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_flags() {
        assert_eq!(RecordType::Document.template_flag(), "n");
        assert_eq!(RecordType::Template.template_flag(), "y");
        assert_eq!(RecordType::SubTemplate.template_flag(), "s");
    }

    #[test]
    fn test_record_type_serde() {
        let t: RecordType = serde_json::from_str("\"SUB_TEMPLATE\"").unwrap();
        assert_eq!(t, RecordType::SubTemplate);
        assert_eq!(serde_json::to_string(&RecordType::Template).unwrap(), "\"TEMPLATE\"");
    }

    #[test]
    fn test_metadata_from_json() {
        let meta: RecordMetadata =
            serde_json::from_str(r#"{"type":"DOCUMENT","owner":42,"source_id":"src"}"#).unwrap();
        assert_eq!(meta.owner, 42);
        assert!(meta.uuid.is_none());
        assert!(!meta.harvested);
    }

    #[test]
    fn test_record_id_parse() {
        assert_eq!(" 12 ".parse::<RecordId>().unwrap(), RecordId(12));
        assert!("x".parse::<RecordId>().is_err());
    }
}
