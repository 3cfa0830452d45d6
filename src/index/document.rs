//! Index documents
//!
//! An `IndexDocument` is derived from a record at index time and can
//! always be rebuilt from it. Building is pluggable through
//! `DocumentBuilder`; the catalog installs the reference-expanding one.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::errors::IndexResult;
use crate::config::Settings;
use crate::observability::MetricsRegistry;
use crate::record::{Record, RecordId};
use crate::xlink::ReferenceResolver;

pub const FIELD_UUID: &str = "_uuid";
pub const FIELD_ID: &str = "_id";
pub const FIELD_IS_TEMPLATE: &str = "_isTemplate";
pub const FIELD_OWNER: &str = "_owner";
pub const FIELD_SOURCE: &str = "_source";
pub const FIELD_ROOT: &str = "_root";
pub const FIELD_POPULARITY: &str = "_popularity";
pub const FIELD_HARVESTED: &str = "_harvested";
/// Full-text field
pub const FIELD_ANY: &str = "any";

/// Searchable projection of one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDocument {
    pub uuid: String,
    pub id: RecordId,
    pub is_template: String,
    pub popularity: u64,
    pub fields: BTreeMap<String, BTreeSet<String>>,
}

impl IndexDocument {
    /// Build from a record, indexing `content` as the full text.
    ///
    /// `content` is the record's own content or an expanded copy of it.
    pub fn from_record(record: &Record, content: &Value) -> Self {
        let mut fields: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut put = |name: &str, value: String| {
            fields.entry(name.to_string()).or_default().insert(value);
        };

        put(FIELD_UUID, record.uuid.clone());
        put(FIELD_ID, record.id.to_string());
        put(FIELD_IS_TEMPLATE, record.record_type.template_flag().to_string());
        put(FIELD_OWNER, record.owner.to_string());
        put(FIELD_SOURCE, record.source_id.clone());
        put(FIELD_ROOT, record.root.clone());
        put(FIELD_POPULARITY, record.popularity.to_string());
        put(FIELD_HARVESTED, if record.harvested { "y" } else { "n" }.to_string());

        let mut any = BTreeSet::new();
        collect_tokens(content, &mut any);
        if !any.is_empty() {
            fields.insert(FIELD_ANY.to_string(), any);
        }

        Self {
            uuid: record.uuid.clone(),
            id: record.id,
            is_template: record.record_type.template_flag().to_string(),
            popularity: record.popularity,
            fields,
        }
    }

    /// Values of one field
    pub fn values(&self, field: &str) -> impl Iterator<Item = &str> {
        self.fields
            .get(field)
            .into_iter()
            .flat_map(|values| values.iter().map(String::as_str))
    }

    pub fn has_term(&self, field: &str, term: &str) -> bool {
        self.fields
            .get(field)
            .map(|values| values.contains(term))
            .unwrap_or(false)
    }
}

/// Lower-cased alphanumeric tokens of a piece of text
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn collect_tokens(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::String(text) => out.extend(tokenize(text)),
        Value::Number(n) => {
            out.insert(n.to_string());
        }
        Value::Array(items) => items.iter().for_each(|item| collect_tokens(item, out)),
        Value::Object(obj) => obj.values().for_each(|child| collect_tokens(child, out)),
        Value::Bool(_) | Value::Null => {}
    }
}

/// Turns a record into its index document
///
/// The built-in builders never fail on stored records: content is
/// validated at write time and unresolved references only skip the
/// expansion. An `Err` from a pluggable builder makes the synchronizer
/// retry the job on later drains, then drop it.
pub trait DocumentBuilder: Send + Sync {
    fn build(&self, record: &Record) -> IndexResult<IndexDocument>;
}

/// Indexes each record's own content only
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainDocumentBuilder;

impl DocumentBuilder for PlainDocumentBuilder {
    fn build(&self, record: &Record) -> IndexResult<IndexDocument> {
        Ok(IndexDocument::from_record(record, &record.content))
    }
}

/// Expands cross-references before indexing when the resolver is enabled
pub struct ExpandingDocumentBuilder {
    resolver: Arc<ReferenceResolver>,
    settings: Arc<Settings>,
    metrics: Arc<MetricsRegistry>,
}

impl ExpandingDocumentBuilder {
    pub fn new(
        resolver: Arc<ReferenceResolver>,
        settings: Arc<Settings>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            resolver,
            settings,
            metrics,
        }
    }
}

impl DocumentBuilder for ExpandingDocumentBuilder {
    fn build(&self, record: &Record) -> IndexResult<IndexDocument> {
        if !self.settings.xlink_resolver_enabled() {
            return Ok(IndexDocument::from_record(record, &record.content));
        }

        let expansion = self.resolver.expand(&record.content);
        if !expansion.unresolved.is_empty() {
            self.metrics
                .add_unresolved_references(expansion.unresolved.len() as u64);
        }
        Ok(IndexDocument::from_record(record, &expansion.content))
    }
}
