//! Content tree validation
//!
//! A record's content is a JSON object with exactly one key, the root
//! element name, whose value is itself an object.

use serde_json::Value;

use super::errors::{RecordError, RecordResult};

/// Parse raw text into a content tree
pub fn parse_content(raw: &str) -> RecordResult<Value> {
    let content: Value = serde_json::from_str(raw)
        .map_err(|e| RecordError::validation(format!("content is not valid JSON: {}", e)))?;
    root_name(&content)?;
    Ok(content)
}

/// Validate a content tree and return its root element name
pub fn root_name(content: &Value) -> RecordResult<String> {
    let obj = content
        .as_object()
        .ok_or_else(|| RecordError::validation(format!("content must be an object, got {}", type_name(content))))?;

    let mut entries = obj.iter();
    let (root, body) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        (None, _) => return Err(RecordError::validation("content has no root element")),
        (Some(_), Some(_)) => {
            return Err(RecordError::validation(format!(
                "content must have a single root element, found {}",
                obj.len()
            )))
        }
    };

    if root.trim().is_empty() {
        return Err(RecordError::validation("root element name is empty"));
    }
    if !body.is_object() {
        return Err(RecordError::validation(format!(
            "root element '{}' must be an object, got {}",
            root,
            type_name(body)
        )));
    }

    Ok(root.clone())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
