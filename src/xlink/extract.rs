//! Cross-reference extraction and inline expansion
//!
//! A marker is any object carrying an `xlink:href` (or `@xlink:href`)
//! string of the form `local://<service>?...uuid=<target>...`.
//! Other hrefs are ordinary links and are ignored.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::ReferenceError;

/// Attribute names carrying a cross-reference
pub const HREF_KEYS: [&str; 2] = ["xlink:href", "@xlink:href"];

/// A cross-reference found in a content tree
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct XLink {
    /// Uuid of the referenced record
    pub target_uuid: String,
    /// JSON pointer of the object carrying the marker
    pub location: String,
}

fn local_href() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^local://[^?#]*\?(?:[^#]*&)?uuid=([^&#]+)").ok())
        .as_ref()
}

/// Target uuid of a local href, if it is one
pub fn target_of(href: &str) -> Option<&str> {
    local_href()?
        .captures(href.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn href_of(obj: &Map<String, Value>) -> Option<&str> {
    HREF_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
}

/// Every cross-reference in `content`, ordered and de-duplicated.
///
/// Pure function of the content.
pub fn extract_references(content: &Value) -> BTreeSet<XLink> {
    let mut links = BTreeSet::new();
    let mut path = String::new();
    walk(content, &mut path, &mut links);
    links
}

fn walk(value: &Value, path: &mut String, links: &mut BTreeSet<XLink>) {
    match value {
        Value::Object(obj) => {
            if let Some(target) = href_of(obj).and_then(target_of) {
                links.insert(XLink {
                    target_uuid: target.to_string(),
                    location: path.clone(),
                });
            }
            for (key, child) in obj {
                let len = path.len();
                path.push('/');
                push_escaped(path, key);
                walk(child, path, links);
                path.truncate(len);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                let len = path.len();
                path.push('/');
                path.push_str(&i.to_string());
                walk(child, path, links);
                path.truncate(len);
            }
        }
        _ => {}
    }
}

fn push_escaped(path: &mut String, key: &str) {
    for c in key.chars() {
        match c {
            '~' => path.push_str("~0"),
            '/' => path.push_str("~1"),
            c => path.push(c),
        }
    }
}

/// Result of expanding a content tree
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    /// Content with resolved targets substituted inline
    pub content: Value,
    /// Targets that could not be substituted
    pub unresolved: Vec<ReferenceError>,
}

/// Copy `content`, substituting each marker's resolved target inline.
///
/// The resolved tree's root element is inserted next to the href,
/// which is kept. Substituted content is not expanded again, so
/// reference cycles terminate. A failed resolution skips that
/// substitution only.
pub fn expand<F>(content: &Value, mut resolve: F) -> Expansion
where
    F: FnMut(&str) -> Result<Value, ReferenceError>,
{
    let mut expanded = content.clone();
    let mut unresolved = Vec::new();
    substitute(&mut expanded, &mut resolve, &mut unresolved);
    Expansion {
        content: expanded,
        unresolved,
    }
}

fn substitute<F>(value: &mut Value, resolve: &mut F, unresolved: &mut Vec<ReferenceError>)
where
    F: FnMut(&str) -> Result<Value, ReferenceError>,
{
    match value {
        Value::Object(obj) => {
            let target = href_of(obj).and_then(target_of).map(str::to_string);
            for child in obj.values_mut() {
                substitute(child, resolve, unresolved);
            }
            if let Some(target) = target {
                match resolve(&target) {
                    Ok(Value::Object(resolved)) => {
                        for (key, body) in resolved {
                            obj.insert(key, body);
                        }
                    }
                    Ok(_) => unresolved.push(ReferenceError::unresolved(
                        target,
                        "resolved content is not a record tree",
                    )),
                    Err(e) => unresolved.push(e),
                }
            }
        }
        Value::Array(items) => {
            for child in items {
                substitute(child, resolve, unresolved);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vicinity_map(contact_uuid: &str) -> Value {
        json!({
            "MD_Metadata": {
                "identificationInfo": {
                    "MD_DataIdentification": {
                        "title": "Vicinity map",
                        "pointOfContact": {
                            "xlink:href": format!("local://xml.metadata.get?uuid={}", contact_uuid)
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn test_target_of() {
        assert_eq!(target_of("local://xml.metadata.get?uuid=abc"), Some("abc"));
        assert_eq!(target_of("local://srv/api?lang=eng&uuid=abc&x=1"), Some("abc"));
        assert_eq!(target_of("http://example.org/?uuid=abc"), None);
        assert_eq!(target_of("local://xml.metadata.get?id=3"), None);
    }

    #[test]
    fn test_extract_single_reference() {
        let links = extract_references(&vicinity_map("contact-1"));
        assert_eq!(links.len(), 1);

        let link = links.iter().next().unwrap();
        assert_eq!(link.target_uuid, "contact-1");
        assert_eq!(
            link.location,
            "/MD_Metadata/identificationInfo/MD_DataIdentification/pointOfContact"
        );
    }

    #[test]
    fn test_extract_is_deterministic_and_deduplicated() {
        let content = json!({"root": {
            "contacts": [
                {"@xlink:href": "local://get?uuid=b"},
                {"xlink:href": "local://get?uuid=a"},
                {"xlink:href": "https://elsewhere.org/a"}
            ],
            "a/b": {"xlink:href": "local://get?uuid=a"}
        }});

        let first = extract_references(&content);
        let second = extract_references(&content);
        assert_eq!(first, second);

        let targets: Vec<_> = first.iter().map(|l| l.target_uuid.as_str()).collect();
        assert_eq!(targets, vec!["a", "a", "b"]);
        assert!(first.iter().any(|l| l.location == "/root/a~1b"));
        assert!(first.iter().any(|l| l.location == "/root/contacts/0"));
    }

    #[test]
    fn test_no_references() {
        assert!(extract_references(&json!({"root": {"title": "plain"}})).is_empty());
    }

    #[test]
    fn test_expand_substitutes_inline() {
        let contact = json!({"CI_ResponsibleParty": {"individualName": "babar"}});
        let expansion = expand(&vicinity_map("c1"), |uuid| {
            assert_eq!(uuid, "c1");
            Ok(contact.clone())
        });

        assert!(expansion.unresolved.is_empty());
        let poc = &expansion.content["MD_Metadata"]["identificationInfo"]["MD_DataIdentification"]["pointOfContact"];
        assert_eq!(poc["CI_ResponsibleParty"]["individualName"], "babar");
        assert_eq!(poc["xlink:href"], "local://xml.metadata.get?uuid=c1");
    }

    #[test]
    fn test_expand_skips_unresolved() {
        let original = vicinity_map("missing");
        let expansion = expand(&original, |uuid| Err(ReferenceError::unresolved(uuid, "gone")));

        assert_eq!(expansion.content, original);
        assert_eq!(expansion.unresolved.len(), 1);
        assert_eq!(expansion.unresolved[0].code(), "METACAT_REFERENCE_UNRESOLVED");
    }
}
