//! Search queries
//!
//! A small boolean query model: exact terms combined with
//! must / should / must_not clauses.

use serde::{Deserialize, Serialize};

use super::document::{tokenize, FIELD_ANY};

/// A search query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Query {
    /// Every indexed document
    All,
    /// Documents whose `field` carries `value`
    Term { field: String, value: String },
    /// Boolean combination.
    ///
    /// With no `must` clause, at least one `should` clause has to match;
    /// with neither, every document not excluded by `must_not` matches.
    Bool {
        #[serde(default)]
        must: Vec<Query>,
        #[serde(default)]
        should: Vec<Query>,
        #[serde(default)]
        must_not: Vec<Query>,
    },
}

impl Query {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Full-text term against the `any` field
    pub fn any(value: impl Into<String>) -> Self {
        Query::term(FIELD_ANY, value)
    }

    /// Empty boolean query
    pub fn boolean() -> Self {
        Query::Bool {
            must: Vec::new(),
            should: Vec::new(),
            must_not: Vec::new(),
        }
    }

    /// Add a required clause; turns a non-boolean query into one
    pub fn must(self, clause: Query) -> Self {
        let (mut must, should, must_not) = self.into_clauses();
        must.push(clause);
        Query::Bool {
            must,
            should,
            must_not,
        }
    }

    pub fn should(self, clause: Query) -> Self {
        let (must, mut should, must_not) = self.into_clauses();
        should.push(clause);
        Query::Bool {
            must,
            should,
            must_not,
        }
    }

    pub fn must_not(self, clause: Query) -> Self {
        let (must, should, mut must_not) = self.into_clauses();
        must_not.push(clause);
        Query::Bool {
            must,
            should,
            must_not,
        }
    }

    fn into_clauses(self) -> (Vec<Query>, Vec<Query>, Vec<Query>) {
        match self {
            Query::Bool {
                must,
                should,
                must_not,
            } => (must, should, must_not),
            other => (vec![other], Vec::new(), Vec::new()),
        }
    }
}

/// Index terms a `Term` query on `field` must all match.
///
/// `any` values are tokenized like indexed text, so `"Vicinity Map"`
/// needs both `vicinity` and `map`. Other fields match verbatim.
pub(crate) fn normalize_term(field: &str, value: &str) -> Vec<String> {
    if field == FIELD_ANY {
        tokenize(value).collect()
    } else {
        vec![value.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let query = Query::boolean()
            .must(Query::any("momo"))
            .must_not(Query::term("_isTemplate", "s"));

        assert_eq!(
            query,
            Query::Bool {
                must: vec![Query::term("any", "momo")],
                should: vec![],
                must_not: vec![Query::term("_isTemplate", "s")],
            }
        );
    }

    #[test]
    fn test_builder_wraps_plain_query() {
        let query = Query::All.must_not(Query::any("x"));
        match query {
            Query::Bool { must, must_not, .. } => {
                assert_eq!(must, vec![Query::All]);
                assert_eq!(must_not.len(), 1);
            }
            _ => panic!("expected a boolean query"),
        }
    }

    #[test]
    fn test_deserialize() {
        let query: Query = serde_json::from_value(json!({
            "type": "bool",
            "must": [{"type": "term", "field": "any", "value": "momo"}],
            "must_not": [{"type": "term", "field": "_isTemplate", "value": "s"}]
        }))
        .unwrap();

        assert_eq!(
            query,
            Query::boolean()
                .must(Query::any("momo"))
                .must_not(Query::term("_isTemplate", "s"))
        );
    }

    #[test]
    fn test_normalize_term() {
        assert_eq!(normalize_term("any", " MoMo "), vec!["momo"]);
        assert_eq!(normalize_term("any", "Vicinity Map"), vec!["vicinity", "map"]);
        assert!(normalize_term("any", " -- ").is_empty());
        assert_eq!(normalize_term("_isTemplate", "S"), vec!["S"]);
    }
}
