//! In-memory search index
//!
//! Derived state: every document here is a projection of a stored
//! record, and the whole index can be rebuilt from the store.
//!
//! # Invariants
//!
//! - At most one document per uuid
//! - Postings mirror exactly the fields of the documents held
//! - Result order is deterministic (score, popularity, uuid)

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use super::document::IndexDocument;
use super::postings::Postings;
use super::query::{normalize_term, Query};

/// One ranked search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub uuid: String,
    /// Number of matched clauses
    pub score: u32,
    pub fields: BTreeMap<String, BTreeSet<String>>,
}

/// Inverted index over `IndexDocument`s
#[derive(Debug, Default)]
pub struct SearchIndex {
    documents: HashMap<String, IndexDocument>,
    fields: HashMap<String, Postings>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the document for `doc.uuid`
    pub fn apply_write(&mut self, doc: IndexDocument) {
        if let Some(old) = self.documents.remove(&doc.uuid) {
            self.unpost(&old);
        }
        for (field, values) in &doc.fields {
            let postings = self.fields.entry(field.clone()).or_default();
            for value in values {
                postings.insert(value, &doc.uuid);
            }
        }
        self.documents.insert(doc.uuid.clone(), doc);
    }

    /// Remove the document for `uuid`; returns whether one was present
    pub fn apply_delete(&mut self, uuid: &str) -> bool {
        match self.documents.remove(uuid) {
            Some(old) => {
                self.unpost(&old);
                true
            }
            None => false,
        }
    }

    fn unpost(&mut self, doc: &IndexDocument) {
        for (field, values) in &doc.fields {
            if let Some(postings) = self.fields.get_mut(field) {
                for value in values {
                    postings.remove(value, &doc.uuid);
                }
                if postings.is_empty() {
                    self.fields.remove(field);
                }
            }
        }
    }

    pub fn get(&self, uuid: &str) -> Option<&IndexDocument> {
        self.documents.get(uuid)
    }

    pub fn contains(&self, uuid: &str) -> bool {
        self.documents.contains_key(uuid)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn clear(&mut self) {
        self.documents.clear();
        self.fields.clear();
    }

    /// Ranked documents matching `query`
    pub fn search(&self, query: &Query) -> Vec<SearchHit> {
        let mut hits: Vec<(&IndexDocument, u32)> = self
            .evaluate(query)
            .into_iter()
            .filter_map(|(uuid, score)| self.documents.get(uuid).map(|doc| (doc, score)))
            .collect();

        hits.sort_by(|(a, sa), (b, sb)| {
            sb.cmp(sa)
                .then_with(|| b.popularity.cmp(&a.popularity))
                .then_with(|| a.uuid.cmp(&b.uuid))
        });

        hits.into_iter()
            .map(|(doc, score)| SearchHit {
                uuid: doc.uuid.clone(),
                score,
                fields: doc.fields.clone(),
            })
            .collect()
    }

    /// Matching uuids with their matched clause count
    fn evaluate<'a>(&'a self, query: &Query) -> BTreeMap<&'a str, u32> {
        match query {
            Query::All => self.documents.keys().map(|uuid| (uuid.as_str(), 1)).collect(),
            Query::Term { field, value } => {
                let terms = normalize_term(field, value);
                let Some((first, rest)) = terms.split_first() else {
                    return BTreeMap::new();
                };
                let Some(postings) = self.fields.get(field) else {
                    return BTreeMap::new();
                };
                postings
                    .lookup(first)
                    .iter()
                    .filter(|uuid| {
                        rest.iter()
                            .all(|term| postings.lookup(term).binary_search(*uuid).is_ok())
                    })
                    .map(|uuid| (uuid.as_str(), 1))
                    .collect()
            }
            Query::Bool {
                must,
                should,
                must_not,
            } => {
                let mut required: Option<BTreeMap<&'a str, u32>> = None;
                for clause in must {
                    let matched = self.evaluate(clause);
                    required = Some(match required {
                        None => matched,
                        Some(acc) => acc
                            .into_iter()
                            .filter_map(|(uuid, score)| {
                                matched.get(uuid).map(|extra| (uuid, score + extra))
                            })
                            .collect(),
                    });
                }

                let optional: Vec<BTreeMap<&'a str, u32>> =
                    should.iter().map(|clause| self.evaluate(clause)).collect();

                let mut result = match required {
                    Some(required) => required,
                    None if !optional.is_empty() => optional
                        .iter()
                        .flat_map(|matched| matched.keys().map(|uuid| (*uuid, 0)))
                        .collect(),
                    None => self.documents.keys().map(|uuid| (uuid.as_str(), 0)).collect(),
                };

                for matched in &optional {
                    for (uuid, score) in matched {
                        if let Some(total) = result.get_mut(uuid) {
                            *total += score;
                        }
                    }
                }

                for clause in must_not {
                    for uuid in self.evaluate(clause).keys() {
                        result.remove(uuid);
                    }
                }

                result
            }
        }
    }
}
