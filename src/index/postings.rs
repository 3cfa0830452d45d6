//! BTreeMap-based posting lists
//!
//! One `Postings` per indexed field maps each term to the uuids of the
//! documents carrying it. Uuid lists are always sorted ascending, so
//! every lookup is deterministic.

use std::collections::BTreeMap;

/// Term → sorted document uuids for a single field
#[derive(Debug, Default, Clone)]
pub struct Postings {
    tree: BTreeMap<String, Vec<String>>,
}

impl Postings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `uuid` carries `term`.
    pub fn insert(&mut self, term: &str, uuid: &str) {
        let uuids = self.tree.entry(term.to_string()).or_default();
        if let Err(pos) = uuids.binary_search_by(|u| u.as_str().cmp(uuid)) {
            uuids.insert(pos, uuid.to_string());
        }
    }

    /// Forget that `uuid` carries `term`; drops the term once unused.
    pub fn remove(&mut self, term: &str, uuid: &str) {
        if let Some(uuids) = self.tree.get_mut(term) {
            if let Ok(pos) = uuids.binary_search_by(|u| u.as_str().cmp(uuid)) {
                uuids.remove(pos);
            }
            if uuids.is_empty() {
                self.tree.remove(term);
            }
        }
    }

    /// Documents carrying `term`, sorted ascending
    pub fn lookup(&self, term: &str) -> &[String] {
        self.tree.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct terms
    pub fn term_count(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_and_deduplicated() {
        let mut postings = Postings::new();
        postings.insert("babar", "c");
        postings.insert("babar", "a");
        postings.insert("babar", "b");
        postings.insert("babar", "a");

        assert_eq!(postings.lookup("babar"), ["a", "b", "c"]);
        assert_eq!(postings.term_count(), 1);
    }

    #[test]
    fn test_remove_drops_empty_terms() {
        let mut postings = Postings::new();
        postings.insert("momo", "x");
        postings.remove("momo", "x");
        postings.remove("momo", "x");

        assert!(postings.lookup("momo").is_empty());
        assert!(postings.is_empty());
    }

    #[test]
    fn test_missing_term() {
        let postings = Postings::new();
        assert!(postings.lookup("anything").is_empty());
    }
}
