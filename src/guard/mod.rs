//! Deletion guard
//!
//! Decides whether a record may be deleted while other records still
//! point at it.
//!
//! The check reads the committed reference graph at call time. A
//! referencing record inserted between this check and the delete itself
//! is not seen; callers needing a stronger guarantee must serialize
//! those writes themselves.

use std::sync::Arc;

use serde::Serialize;

use crate::config::Settings;
use crate::record::RecordId;
use crate::xlink::{ReferenceResolver, ReferenceResult};

/// Outcome of a deletion check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum DeletionVerdict {
    Allowed,
    Forbidden { referencing_count: usize },
}

impl DeletionVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, DeletionVerdict::Allowed)
    }
}

/// Policy check run before every delete
pub struct DeletionGuard {
    resolver: Arc<ReferenceResolver>,
    settings: Arc<Settings>,
}

impl DeletionGuard {
    pub fn new(resolver: Arc<ReferenceResolver>, settings: Arc<Settings>) -> Self {
        Self { resolver, settings }
    }

    /// May the record `target_uuid` be deleted right now?
    ///
    /// `target_id`, when known, is ignored among the referrers so a
    /// record pointing at itself does not block its own deletion.
    pub fn can_delete(
        &self,
        target_uuid: &str,
        target_id: Option<RecordId>,
    ) -> ReferenceResult<DeletionVerdict> {
        if self.settings.allow_referenced_deletion() {
            return Ok(DeletionVerdict::Allowed);
        }

        let mut referrers = self.resolver.reverse_references(target_uuid)?;
        if let Some(id) = target_id {
            referrers.remove(&id);
        }

        if referrers.is_empty() {
            Ok(DeletionVerdict::Allowed)
        } else {
            Ok(DeletionVerdict::Forbidden {
                referencing_count: referrers.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordStore;
    use crate::xlink::XLink;
    use std::collections::BTreeSet;

    fn setup() -> (Arc<ReferenceResolver>, Arc<Settings>, DeletionGuard) {
        let resolver = Arc::new(ReferenceResolver::new(Arc::new(RecordStore::new())));
        let settings = Arc::new(Settings::default());
        let guard = DeletionGuard::new(Arc::clone(&resolver), Arc::clone(&settings));
        (resolver, settings, guard)
    }

    fn link_to(target: &str) -> BTreeSet<XLink> {
        let mut links = BTreeSet::new();
        links.insert(XLink {
            target_uuid: target.to_string(),
            location: "/root/contact".to_string(),
        });
        links
    }

    #[test]
    fn test_unreferenced_is_allowed() {
        let (_, _, guard) = setup();
        assert_eq!(guard.can_delete("lonely", None).unwrap(), DeletionVerdict::Allowed);
    }

    #[test]
    fn test_referenced_is_forbidden_by_default() {
        let (resolver, _, guard) = setup();
        resolver.graph().set_references(RecordId(1), link_to("contact")).unwrap();
        resolver.graph().set_references(RecordId(2), link_to("contact")).unwrap();

        let verdict = guard.can_delete("contact", Some(RecordId(3))).unwrap();
        assert_eq!(verdict, DeletionVerdict::Forbidden { referencing_count: 2 });
        assert!(!verdict.is_allowed());
    }

    #[test]
    fn test_policy_allows_referenced_deletion() {
        let (resolver, settings, guard) = setup();
        resolver.graph().set_references(RecordId(1), link_to("contact")).unwrap();
        settings.set_allow_referenced_deletion(true);

        assert!(guard.can_delete("contact", None).unwrap().is_allowed());
    }

    #[test]
    fn test_self_reference_does_not_block() {
        let (resolver, _, guard) = setup();
        resolver.graph().set_references(RecordId(7), link_to("me")).unwrap();

        assert!(guard.can_delete("me", Some(RecordId(7))).unwrap().is_allowed());
        assert!(!guard.can_delete("me", None).unwrap().is_allowed());
    }
}
