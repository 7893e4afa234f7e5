//! Reference resolution tables
//!
//! Legacy rows point at each other by member name, group name, and a
//! sheet-local feed id. The resolver translates those into backend keys.
//! Each table is filled by exactly one stage (provisioning, group preload,
//! feed migration) and only read afterwards.

use common::{FeedKey, GroupKey, IdentityKey};
use std::collections::HashMap;

use crate::backend::Group;

#[derive(Debug, Default, Clone)]
pub struct ReferenceResolver {
    members: HashMap<String, IdentityKey>,
    groups: HashMap<String, GroupKey>,
    feeds: HashMap<String, FeedKey>,
}

impl ReferenceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_member(&mut self, name: impl Into<String>, key: IdentityKey) {
        self.members.insert(name.into(), key);
    }

    /// Load pre-existing groups by name
    pub fn register_groups(&mut self, groups: impl IntoIterator<Item = Group>) {
        for group in groups {
            self.groups.insert(group.name, group.id);
        }
    }

    pub fn register_feed(&mut self, legacy_id: impl Into<String>, key: FeedKey) {
        self.feeds.insert(legacy_id.into(), key);
    }

    pub fn member(&self, name: &str) -> Option<IdentityKey> {
        self.members.get(name).copied()
    }

    pub fn group(&self, name: &str) -> Option<GroupKey> {
        self.groups.get(name).copied()
    }

    pub fn feed(&self, legacy_id: &str) -> Option<FeedKey> {
        self.feeds.get(legacy_id).copied()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn feed_count(&self) -> usize {
        self.feeds.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_references_resolve_to_none() {
        let resolver = ReferenceResolver::new();
        assert_eq!(resolver.member("ghost"), None);
        assert_eq!(resolver.group("ghost-group"), None);
        assert_eq!(resolver.feed("404"), None);
    }

    #[test]
    fn test_tables_are_independent() {
        let mut resolver = ReferenceResolver::new();
        let member = IdentityKey::new();
        resolver.register_member("diet", member);

        assert_eq!(resolver.member("diet"), Some(member));
        assert_eq!(resolver.group("diet"), None);
    }

    #[test]
    fn test_register_groups_by_name() {
        let mut resolver = ReferenceResolver::new();
        let diet = GroupKey::new();
        resolver.register_groups(vec![
            Group {
                id: diet,
                name: "식단".to_string(),
            },
            Group {
                id: GroupKey::new(),
                name: "reading".to_string(),
            },
        ]);

        assert_eq!(resolver.group_count(), 2);
        assert_eq!(resolver.group("식단"), Some(diet));
    }
}
