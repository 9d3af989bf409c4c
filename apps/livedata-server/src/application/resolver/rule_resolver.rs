//! Normalization Rule Resolution
//!
//! Looks rule sets up by id. An unknown id is a normal outcome, not an
//! error: rule sets may be registered after the first request referencing
//! them arrives.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::normalization::NormalizationRuleSet;

/// Resolves normalization rule-set ids.
pub trait NormalizationRuleResolver: Send + Sync {
    /// Look up a rule set, or `None` when the id is unknown.
    fn resolve(&self, rule_set_id: &str) -> Option<Arc<NormalizationRuleSet>>;
}

/// In-memory rule-set registry.
///
/// Pre-seeded with the shared "no normalization" set; further sets are
/// added with [`Self::register`].
#[derive(Debug)]
pub struct StandardRuleResolver {
    sets: RwLock<HashMap<String, Arc<NormalizationRuleSet>>>,
}

impl StandardRuleResolver {
    /// Create a registry holding only the "no normalization" set.
    #[must_use]
    pub fn new() -> Self {
        let raw = NormalizationRuleSet::no_normalization();
        let mut sets = HashMap::new();
        sets.insert(raw.id().to_string(), raw);
        Self {
            sets: RwLock::new(sets),
        }
    }

    /// Register a rule set under its own id, replacing any previous set
    /// with the same id.
    pub fn register(&self, rule_set: Arc<NormalizationRuleSet>) {
        self.sets
            .write()
            .insert(rule_set.id().to_string(), rule_set);
    }

    /// Number of registered rule sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.read().len()
    }

    /// Check whether any rule sets are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.read().is_empty()
    }
}

impl Default for StandardRuleResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalizationRuleResolver for StandardRuleResolver {
    fn resolve(&self, rule_set_id: &str) -> Option<Arc<NormalizationRuleSet>> {
        self.sets.read().get(rule_set_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalization::{FieldFilter, NO_NORMALIZATION_ID};

    #[test]
    fn resolves_preseeded_raw_set() {
        let resolver = StandardRuleResolver::new();
        let raw = resolver.resolve(NO_NORMALIZATION_ID).unwrap();
        assert_eq!(raw.rule_count(), 0);
    }

    #[test]
    fn unknown_id_yields_none() {
        let resolver = StandardRuleResolver::new();
        assert!(resolver.resolve("nonexistent").is_none());
    }

    #[test]
    fn register_makes_set_resolvable() {
        let resolver = StandardRuleResolver::new();
        assert!(resolver.resolve("std").is_none());

        resolver.register(Arc::new(NormalizationRuleSet::new(
            "std",
            vec![Box::new(FieldFilter::new(["BID", "ASK"]))],
        )));

        let resolved = resolver.resolve("std").unwrap();
        assert_eq!(resolved.id(), "std");
        assert_eq!(resolved.rule_count(), 1);
    }

    #[test]
    fn register_replaces_same_id() {
        let resolver = StandardRuleResolver::new();
        resolver.register(Arc::new(NormalizationRuleSet::new("std", Vec::new())));
        resolver.register(Arc::new(NormalizationRuleSet::new(
            "std",
            vec![Box::new(FieldFilter::new(["BID"]))],
        )));

        assert_eq!(resolver.resolve("std").unwrap().rule_count(), 1);
        assert_eq!(resolver.len(), 2); // raw + std
    }
}
