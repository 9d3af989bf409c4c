//! Topic Name Resolution
//!
//! Derives the publish topic for a resolved identifier / rule-set pair.

use std::sync::Arc;

use crate::domain::ids::ExternalId;
use crate::domain::normalization::NormalizationRuleSet;

/// A topic lookup request: the canonical identifier plus the rule set the
/// data will be normalized with.
#[derive(Debug, Clone)]
pub struct TopicNameRequest {
    /// Canonical identifier.
    pub id: ExternalId,
    /// Normalization rule set.
    pub rule_set: Arc<NormalizationRuleSet>,
}

/// Resolves topic names for distribution targets.
pub trait TopicNameResolver: Send + Sync {
    /// Derive the topic, or `None` when no topic can be assigned.
    fn resolve(&self, request: &TopicNameRequest) -> Option<String>;

    /// Resolve a batch, preserving input order. The result covers exactly
    /// the input requests.
    fn resolve_batch(&self, requests: &[TopicNameRequest]) -> Vec<Option<String>> {
        requests.iter().map(|r| self.resolve(r)).collect()
    }
}

/// Builds `prefix.identifier.ruleset` topics.
#[derive(Debug, Clone)]
pub struct PrefixTopicNameResolver {
    prefix: String,
}

impl PrefixTopicNameResolver {
    /// Create a resolver with the given topic prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl TopicNameResolver for PrefixTopicNameResolver {
    fn resolve(&self, request: &TopicNameRequest) -> Option<String> {
        Some(format!(
            "{}.{}.{}",
            self.prefix,
            request.id.value(),
            request.rule_set.id()
        ))
    }
}
