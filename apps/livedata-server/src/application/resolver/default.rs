//! Default Resolver
//!
//! Composes the three lookup services: rule set first (bailing out to
//! `None` for that entry when the id is unknown), then the canonical
//! identifier, then the topic.

use std::sync::Arc;

use super::{
    DistributionSpecResolver, IdResolver, NormalizationRuleResolver, TopicNameRequest,
    TopicNameResolver,
};
use crate::domain::specification::{DistributionSpecification, LiveDataSpecification};

/// The standard three-stage resolver.
pub struct DefaultDistributionSpecResolver {
    id_resolver: Arc<dyn IdResolver>,
    rule_resolver: Arc<dyn NormalizationRuleResolver>,
    topic_resolver: Arc<dyn TopicNameResolver>,
}

impl DefaultDistributionSpecResolver {
    /// Create a resolver from its three stages.
    #[must_use]
    pub fn new(
        id_resolver: Arc<dyn IdResolver>,
        rule_resolver: Arc<dyn NormalizationRuleResolver>,
        topic_resolver: Arc<dyn TopicNameResolver>,
    ) -> Self {
        Self {
            id_resolver,
            rule_resolver,
            topic_resolver,
        }
    }
}

impl DistributionSpecResolver for DefaultDistributionSpecResolver {
    fn resolve(&self, spec: &LiveDataSpecification) -> Option<DistributionSpecification> {
        // Rule set first: an unknown rule set short-circuits without
        // touching the id or topic resolvers.
        let rule_set = self
            .rule_resolver
            .resolve(spec.normalization_rule_set_id())?;
        let preferred_id = self.id_resolver.resolve(spec.identifiers())?;
        let topic = self.topic_resolver.resolve(&TopicNameRequest {
            id: preferred_id.clone(),
            rule_set: Arc::clone(&rule_set),
        })?;

        Some(DistributionSpecification::new(preferred_id, rule_set, topic))
    }

    fn resolve_batch(
        &self,
        specs: &[LiveDataSpecification],
    ) -> Vec<(LiveDataSpecification, Option<DistributionSpecification>)> {
        // Stage 1: rule sets. Entries with unknown rule sets stay in the
        // output as `None` but are excluded from the later stages.
        let rule_sets: Vec<_> = specs
            .iter()
            .map(|spec| self.rule_resolver.resolve(spec.normalization_rule_set_id()))
            .collect();

        // Stage 2: batch id resolution for the surviving entries.
        let bundles: Vec<_> = specs
            .iter()
            .zip(&rule_sets)
            .filter(|(_, rs)| rs.is_some())
            .map(|(spec, _)| spec.identifiers().clone())
            .collect();
        let mut resolved_ids = self.id_resolver.resolve_batch(&bundles).into_iter();

        specs
            .iter()
            .zip(rule_sets)
            .map(|(spec, rule_set)| {
                let result = rule_set.and_then(|rule_set| {
                    let (_, preferred_id) = resolved_ids
                        .next()
                        .unwrap_or_else(|| (spec.identifiers().clone(), None));
                    let preferred_id = preferred_id?;
                    let topic = self.topic_resolver.resolve(&TopicNameRequest {
                        id: preferred_id.clone(),
                        rule_set: Arc::clone(&rule_set),
                    })?;
                    Some(DistributionSpecification::new(preferred_id, rule_set, topic))
                });
                (spec.clone(), result)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::resolver::{
        PrefixTopicNameResolver, SchemePriorityIdResolver, StandardRuleResolver,
    };
    use crate::domain::ids::ExternalIdBundle;
    use crate::domain::normalization::NormalizationRuleSet;

    fn resolver() -> DefaultDistributionSpecResolver {
        let rules = StandardRuleResolver::new();
        rules.register(Arc::new(NormalizationRuleSet::new("rule1", Vec::new())));
        rules.register(Arc::new(NormalizationRuleSet::new("rule2", Vec::new())));

        DefaultDistributionSpecResolver::new(
            Arc::new(SchemePriorityIdResolver::single_scheme("TICKER")),
            Arc::new(rules),
            Arc::new(PrefixTopicNameResolver::new("livedata")),
        )
    }

    #[test]
    fn resolves_known_rule_set_and_scheme() {
        let resolver = resolver();
        let spec = LiveDataSpecification::new("rule1", ExternalIdBundle::of("TICKER", "AAPL"));

        let resolved = resolver.resolve(&spec).unwrap();
        assert_eq!(resolved.preferred_id().value(), "AAPL");
        assert_eq!(resolved.rule_set().id(), "rule1");
        assert_eq!(resolved.topic(), "livedata.AAPL.rule1");
    }

    #[test]
    fn unknown_rule_set_yields_none() {
        let resolver = resolver();
        let spec = LiveDataSpecification::new("rule3", ExternalIdBundle::of("TICKER", "AAPL"));

        assert!(resolver.resolve(&spec).is_none());
    }

    #[test]
    fn unsupported_scheme_yields_none() {
        let resolver = resolver();
        let spec = LiveDataSpecification::new("rule1", ExternalIdBundle::of("ISIN", "US0378331005"));

        assert!(resolver.resolve(&spec).is_none());
    }

    #[test]
    fn resolve_is_deterministic() {
        let resolver = resolver();
        let spec = LiveDataSpecification::new("rule1", ExternalIdBundle::of("TICKER", "AAPL"));

        let first = resolver.resolve(&spec).unwrap();
        let second = resolver.resolve(&spec).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn batch_resolves_mixed_entries() {
        let resolver = resolver();
        let specs = vec![
            LiveDataSpecification::new("rule1", ExternalIdBundle::of("TICKER", "eid1")),
            LiveDataSpecification::new("rule2", ExternalIdBundle::of("TICKER", "eid2")),
            LiveDataSpecification::new("rule3", ExternalIdBundle::of("TICKER", "eid3")),
        ];

        let results = resolver.resolve_batch(&specs);
        assert_eq!(results.len(), 3);

        let r1 = results[0].1.as_ref().unwrap();
        assert_eq!(r1.topic(), "livedata.eid1.rule1");
        let r2 = results[1].1.as_ref().unwrap();
        assert_eq!(r2.topic(), "livedata.eid2.rule2");
        assert!(results[2].1.is_none());
    }

    #[test]
    fn batch_matches_element_wise_single_resolution() {
        let resolver = resolver();
        let specs = vec![
            LiveDataSpecification::new("rule1", ExternalIdBundle::of("TICKER", "AAPL")),
            LiveDataSpecification::new("bogus", ExternalIdBundle::of("TICKER", "MSFT")),
            LiveDataSpecification::new("rule2", ExternalIdBundle::of("ISIN", "US0378331005")),
        ];

        let batch = resolver.resolve_batch(&specs);
        for (spec, result) in batch {
            assert_eq!(result, resolver.resolve(&spec));
        }
    }
}
