//! Trivial Resolver Strategies
//!
//! A fixed lookup table and a naive passthrough, for tests and degenerate
//! deployments where the full pipeline is not wired.

use std::collections::HashMap;

use super::DistributionSpecResolver;
use crate::domain::normalization::NormalizationRuleSet;
use crate::domain::specification::{DistributionSpecification, LiveDataSpecification};

// =============================================================================
// FixedDistributionSpecResolver
// =============================================================================

/// Resolves from a fixed specification-to-target table.
#[derive(Default)]
pub struct FixedDistributionSpecResolver {
    mappings: HashMap<LiveDataSpecification, DistributionSpecification>,
}

impl FixedDistributionSpecResolver {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping.
    pub fn insert(&mut self, spec: LiveDataSpecification, target: DistributionSpecification) {
        self.mappings.insert(spec, target);
    }

    /// Builder-style mapping insert.
    #[must_use]
    pub fn with(
        mut self,
        spec: LiveDataSpecification,
        target: DistributionSpecification,
    ) -> Self {
        self.insert(spec, target);
        self
    }
}

impl DistributionSpecResolver for FixedDistributionSpecResolver {
    fn resolve(&self, spec: &LiveDataSpecification) -> Option<DistributionSpecification> {
        self.mappings.get(spec).cloned()
    }
}

// =============================================================================
// NaiveDistributionSpecResolver
// =============================================================================

/// Passthrough strategy: the first identifier in the bundle becomes the
/// preferred id, its string form becomes the topic, and no normalization is
/// applied.
#[derive(Debug, Clone, Default)]
pub struct NaiveDistributionSpecResolver;

impl NaiveDistributionSpecResolver {
    /// Create the passthrough resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DistributionSpecResolver for NaiveDistributionSpecResolver {
    fn resolve(&self, spec: &LiveDataSpecification) -> Option<DistributionSpecification> {
        let preferred = spec.identifiers().iter().next()?.clone();
        let topic = preferred.to_string();
        Some(DistributionSpecification::new(
            preferred,
            NormalizationRuleSet::no_normalization(),
            topic,
        ))
    }
}
