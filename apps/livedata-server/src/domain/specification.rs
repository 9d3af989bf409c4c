//! Live Data Specifications
//!
//! [`LiveDataSpecification`] is the client-facing request key: which
//! instrument, normalized how. [`DistributionSpecification`] is the fully
//! resolved target the server distributes on: one canonical identifier, one
//! rule set, one topic.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::ids::{ExternalId, ExternalIdBundle};
use crate::domain::normalization::NormalizationRuleSet;

// =============================================================================
// LiveDataSpecification
// =============================================================================

/// A client's abstract request for a market-data item.
///
/// Immutable; equality and hashing derive from the rule-set id and the
/// identifier bundle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LiveDataSpecification {
    normalization_rule_set_id: String,
    identifiers: ExternalIdBundle,
}

impl LiveDataSpecification {
    /// Create a specification.
    #[must_use]
    pub fn new(rule_set_id: impl Into<String>, identifiers: ExternalIdBundle) -> Self {
        Self {
            normalization_rule_set_id: rule_set_id.into(),
            identifiers,
        }
    }

    /// Get the requested normalization rule-set id.
    #[must_use]
    pub fn normalization_rule_set_id(&self) -> &str {
        &self.normalization_rule_set_id
    }

    /// Get the identifier bundle.
    #[must_use]
    pub const fn identifiers(&self) -> &ExternalIdBundle {
        &self.identifiers
    }
}

impl fmt::Display for LiveDataSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.normalization_rule_set_id, self.identifiers
        )
    }
}

// =============================================================================
// DistributionSpecification
// =============================================================================

/// A fully resolved distribution target.
///
/// Produced once per distinct [`LiveDataSpecification`] by the resolver
/// pipeline; immutable; handed to the upstream provider and used as the
/// resolver-cache value.
#[derive(Debug, Clone)]
pub struct DistributionSpecification {
    preferred_id: ExternalId,
    rule_set: Arc<NormalizationRuleSet>,
    topic: String,
}

impl DistributionSpecification {
    /// Create a distribution specification.
    #[must_use]
    pub fn new(
        preferred_id: ExternalId,
        rule_set: Arc<NormalizationRuleSet>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            preferred_id,
            rule_set,
            topic: topic.into(),
        }
    }

    /// The canonical identifier the provider is subscribed with.
    #[must_use]
    pub const fn preferred_id(&self) -> &ExternalId {
        &self.preferred_id
    }

    /// The normalization rule set applied before publication.
    #[must_use]
    pub fn rule_set(&self) -> &Arc<NormalizationRuleSet> {
        &self.rule_set
    }

    /// The topic updates are published on.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl PartialEq for DistributionSpecification {
    fn eq(&self, other: &Self) -> bool {
        self.preferred_id == other.preferred_id
            && self.rule_set.id() == other.rule_set.id()
            && self.topic == other.topic
    }
}

impl Eq for DistributionSpecification {}

impl fmt::Display for DistributionSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({})",
            self.preferred_id,
            self.topic,
            self.rule_set.id()
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
