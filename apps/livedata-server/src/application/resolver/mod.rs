//! Distribution Specification Resolution
//!
//! The pipeline that turns a client's abstract [`LiveDataSpecification`]
//! into a concrete [`DistributionSpecification`]: which canonical
//! identifier to subscribe with, which normalization rules to apply, which
//! topic to publish on.
//!
//! An unresolvable but well-formed request yields `None`, never an error —
//! unknown rule sets are a normal outcome (they may be registered later),
//! and batch resolution resolves every entry it can even when others fail.

mod caching;
mod default;
mod fixed;
mod id_resolver;
mod rule_resolver;
mod topic_resolver;

pub use caching::CachingDistributionSpecResolver;
pub use default::DefaultDistributionSpecResolver;
pub use fixed::{FixedDistributionSpecResolver, NaiveDistributionSpecResolver};
pub use id_resolver::{IdResolver, SchemePriorityIdResolver};
pub use rule_resolver::{NormalizationRuleResolver, StandardRuleResolver};
pub use topic_resolver::{PrefixTopicNameResolver, TopicNameRequest, TopicNameResolver};

use crate::domain::specification::{DistributionSpecification, LiveDataSpecification};

/// Resolves client requests into distribution targets.
///
/// The batch form must be semantically equivalent to calling the single
/// form per element; it exists purely so implementations backed by remote
/// services can collapse lookups.
pub trait DistributionSpecResolver: Send + Sync {
    /// Resolve one specification, or `None` if it cannot be mapped.
    fn resolve(&self, spec: &LiveDataSpecification) -> Option<DistributionSpecification>;

    /// Resolve a batch, preserving input order.
    fn resolve_batch(
        &self,
        specs: &[LiveDataSpecification],
    ) -> Vec<(LiveDataSpecification, Option<DistributionSpecification>)> {
        specs
            .iter()
            .map(|spec| (spec.clone(), self.resolve(spec)))
            .collect()
    }
}
