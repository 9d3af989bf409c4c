//! Live Data Server
//!
//! The subscription side of the engine: a [`LiveDataServer`] accepts client
//! specifications, resolves them, and keeps a reference-counted registry of
//! active subscriptions consistent with the upstream provider.
//!
//! Two implementations are provided: [`StandardLiveDataServer`] owns the
//! registry for one provider, and [`CombiningLiveDataServer`] fans requests
//! out across several servers by priority.

mod combining;
mod standard;
mod subscription;

pub use combining::CombiningLiveDataServer;
pub use standard::StandardLiveDataServer;
pub use subscription::{MarketDataDistributor, Subscription};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::application::ports::ProviderError;
use crate::domain::ids::ExternalId;
use crate::domain::message::FieldMessage;
use crate::domain::specification::{DistributionSpecification, LiveDataSpecification};

// =============================================================================
// Errors
// =============================================================================

/// Subscription-side failure.
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    /// The request carried an empty identifier bundle.
    #[error("specification {spec} carries an empty identifier bundle")]
    EmptyBundle {
        /// The malformed specification.
        spec: LiveDataSpecification,
    },

    /// No distribution target could be resolved for the request.
    #[error("no distribution specification resolvable for {spec}")]
    Unresolvable {
        /// The unresolvable specification.
        spec: LiveDataSpecification,
    },

    /// The server is not connected to its provider.
    #[error("server is not connected to its provider")]
    NotConnected,

    /// The provider accepted the call but returned no handle for this id.
    #[error("provider returned no subscription handle for {id}")]
    Rejected {
        /// The rejected identifier.
        id: ExternalId,
    },

    /// The upstream provider failed.
    #[error("upstream provider failure")]
    Provider(#[from] ProviderError),

    /// Snapshot data failed normalization.
    #[error("snapshot failed normalization")]
    Normalization(#[from] crate::domain::normalization::NormalizationError),
}

// =============================================================================
// Results and management types
// =============================================================================

/// Outcome of a successful subscribe: the resolved topic plus the merged
/// last-known-value view at subscription time (the initial snapshot for new
/// subscriptions).
#[derive(Debug, Clone)]
pub struct SubscriptionResult {
    /// The specification that was subscribed.
    pub specification: LiveDataSpecification,
    /// The topic updates will be published on.
    pub topic: String,
    /// Merged view at subscribe time; never logically stale when the
    /// provider requires snapshot-on-start.
    pub snapshot: FieldMessage,
}

/// Read-only management view of one active subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionInfo {
    /// Provider-side handle.
    pub security_unique_id: String,
    /// The canonical identifier subscribed upstream.
    pub preferred_id: ExternalId,
    /// Topics currently being distributed for this security.
    pub topics: Vec<String>,
    /// Total client references across all distributors.
    pub reference_count: usize,
    /// Whether any distributor is flagged persistent.
    pub persistent: bool,
    /// Subscription creation time.
    pub created_at: DateTime<Utc>,
    /// Last live tick time, if any tick arrived yet.
    pub last_tick_at: Option<DateTime<Utc>>,
}

// =============================================================================
// LiveDataServer
// =============================================================================

/// A live market-data server.
#[async_trait]
pub trait LiveDataServer: Send + Sync {
    /// Resolve a specification with this server's resolver, without
    /// touching the registry. Used for fitness checks when combining
    /// servers.
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

    /// Subscribe one specification.
    async fn subscribe(
        &self,
        spec: &LiveDataSpecification,
    ) -> Result<SubscriptionResult, SubscriptionError>;

    /// Subscribe a batch, returning one outcome per input specification.
    async fn subscribe_batch(
        &self,
        specs: &[LiveDataSpecification],
    ) -> Vec<(LiveDataSpecification, Result<SubscriptionResult, SubscriptionError>)> {
        let mut results = Vec::with_capacity(specs.len());
        for spec in specs {
            results.push((spec.clone(), self.subscribe(spec).await));
        }
        results
    }

    /// Release one client reference. Returns `true` when a reference was
    /// actually released; unsubscribing something never subscribed is a
    /// safe no-op.
    async fn unsubscribe(&self, spec: &LiveDataSpecification)
    -> Result<bool, SubscriptionError>;

    /// Fetch a normalized snapshot for a specification.
    async fn snapshot(&self, spec: &LiveDataSpecification)
    -> Result<FieldMessage, SubscriptionError>;

    /// Number of active subscriptions.
    fn subscription_count(&self) -> usize;

    /// Management view of all active subscriptions.
    fn subscription_info(&self) -> Vec<SubscriptionInfo>;
}
