//! Combining Live Data Server
//!
//! Fans requests out across several [`LiveDataServer`] instances ordered by
//! priority. A specification is routed to the first server whose own
//! resolver can resolve it and is then invisible to lower-priority servers;
//! ties always break by priority order, never by iteration order. The
//! combined server exposes one aggregated management surface.

use std::sync::Arc;

use async_trait::async_trait;

use super::{LiveDataServer, SubscriptionError, SubscriptionInfo, SubscriptionResult};
use crate::domain::message::FieldMessage;
use crate::domain::specification::{DistributionSpecification, LiveDataSpecification};

/// Priority fan-out over several servers, highest priority first.
pub struct CombiningLiveDataServer {
    servers: Vec<Arc<dyn LiveDataServer>>,
}

impl CombiningLiveDataServer {
    /// Create a combining server. The slice order is the priority order.
    #[must_use]
    pub fn new(servers: Vec<Arc<dyn LiveDataServer>>) -> Self {
        Self { servers }
    }

    /// Number of constituent servers.
    #[must_use]
    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    /// Find the highest-priority server that can resolve the spec.
    fn route(&self, spec: &LiveDataSpecification) -> Option<&Arc<dyn LiveDataServer>> {
        self.servers.iter().find(|s| s.resolve(spec).is_some())
    }
}

#[async_trait]
impl LiveDataServer for CombiningLiveDataServer {
    fn resolve(&self, spec: &LiveDataSpecification) -> Option<DistributionSpecification> {
        self.servers.iter().find_map(|s| s.resolve(spec))
    }

    async fn subscribe(
        &self,
        spec: &LiveDataSpecification,
    ) -> Result<SubscriptionResult, SubscriptionError> {
        match self.route(spec) {
            Some(server) => server.subscribe(spec).await,
            None => Err(SubscriptionError::Unresolvable { spec: spec.clone() }),
        }
    }

    async fn subscribe_batch(
        &self,
        specs: &[LiveDataSpecification],
    ) -> Vec<(LiveDataSpecification, Result<SubscriptionResult, SubscriptionError>)> {
        // Partition by routing target, preserving each spec's input slot so
        // the combined result keeps input order.
        let mut results: Vec<Option<Result<SubscriptionResult, SubscriptionError>>> =
            specs.iter().map(|_| None).collect();
        let mut remaining: Vec<usize> = (0..specs.len()).collect();

        for server in &self.servers {
            if remaining.is_empty() {
                break;
            }
            let claimed: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|&i| server.resolve(&specs[i]).is_some())
                .collect();
            remaining.retain(|i| !claimed.contains(i));

            let batch: Vec<LiveDataSpecification> =
                claimed.iter().map(|&i| specs[i].clone()).collect();
            let outcomes = server.subscribe_batch(&batch).await;
            for (&slot, (_, outcome)) in claimed.iter().zip(outcomes) {
                results[slot] = Some(outcome);
            }
        }

        specs
            .iter()
            .zip(results)
            .map(|(spec, outcome)| {
                let outcome = outcome.unwrap_or_else(|| {
                    Err(SubscriptionError::Unresolvable { spec: spec.clone() })
                });
                (spec.clone(), outcome)
            })
            .collect()
    }

    async fn unsubscribe(
        &self,
        spec: &LiveDataSpecification,
    ) -> Result<bool, SubscriptionError> {
        match self.route(spec) {
            Some(server) => server.unsubscribe(spec).await,
            None => Ok(false),
        }
    }

    async fn snapshot(
        &self,
        spec: &LiveDataSpecification,
    ) -> Result<FieldMessage, SubscriptionError> {
        match self.route(spec) {
            Some(server) => server.snapshot(spec).await,
            None => Err(SubscriptionError::Unresolvable { spec: spec.clone() }),
        }
    }

    fn subscription_count(&self) -> usize {
        self.servers.iter().map(|s| s.subscription_count()).sum()
    }

    fn subscription_info(&self) -> Vec<SubscriptionInfo> {
        self.servers
            .iter()
            .flat_map(|s| s.subscription_info())
            .collect()
    }
}
