//! Standard Live Data Server
//!
//! Owns the subscription registry for one upstream provider. Subscribe,
//! unsubscribe and persistence-driven resubscribe for the same security are
//! serialized through a per-security async lock; distinct securities
//! proceed fully in parallel. Tick delivery takes only per-subscription
//! locks and never awaits.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use super::subscription::{MarketDataDistributor, Subscription};
use super::{LiveDataServer, SubscriptionError, SubscriptionInfo, SubscriptionResult};
use crate::application::ports::{MarketDataProvider, MarketDataSender, ProviderError};
use crate::application::resolver::DistributionSpecResolver;
use crate::domain::history::FieldHistoryStore;
use crate::domain::ids::ExternalId;
use crate::domain::message::FieldMessage;
use crate::domain::specification::{DistributionSpecification, LiveDataSpecification};
use crate::infrastructure::metrics;

/// How a subscription reference is being added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubscribeMode {
    /// A client reference: counts toward the reference total.
    Client,
    /// A persistence-driven reference: flags the distributor persistent
    /// without adding a client reference.
    Persistent,
}

/// The concrete subscription registry for one provider.
pub struct StandardLiveDataServer {
    provider: Arc<dyn MarketDataProvider>,
    resolver: Arc<dyn DistributionSpecResolver>,
    sender: Arc<dyn MarketDataSender>,
    connected: AtomicBool,
    /// Active subscriptions keyed by the canonical identifier.
    subscriptions: RwLock<HashMap<ExternalId, Arc<Subscription>>>,
    /// Provider handle to canonical identifier index for tick routing.
    by_handle: RwLock<HashMap<String, ExternalId>>,
    /// Per-security critical sections for subscribe/unsubscribe.
    security_locks: Mutex<HashMap<ExternalId, Arc<AsyncMutex<()>>>>,
}

impl StandardLiveDataServer {
    /// Create a server over a provider, resolver and sender.
    #[must_use]
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        resolver: Arc<dyn DistributionSpecResolver>,
        sender: Arc<dyn MarketDataSender>,
    ) -> Self {
        Self {
            provider,
            resolver,
            sender,
            connected: AtomicBool::new(false),
            subscriptions: RwLock::new(HashMap::new()),
            by_handle: RwLock::new(HashMap::new()),
            security_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the provider connection is up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Open the provider connection. Idempotent.
    ///
    /// On reconnection, subscriptions already in the registry are
    /// resubscribed upstream; securities the provider no longer accepts are
    /// logged and keep their stale handles until the next reconcile.
    ///
    /// # Errors
    ///
    /// Returns the provider error when the connection cannot be opened; no
    /// partial state is left behind.
    pub async fn connect(&self) -> Result<(), ProviderError> {
        if self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.provider.connect().await?;
        self.connected.store(true, Ordering::SeqCst);
        info!("Connected to market data provider");
        self.resubscribe_all().await;
        Ok(())
    }

    /// Close the provider connection. Idempotent. The registry is kept so
    /// a later reconnect can restore the active subscriptions.
    ///
    /// # Errors
    ///
    /// Returns the provider error from the disconnect call; the server is
    /// marked disconnected regardless.
    pub async fn disconnect(&self) -> Result<(), ProviderError> {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        info!("Disconnecting from market data provider");
        self.provider.disconnect().await
    }

    /// Deliver a raw provider tick into the registry.
    ///
    /// Routed by the provider handle. Each distributor normalizes the raw
    /// message with its own rule set; a failure for one distributor is
    /// logged and skipped without blocking its siblings.
    pub fn live_data_received(&self, security_unique_id: &str, raw: &FieldMessage) {
        let Some(preferred) = self.by_handle.read().get(security_unique_id).cloned() else {
            // Ticks can race an unsubscribe; not an error.
            debug!(handle = security_unique_id, "Tick for unknown security dropped");
            return;
        };
        let Some(subscription) = self.subscriptions.read().get(&preferred).cloned() else {
            return;
        };

        subscription.record_tick();
        metrics::record_tick();

        for distributor in subscription.distributors() {
            let distribution = distributor.distribution();
            let normalized = subscription
                .with_history(|history| distribution.rule_set().normalize(raw.clone(), history));

            match normalized {
                Ok(Some(message)) => {
                    subscription.merge_history(&message);
                    self.sender
                        .send(distribution, &subscription.last_known_values());
                }
                Ok(None) => {}
                Err(e) => {
                    metrics::record_normalization_failure();
                    warn!(
                        error = %e,
                        topic = distribution.topic(),
                        "Normalization failed, skipping distributor"
                    );
                }
            }
        }
    }

    /// Subscribe on behalf of the persistence manager: the resulting
    /// distributor is flagged persistent and no client reference is added.
    ///
    /// # Errors
    ///
    /// Same failure modes as a client subscribe.
    pub async fn subscribe_persistent(
        &self,
        spec: &LiveDataSpecification,
    ) -> Result<SubscriptionResult, SubscriptionError> {
        self.subscribe_inner(spec, SubscribeMode::Persistent).await
    }

    /// Flag or unflag the distributor for a specification as persistent.
    ///
    /// Demoting a distributor that has no client references releases it,
    /// and releases the upstream subscription when it was the last one.
    /// Returns `false` when no matching distributor is active.
    ///
    /// # Errors
    ///
    /// Returns a provider error when the demotion releases the upstream
    /// subscription and that release fails.
    pub async fn set_persistent(
        &self,
        spec: &LiveDataSpecification,
        persistent: bool,
    ) -> Result<bool, SubscriptionError> {
        let Some(distribution) = self.resolver.resolve(spec) else {
            return Ok(false);
        };
        let preferred = distribution.preferred_id().clone();
        let lock = self.security_lock(&preferred);
        let _guard = lock.lock().await;

        let Some(subscription) = self.subscriptions.read().get(&preferred).cloned() else {
            return Ok(false);
        };
        let Some(distributor) = subscription.distributor_for(distribution.rule_set().id()) else {
            return Ok(false);
        };

        distributor.set_persistent(persistent);
        debug!(security = %preferred, persistent, "Distributor persistence changed");

        if !persistent && distributor.reference_count() == 0 {
            subscription.detach_distributor(distribution.rule_set().id());
            self.release_if_unreferenced(&preferred, &subscription).await;
        }
        Ok(true)
    }

    /// The client specifications of all persistent distributors.
    #[must_use]
    pub fn persistent_specifications(&self) -> BTreeSet<LiveDataSpecification> {
        self.subscriptions
            .read()
            .values()
            .flat_map(|sub| sub.distributors())
            .filter(|d| d.is_persistent())
            .map(|d| d.specification().clone())
            .collect()
    }

    fn security_lock(&self, id: &ExternalId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.security_locks.lock();
        Arc::clone(locks.entry(id.clone()).or_default())
    }

    /// Resubscribe everything in the registry after a reconnect, updating
    /// provider handles in one batched call.
    async fn resubscribe_all(&self) {
        let entries: Vec<(ExternalId, Arc<Subscription>)> = self
            .subscriptions
            .read()
            .iter()
            .map(|(id, sub)| (id.clone(), Arc::clone(sub)))
            .collect();
        if entries.is_empty() {
            return;
        }

        let ids: Vec<ExternalId> = entries.iter().map(|(id, _)| id.clone()).collect();
        match self.provider.subscribe(&ids).await {
            Ok(handles) => {
                let mut by_handle = self.by_handle.write();
                by_handle.clear();
                for (id, subscription) in entries {
                    if let Some(handle) = handles.get(&id) {
                        subscription.set_security_unique_id(handle.clone());
                        by_handle.insert(handle.clone(), id);
                    } else {
                        warn!(security = %id, "Provider did not resubscribe security");
                    }
                }
                info!(count = ids.len(), "Resubscribed registry after reconnect");
            }
            Err(e) => {
                warn!(error = %e, "Resubscription after reconnect failed");
            }
        }
    }

    /// Tear the subscription down when nothing references it any more.
    /// Caller must hold the per-security lock.
    async fn release_if_unreferenced(&self, preferred: &ExternalId, subscription: &Subscription) {
        if subscription.total_references() > 0 || subscription.is_persistent() {
            return;
        }

        let handle = subscription.security_unique_id();
        self.subscriptions.write().remove(preferred);
        self.by_handle.write().remove(&handle);
        // The per-security lock entry stays in the map: a waiter already
        // holding the old Arc must keep excluding later claimants.
        metrics::set_active_subscriptions(self.subscriptions.read().len());

        // The provider owns retry policy; a failed release is logged, not
        // allowed to wedge the registry.
        if let Err(e) = self.provider.unsubscribe(&[handle]).await {
            warn!(error = %e, security = %preferred, "Upstream unsubscribe failed");
        } else {
            info!(security = %preferred, "Subscription released");
        }
    }

    async fn subscribe_inner(
        &self,
        spec: &LiveDataSpecification,
        mode: SubscribeMode,
    ) -> Result<SubscriptionResult, SubscriptionError> {
        if spec.identifiers().is_empty() {
            return Err(SubscriptionError::EmptyBundle { spec: spec.clone() });
        }
        let distribution =
            self.resolver
                .resolve(spec)
                .ok_or_else(|| SubscriptionError::Unresolvable {
                    spec: spec.clone(),
                })?;
        if !self.is_connected() {
            return Err(SubscriptionError::NotConnected);
        }

        let preferred = distribution.preferred_id().clone();
        let lock = self.security_lock(&preferred);
        let _guard = lock.lock().await;

        let existing = self.subscriptions.read().get(&preferred).cloned();
        if let Some(subscription) = existing {
            self.attach_reference(&subscription, spec, &distribution, mode);
            return Ok(SubscriptionResult {
                specification: spec.clone(),
                topic: distribution.topic().to_string(),
                snapshot: subscription.last_known_values(),
            });
        }

        // First subscriber for this security: go upstream.
        let handles = self
            .provider
            .subscribe(std::slice::from_ref(&preferred))
            .await?;
        let handle = handles
            .get(&preferred)
            .cloned()
            .ok_or_else(|| SubscriptionError::Rejected {
                id: preferred.clone(),
            })?;

        let subscription = Arc::new(Subscription::new(handle.clone(), preferred.clone()));

        if self.provider.snapshot_on_subscription_start() {
            if let Err(e) = self.seed_snapshot(&subscription, &preferred, &distribution).await {
                // Roll the upstream subscription back; no partial state.
                if let Err(undo) = self.provider.unsubscribe(&[handle]).await {
                    warn!(error = %undo, security = %preferred, "Snapshot rollback failed");
                }
                return Err(e);
            }
        }

        self.attach_reference(&subscription, spec, &distribution, mode);
        self.subscriptions
            .write()
            .insert(preferred.clone(), Arc::clone(&subscription));
        self.by_handle.write().insert(handle, preferred.clone());
        metrics::set_active_subscriptions(self.subscriptions.read().len());
        info!(security = %preferred, topic = distribution.topic(), "Subscription created");

        Ok(SubscriptionResult {
            specification: spec.clone(),
            topic: distribution.topic().to_string(),
            snapshot: subscription.last_known_values(),
        })
    }

    /// Seed a new subscription's history from a provider snapshot so the
    /// first published view is never logically stale.
    async fn seed_snapshot(
        &self,
        subscription: &Subscription,
        preferred: &ExternalId,
        distribution: &DistributionSpecification,
    ) -> Result<(), SubscriptionError> {
        let mut snapshots = self
            .provider
            .snapshot(std::slice::from_ref(preferred))
            .await?;
        if let Some(raw) = snapshots.remove(preferred) {
            match distribution
                .rule_set()
                .normalize(raw, &FieldHistoryStore::new())
            {
                Ok(Some(normalized)) => subscription.merge_history(&normalized),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        error = %e,
                        security = %preferred,
                        "Initial snapshot failed normalization"
                    );
                }
            }
        }
        Ok(())
    }

    /// Attach or reuse the distributor for the distribution's rule set.
    fn attach_reference(
        &self,
        subscription: &Subscription,
        spec: &LiveDataSpecification,
        distribution: &DistributionSpecification,
        mode: SubscribeMode,
    ) {
        let rule_set_id = distribution.rule_set().id();
        if let Some(distributor) = subscription.distributor_for(rule_set_id) {
            match mode {
                SubscribeMode::Client => distributor.increment(),
                SubscribeMode::Persistent => distributor.set_persistent(true),
            }
            return;
        }

        let initial_references = usize::from(mode == SubscribeMode::Client);
        let distributor = Arc::new(MarketDataDistributor::new(
            spec.clone(),
            distribution.clone(),
            initial_references,
        ));
        if mode == SubscribeMode::Persistent {
            distributor.set_persistent(true);
        }
        subscription.attach_distributor(distributor);
    }
}

#[async_trait]
impl LiveDataServer for StandardLiveDataServer {
    fn resolve(&self, spec: &LiveDataSpecification) -> Option<DistributionSpecification> {
        self.resolver.resolve(spec)
    }

    fn resolve_batch(
        &self,
        specs: &[LiveDataSpecification],
    ) -> Vec<(LiveDataSpecification, Option<DistributionSpecification>)> {
        self.resolver.resolve_batch(specs)
    }

    async fn subscribe(
        &self,
        spec: &LiveDataSpecification,
    ) -> Result<SubscriptionResult, SubscriptionError> {
        self.subscribe_inner(spec, SubscribeMode::Client).await
    }

    async fn unsubscribe(
        &self,
        spec: &LiveDataSpecification,
    ) -> Result<bool, SubscriptionError> {
        if spec.identifiers().is_empty() {
            return Err(SubscriptionError::EmptyBundle { spec: spec.clone() });
        }
        // Unresolvable means it can never have been subscribed here.
        let Some(distribution) = self.resolver.resolve(spec) else {
            return Ok(false);
        };

        let preferred = distribution.preferred_id().clone();
        let lock = self.security_lock(&preferred);
        let _guard = lock.lock().await;

        let Some(subscription) = self.subscriptions.read().get(&preferred).cloned() else {
            return Ok(false);
        };
        let Some(distributor) = subscription.distributor_for(distribution.rule_set().id()) else {
            return Ok(false);
        };
        if distributor.reference_count() == 0 {
            // Held open purely by its persistent flag; nothing to release.
            return Ok(false);
        }

        let remaining = distributor.decrement();
        if remaining == 0 && !distributor.is_persistent() {
            subscription.detach_distributor(distribution.rule_set().id());
        }
        self.release_if_unreferenced(&preferred, &subscription).await;
        Ok(true)
    }

    async fn snapshot(
        &self,
        spec: &LiveDataSpecification,
    ) -> Result<FieldMessage, SubscriptionError> {
        if spec.identifiers().is_empty() {
            return Err(SubscriptionError::EmptyBundle { spec: spec.clone() });
        }
        let distribution =
            self.resolver
                .resolve(spec)
                .ok_or_else(|| SubscriptionError::Unresolvable {
                    spec: spec.clone(),
                })?;
        let preferred = distribution.preferred_id().clone();

        // An active subscription already holds the freshest merged view.
        if let Some(subscription) = self.subscriptions.read().get(&preferred).cloned() {
            return Ok(subscription.last_known_values());
        }

        if !self.is_connected() {
            return Err(SubscriptionError::NotConnected);
        }
        let mut snapshots = self
            .provider
            .snapshot(std::slice::from_ref(&preferred))
            .await?;
        let raw = snapshots
            .remove(&preferred)
            .ok_or(SubscriptionError::Rejected { id: preferred })?;

        match distribution
            .rule_set()
            .normalize(raw, &FieldHistoryStore::new())?
        {
            Some(normalized) => Ok(normalized),
            None => Ok(FieldMessage::new()),
        }
    }

    fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    fn subscription_info(&self) -> Vec<SubscriptionInfo> {
        self.subscriptions
            .read()
            .values()
            .map(|sub| SubscriptionInfo {
                security_unique_id: sub.security_unique_id(),
                preferred_id: sub.preferred_id().clone(),
                topics: sub
                    .distributors()
                    .iter()
                    .map(|d| d.distribution().topic().to_string())
                    .collect(),
                reference_count: sub.total_references(),
                persistent: sub.is_persistent(),
                created_at: sub.created_at(),
                last_tick_at: sub.last_tick_at(),
            })
            .collect()
    }
}
