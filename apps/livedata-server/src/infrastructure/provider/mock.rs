//! Mock market data provider for testing and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{MarketDataProvider, ProviderError};
use crate::domain::ids::ExternalId;
use crate::domain::message::FieldMessage;

/// Scriptable, call-recording provider.
///
/// Accepts every identifier in its scheme, minting `uid-{value}` handles.
/// Snapshot fixtures and failure injection make registry edge cases easy to
/// drive from tests. Not for production use.
pub struct MockMarketDataProvider {
    scheme: String,
    snapshot_on_start: bool,
    connected: AtomicBool,
    fail_subscribes: AtomicBool,
    fail_snapshots: AtomicBool,
    snapshots: RwLock<HashMap<ExternalId, FieldMessage>>,
    subscribe_calls: RwLock<Vec<Vec<ExternalId>>>,
    unsubscribe_calls: RwLock<Vec<Vec<String>>>,
}

impl MockMarketDataProvider {
    /// Create a provider subscribing in the given scheme.
    #[must_use]
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            snapshot_on_start: false,
            connected: AtomicBool::new(false),
            fail_subscribes: AtomicBool::new(false),
            fail_snapshots: AtomicBool::new(false),
            snapshots: RwLock::new(HashMap::new()),
            subscribe_calls: RwLock::new(Vec::new()),
            unsubscribe_calls: RwLock::new(Vec::new()),
        }
    }

    /// Declare the snapshot-on-subscription-start capability.
    #[must_use]
    pub const fn with_snapshot_on_start(mut self, required: bool) -> Self {
        self.snapshot_on_start = required;
        self
    }

    /// The handle this provider mints for an identifier.
    #[must_use]
    pub fn handle_for(id: &ExternalId) -> String {
        format!("uid-{}", id.value())
    }

    /// Install a snapshot fixture for an identifier.
    pub fn set_snapshot(&self, id: ExternalId, snapshot: FieldMessage) {
        self.snapshots.write().insert(id, snapshot);
    }

    /// Make subsequent subscribe calls fail.
    pub fn fail_subscribes(&self, fail: bool) {
        self.fail_subscribes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent snapshot calls fail.
    pub fn fail_snapshots(&self, fail: bool) {
        self.fail_snapshots.store(fail, Ordering::SeqCst);
    }

    /// Whether the provider believes it is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// All subscribe calls recorded so far.
    #[must_use]
    pub fn subscribe_calls(&self) -> Vec<Vec<ExternalId>> {
        self.subscribe_calls.read().clone()
    }

    /// All unsubscribe calls recorded so far.
    #[must_use]
    pub fn unsubscribe_calls(&self) -> Vec<Vec<String>> {
        self.unsubscribe_calls.read().clone()
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketDataProvider {
    async fn connect(&self) -> Result<(), ProviderError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashMap<ExternalId, String>, ProviderError> {
        self.subscribe_calls.write().push(ids.to_vec());

        if self.fail_subscribes.load(Ordering::SeqCst) {
            return Err(ProviderError::Subscription {
                message: "injected subscribe failure".to_string(),
            });
        }

        Ok(ids
            .iter()
            .filter(|id| id.scheme() == self.scheme)
            .map(|id| (id.clone(), Self::handle_for(id)))
            .collect())
    }

    async fn unsubscribe(&self, handles: &[String]) -> Result<(), ProviderError> {
        self.unsubscribe_calls.write().push(handles.to_vec());
        Ok(())
    }

    async fn snapshot(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashMap<ExternalId, FieldMessage>, ProviderError> {
        if self.fail_snapshots.load(Ordering::SeqCst) {
            return Err(ProviderError::Snapshot {
                message: "injected snapshot failure".to_string(),
            });
        }

        let snapshots = self.snapshots.read();
        Ok(ids
            .iter()
            .filter_map(|id| snapshots.get(id).map(|msg| (id.clone(), msg.clone())))
            .collect())
    }

    fn unique_id_scheme(&self) -> String {
        self.scheme.clone()
    }

    fn snapshot_on_subscription_start(&self) -> bool {
        self.snapshot_on_start
    }
}
