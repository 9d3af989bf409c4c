//! Subscriptions and Distributors
//!
//! A [`Subscription`] is the registry's record of one upstream security:
//! the provider handle, the shared field history, and one
//! [`MarketDataDistributor`] per normalization rule set currently being
//! served. The distributor is the unit of reference counting and
//! persistence.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::history::FieldHistoryStore;
use crate::domain::ids::ExternalId;
use crate::domain::message::FieldMessage;
use crate::domain::specification::{DistributionSpecification, LiveDataSpecification};

// =============================================================================
// MarketDataDistributor
// =============================================================================

/// The pairing of one active subscription with one normalization rule set.
#[derive(Debug)]
pub struct MarketDataDistributor {
    specification: LiveDataSpecification,
    distribution: DistributionSpecification,
    reference_count: AtomicUsize,
    persistent: AtomicBool,
}

impl MarketDataDistributor {
    /// Create a distributor with the given initial reference count.
    #[must_use]
    pub fn new(
        specification: LiveDataSpecification,
        distribution: DistributionSpecification,
        initial_references: usize,
    ) -> Self {
        Self {
            specification,
            distribution,
            reference_count: AtomicUsize::new(initial_references),
            persistent: AtomicBool::new(false),
        }
    }

    /// The originating client specification.
    #[must_use]
    pub const fn specification(&self) -> &LiveDataSpecification {
        &self.specification
    }

    /// The resolved distribution target.
    #[must_use]
    pub const fn distribution(&self) -> &DistributionSpecification {
        &self.distribution
    }

    /// Current client reference count.
    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.reference_count.load(Ordering::SeqCst)
    }

    /// Add a client reference.
    pub fn increment(&self) {
        self.reference_count.fetch_add(1, Ordering::SeqCst);
    }

    /// Release a client reference, returning the new count. Saturates at
    /// zero so an unmatched release cannot underflow.
    pub fn decrement(&self) -> usize {
        self.reference_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                Some(count.saturating_sub(1))
            })
            .map(|previous| previous.saturating_sub(1))
            .unwrap_or(0)
    }

    /// Whether this distributor must survive restarts and zero references.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.persistent.load(Ordering::SeqCst)
    }

    /// Flag or unflag this distributor persistent.
    pub fn set_persistent(&self, persistent: bool) {
        self.persistent.store(persistent, Ordering::SeqCst);
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// The registry's record of one upstream security.
///
/// Owned exclusively by the server; all mutation goes through the registry
/// while holding the per-security lock.
#[derive(Debug)]
pub struct Subscription {
    security_unique_id: RwLock<String>,
    preferred_id: ExternalId,
    created_at: DateTime<Utc>,
    last_tick_at: RwLock<Option<DateTime<Utc>>>,
    history: RwLock<FieldHistoryStore>,
    distributors: RwLock<HashMap<String, Arc<MarketDataDistributor>>>,
}

impl Subscription {
    /// Create a subscription for a freshly accepted provider handle.
    #[must_use]
    pub fn new(security_unique_id: impl Into<String>, preferred_id: ExternalId) -> Self {
        Self {
            security_unique_id: RwLock::new(security_unique_id.into()),
            preferred_id,
            created_at: Utc::now(),
            last_tick_at: RwLock::new(None),
            history: RwLock::new(FieldHistoryStore::new()),
            distributors: RwLock::new(HashMap::new()),
        }
    }

    /// Current provider-side handle.
    #[must_use]
    pub fn security_unique_id(&self) -> String {
        self.security_unique_id.read().clone()
    }

    /// Replace the provider handle after a resubscribe.
    pub fn set_security_unique_id(&self, handle: impl Into<String>) {
        *self.security_unique_id.write() = handle.into();
    }

    /// The canonical identifier subscribed upstream.
    #[must_use]
    pub const fn preferred_id(&self) -> &ExternalId {
        &self.preferred_id
    }

    /// Subscription creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last live tick time.
    #[must_use]
    pub fn last_tick_at(&self) -> Option<DateTime<Utc>> {
        *self.last_tick_at.read()
    }

    /// Record a live tick arrival.
    pub fn record_tick(&self) {
        *self.last_tick_at.write() = Some(Utc::now());
    }

    /// Look up the distributor for a rule set, if one is attached.
    #[must_use]
    pub fn distributor_for(&self, rule_set_id: &str) -> Option<Arc<MarketDataDistributor>> {
        self.distributors.read().get(rule_set_id).cloned()
    }

    /// Attach a distributor under its rule-set id.
    pub fn attach_distributor(&self, distributor: Arc<MarketDataDistributor>) {
        let rule_set_id = distributor.distribution().rule_set().id().to_string();
        self.distributors.write().insert(rule_set_id, distributor);
    }

    /// Detach the distributor for a rule set.
    pub fn detach_distributor(&self, rule_set_id: &str) {
        self.distributors.write().remove(rule_set_id);
    }

    /// All attached distributors.
    #[must_use]
    pub fn distributors(&self) -> Vec<Arc<MarketDataDistributor>> {
        self.distributors.read().values().cloned().collect()
    }

    /// Whether no distributors remain attached.
    #[must_use]
    pub fn has_no_distributors(&self) -> bool {
        self.distributors.read().is_empty()
    }

    /// Total client references across all distributors.
    #[must_use]
    pub fn total_references(&self) -> usize {
        self.distributors
            .read()
            .values()
            .map(|d| d.reference_count())
            .sum()
    }

    /// Whether any distributor is flagged persistent.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.distributors.read().values().any(|d| d.is_persistent())
    }

    /// Merge normalized fields into the shared history.
    pub fn merge_history(&self, message: &FieldMessage) {
        self.history.write().live_data_received(message);
    }

    /// Merged last-known-value view.
    #[must_use]
    pub fn last_known_values(&self) -> FieldMessage {
        self.history.read().last_known_values()
    }

    /// Borrow the history for normalization (rules may consult prior
    /// values).
    pub fn with_history<T>(&self, f: impl FnOnce(&FieldHistoryStore) -> T) -> T {
        f(&self.history.read())
    }
}

// =============================================================================
// Tests
// =============================================================================
