//! In-memory subscription store for testing.

use std::collections::BTreeSet;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{PersistentSubscription, StorageError, SubscriptionStore};

/// In-memory implementation of [`SubscriptionStore`].
///
/// Suitable for testing and development. Not for production use: the set
/// does not survive a restart.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    subscriptions: RwLock<BTreeSet<PersistentSubscription>>,
}

impl InMemorySubscriptionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store (for test setup).
    pub fn seed(&self, subscriptions: impl IntoIterator<Item = PersistentSubscription>) {
        self.subscriptions.write().extend(subscriptions);
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Check whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.read().is_empty()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn read(&self) -> Result<BTreeSet<PersistentSubscription>, StorageError> {
        Ok(self.subscriptions.read().clone())
    }

    async fn write(
        &self,
        subscriptions: &BTreeSet<PersistentSubscription>,
    ) -> Result<(), StorageError> {
        *self.subscriptions.write() = subscriptions.clone();
        Ok(())
    }
}
