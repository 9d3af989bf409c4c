//! Subscription Store Port (Driven Port)
//!
//! Durable storage for the persistent-subscription set. Records are keyed
//! by the client-facing [`LiveDataSpecification`] so they stay valid across
//! restarts, independent of runtime subscription identity.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::specification::LiveDataSpecification;

/// A subscription that must be re-established automatically after restart,
/// independent of client presence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PersistentSubscription {
    /// The client-facing request key to resubscribe with.
    pub specification: LiveDataSpecification,
}

impl PersistentSubscription {
    /// Create a persistent subscription record.
    #[must_use]
    pub const fn new(specification: LiveDataSpecification) -> Self {
        Self { specification }
    }
}

/// Storage-side failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("storage I/O error: {message}")]
    Io {
        /// Error details.
        message: String,
    },

    /// Stored data could not be decoded.
    #[error("storage corrupt: {message}")]
    Corrupt {
        /// Error details.
        message: String,
    },
}

/// Port for the durable subscription store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Load the durable subscription set.
    async fn read(&self) -> Result<BTreeSet<PersistentSubscription>, StorageError>;

    /// Replace the durable subscription set.
    async fn write(
        &self,
        subscriptions: &BTreeSet<PersistentSubscription>,
    ) -> Result<(), StorageError>;
}
