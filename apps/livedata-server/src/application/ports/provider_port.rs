//! Market Data Provider Port (Driven Port)
//!
//! The contract an upstream data-provider adapter must satisfy. Vendor
//! specifics (session handling, wire protocol, retry policy) live entirely
//! behind this port; calls are assumed bounded, and a timeout inside the
//! adapter surfaces here as a provider error.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::ids::ExternalId;
use crate::domain::message::FieldMessage;

/// Provider-side failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// Connection to the provider failed or was lost.
    #[error("provider connection error: {message}")]
    Connection {
        /// Error details.
        message: String,
    },

    /// A subscription request was rejected or timed out.
    #[error("provider subscription error: {message}")]
    Subscription {
        /// Error details.
        message: String,
    },

    /// A snapshot request failed or timed out.
    #[error("provider snapshot error: {message}")]
    Snapshot {
        /// Error details.
        message: String,
    },
}

/// Port for the upstream market-data provider.
///
/// `subscribe` and `snapshot` accept batches of identifiers so an adapter
/// can collapse many instruments into one upstream call. Identifiers passed
/// in are always in the scheme declared by [`Self::unique_id_scheme`].
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Open the provider connection. Idempotence is handled by the caller.
    async fn connect(&self) -> Result<(), ProviderError>;

    /// Close the provider connection.
    async fn disconnect(&self) -> Result<(), ProviderError>;

    /// Subscribe to live data for the given identifiers.
    ///
    /// Returns the provider-side handle (`security_unique_id`) for each
    /// identifier that was accepted. An identifier absent from the result
    /// map was rejected.
    async fn subscribe(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashMap<ExternalId, String>, ProviderError>;

    /// Release previously returned subscription handles.
    async fn unsubscribe(&self, handles: &[String]) -> Result<(), ProviderError>;

    /// Fetch a point-in-time snapshot for the given identifiers.
    async fn snapshot(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashMap<ExternalId, FieldMessage>, ProviderError>;

    /// The identifier scheme this provider subscribes with.
    fn unique_id_scheme(&self) -> String;

    /// Whether new subscriptions must be seeded with a snapshot before the
    /// first live tick is accepted.
    ///
    /// Declared by the concrete provider: streams that only publish deltas
    /// need the seed, full-image streams do not.
    fn snapshot_on_subscription_start(&self) -> bool;
}
