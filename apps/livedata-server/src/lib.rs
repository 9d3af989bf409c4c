#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Livedata Server - Market Data Distribution Engine
//!
//! Turns a client's abstract request for a market-data item into a
//! concrete, normalized, continuously-updated feed, and keeps a registry
//! of active and persistent (restart-surviving) subscriptions consistent
//! with an upstream data provider.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Value objects and pure logic
//!   - `ids`: External identifiers and bundles
//!   - `specification`: Request keys and distribution targets
//!   - `message` / `history`: Field messages and the last-known-value store
//!   - `normalization`: Field-transform rules and rule sets
//!
//! - **Application**: Ports, resolution and orchestration
//!   - `ports`: Interfaces for the provider, durable store and sender
//!   - `resolver`: Resolution pipeline with caching and strategies
//!   - `server`: Subscription registry and priority fan-out
//!   - `services`: Persistent-subscription reconciliation
//!
//! - **Infrastructure**: Adapters
//!   - `protocol`: Remote subscriber protocol codec
//!   - `storage`: In-memory and file-backed subscription stores
//!   - `provider` / `sender`: Mock provider, broadcast and recording senders
//!   - `config` / `telemetry` / `metrics`: Ambient wiring
//!
//! # Data Flow
//!
//! ```text
//! client request ──► resolver (cached) ──► subscription registry ──► provider
//!                                                 │
//!                        provider tick ──► normalization ──► field history
//!                                                 │
//!                                        distributor ──► sender ──► consumers
//! ```
//!
//! The persistent-subscription loop runs orthogonally, driving the
//! registry from durable storage.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core value objects with no external dependencies.
pub mod domain;

/// Application layer - Ports, resolution and orchestration.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::history::FieldHistoryStore;
pub use domain::ids::{ExternalId, ExternalIdBundle};
pub use domain::message::{Field, FieldMessage, FieldValue};
pub use domain::normalization::{NormalizationRule, NormalizationRuleSet};
pub use domain::specification::{DistributionSpecification, LiveDataSpecification};

// Ports
pub use application::ports::{
    MarketDataProvider, MarketDataSender, PersistentSubscription, ProviderError, StorageError,
    SubscriptionStore,
};

// Resolution
pub use application::resolver::{
    CachingDistributionSpecResolver, DefaultDistributionSpecResolver, DistributionSpecResolver,
    FixedDistributionSpecResolver, IdResolver, NaiveDistributionSpecResolver,
    NormalizationRuleResolver, PrefixTopicNameResolver, SchemePriorityIdResolver,
    StandardRuleResolver, TopicNameRequest, TopicNameResolver,
};

// Server
pub use application::server::{
    CombiningLiveDataServer, LiveDataServer, StandardLiveDataServer, SubscriptionError,
    SubscriptionInfo, SubscriptionResult,
};

// Services
pub use application::services::PersistentSubscriptionManager;

// Infrastructure
pub use infrastructure::config::ServerSettings;
pub use infrastructure::protocol::{CodecError, NO_CORRELATION, ProtocolMessage, ResultCode};
pub use infrastructure::provider::MockMarketDataProvider;
pub use infrastructure::sender::{BroadcastSender, RecordingSender, TopicUpdate};
pub use infrastructure::storage::{FileSubscriptionStore, InMemorySubscriptionStore};
