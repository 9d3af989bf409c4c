//! Application Ports (Driven)
//!
//! Interfaces for the external systems this engine drives: the upstream
//! market-data provider, the durable subscription store, and the outbound
//! sender consumers register.

mod provider_port;
mod sender_port;
mod storage_port;

pub use provider_port::{MarketDataProvider, ProviderError};
pub use sender_port::MarketDataSender;
pub use storage_port::{PersistentSubscription, StorageError, SubscriptionStore};

#[cfg(test)]
pub use storage_port::MockSubscriptionStore;
