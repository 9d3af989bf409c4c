//! Livedata Server Binary
//!
//! Starts the market data distribution server.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p livedata-server
//! ```
//!
//! # Environment Variables
//!
//! - `LIVEDATA_TOPIC_PREFIX`: Publish topic prefix (default: `livedata`)
//! - `LIVEDATA_SCHEME_PRIORITY`: Comma-separated identifier schemes
//!   (default: `TICKER`)
//! - `LIVEDATA_RECONCILE_INTERVAL_SECS`: Persistence reconcile interval
//!   (default: 60)
//! - `LIVEDATA_BROADCAST_CAPACITY`: Broadcast channel capacity
//!   (default: 10000)
//! - `LIVEDATA_STORE_PATH`: Durable subscription store path
//!   (default: `persistent-subscriptions.json`)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use tokio::signal;

use livedata_server::application::services::PersistentSubscriptionManager;
use livedata_server::infrastructure::{metrics, telemetry};
use livedata_server::{
    BroadcastSender, CachingDistributionSpecResolver, DefaultDistributionSpecResolver,
    FileSubscriptionStore, MockMarketDataProvider, PrefixTopicNameResolver,
    SchemePriorityIdResolver, ServerSettings, StandardLiveDataServer, StandardRuleResolver,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading any configuration.
    let _ = dotenvy::dotenv();

    telemetry::init_tracing();
    metrics::register_metrics();

    tracing::info!("Starting livedata server");

    let settings = ServerSettings::from_env();
    tracing::info!(
        topic_prefix = %settings.topic_prefix,
        schemes = ?settings.scheme_priority,
        reconcile_interval_secs = settings.reconcile_interval.as_secs(),
        store_path = %settings.subscription_store_path.display(),
        "Configuration loaded"
    );

    let scheme = settings
        .scheme_priority
        .first()
        .cloned()
        .unwrap_or_else(|| "TICKER".to_string());

    // Vendor provider adapters deploy separately; this binary wires the
    // in-process mock provider for local development.
    tracing::warn!("No vendor provider configured - running with the mock provider");
    let provider = Arc::new(MockMarketDataProvider::new(scheme));

    let rule_resolver = Arc::new(StandardRuleResolver::new());
    let resolver = Arc::new(CachingDistributionSpecResolver::new(
        DefaultDistributionSpecResolver::new(
            Arc::new(SchemePriorityIdResolver::new(
                settings.scheme_priority.clone(),
            )),
            rule_resolver,
            Arc::new(PrefixTopicNameResolver::new(settings.topic_prefix.clone())),
        ),
    ));

    let sender = Arc::new(BroadcastSender::with_capacity(settings.broadcast_capacity));
    let server = Arc::new(StandardLiveDataServer::new(provider, resolver, sender));
    server.connect().await?;

    let store = Arc::new(FileSubscriptionStore::new(
        settings.subscription_store_path.clone(),
    ));
    let manager = Arc::new(PersistentSubscriptionManager::new(
        Arc::clone(&server),
        store,
        settings.reconcile_interval,
    ));
    manager.start();

    tracing::info!("Livedata server running; press Ctrl-C to stop");
    signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    manager.stop().await;
    server.disconnect().await?;

    tracing::info!("Livedata server stopped");
    Ok(())
}
