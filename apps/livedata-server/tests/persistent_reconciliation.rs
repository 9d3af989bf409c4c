//! Persistent Subscription Reconciliation Tests
//!
//! Drives the persistence manager against the real registry with in-memory
//! and file-backed stores: restart recovery, promotion + refresh, survival
//! at zero client references, and storage-failure resilience.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use livedata_server::{
    CachingDistributionSpecResolver, DefaultDistributionSpecResolver, ExternalIdBundle,
    FileSubscriptionStore, InMemorySubscriptionStore, LiveDataServer, LiveDataSpecification,
    MarketDataProvider, MockMarketDataProvider, NormalizationRuleSet, PersistentSubscription,
    PersistentSubscriptionManager, PrefixTopicNameResolver, RecordingSender,
    SchemePriorityIdResolver, StandardLiveDataServer, StandardRuleResolver, SubscriptionStore,
};

struct Fixture {
    server: Arc<StandardLiveDataServer>,
    provider: Arc<MockMarketDataProvider>,
}

async fn fixture() -> Fixture {
    let rules = Arc::new(StandardRuleResolver::new());
    rules.register(Arc::new(NormalizationRuleSet::new("std", Vec::new())));

    let provider = Arc::new(MockMarketDataProvider::new("TICKER"));
    let provider_dyn: Arc<dyn MarketDataProvider> = provider.clone();
    let server = Arc::new(StandardLiveDataServer::new(
        provider_dyn,
        Arc::new(CachingDistributionSpecResolver::new(
            DefaultDistributionSpecResolver::new(
                Arc::new(SchemePriorityIdResolver::single_scheme("TICKER")),
                rules,
                Arc::new(PrefixTopicNameResolver::new("livedata")),
            ),
        )),
        Arc::new(RecordingSender::new()),
    ));
    server.connect().await.unwrap();

    Fixture { server, provider }
}

fn spec(value: &str) -> LiveDataSpecification {
    LiveDataSpecification::new("std", ExternalIdBundle::of("TICKER", value))
}

fn manager(
    fixture: &Fixture,
    store: Arc<dyn SubscriptionStore>,
    interval: Duration,
) -> Arc<PersistentSubscriptionManager> {
    Arc::new(PersistentSubscriptionManager::new(
        Arc::clone(&fixture.server),
        store,
        interval,
    ))
}

#[tokio::test]
async fn durable_set_populates_an_empty_registry() {
    let fixture = fixture().await;

    let store = Arc::new(InMemorySubscriptionStore::new());
    store.seed([PersistentSubscription::new(spec("AAPL"))]);

    let manager = manager(&fixture, store, Duration::from_secs(60));
    manager.refresh().await;

    assert_eq!(fixture.server.subscription_count(), 1);
    let info = fixture.server.subscription_info();
    assert!(info[0].persistent);
    // Persistence-driven subscriptions carry no client references.
    assert_eq!(info[0].reference_count, 0);
}

#[tokio::test]
async fn reconcile_is_idempotent_across_cycles() {
    let fixture = fixture().await;

    let store = Arc::new(InMemorySubscriptionStore::new());
    store.seed([PersistentSubscription::new(spec("AAPL"))]);

    let manager = manager(&fixture, store, Duration::from_secs(60));
    manager.refresh().await;
    manager.refresh().await;
    manager.refresh().await;

    assert_eq!(fixture.server.subscription_count(), 1);
    // The security was subscribed upstream exactly once.
    assert_eq!(fixture.provider.subscribe_calls().len(), 1);
}

#[tokio::test]
async fn promotion_reaches_storage_on_refresh() {
    let fixture = fixture().await;
    let store = Arc::new(InMemorySubscriptionStore::new());
    let manager = manager(
        &fixture,
        Arc::clone(&store) as Arc<dyn SubscriptionStore>,
        Duration::from_secs(60),
    );

    // A transient subscription is later promoted to persistent.
    let promoted = spec("MSFT");
    fixture.server.subscribe(&promoted).await.unwrap();
    assert!(fixture.server.set_persistent(&promoted, true).await.unwrap());

    manager.refresh().await;

    let durable = store.read().await.unwrap();
    assert!(durable.contains(&PersistentSubscription::new(promoted)));
}

#[tokio::test]
async fn persistent_subscription_survives_zero_client_references() {
    let fixture = fixture().await;

    let request = spec("AAPL");
    fixture.server.subscribe(&request).await.unwrap();
    fixture.server.set_persistent(&request, true).await.unwrap();

    // The last client leaves; the subscription must stay.
    assert!(fixture.server.unsubscribe(&request).await.unwrap());
    assert_eq!(fixture.server.subscription_count(), 1);
    assert!(fixture.provider.unsubscribe_calls().is_empty());

    // Demoting it with no clients left releases it upstream.
    assert!(fixture.server.set_persistent(&request, false).await.unwrap());
    assert_eq!(fixture.server.subscription_count(), 0);
    assert_eq!(fixture.provider.unsubscribe_calls().len(), 1);
}

#[tokio::test]
async fn demotion_with_active_clients_keeps_the_subscription() {
    let fixture = fixture().await;

    let request = spec("AAPL");
    fixture.server.subscribe(&request).await.unwrap();
    fixture.server.set_persistent(&request, true).await.unwrap();
    fixture.server.set_persistent(&request, false).await.unwrap();

    // The client reference still holds the subscription open.
    assert_eq!(fixture.server.subscription_count(), 1);
    assert!(!fixture.server.subscription_info()[0].persistent);
}

#[tokio::test]
async fn file_store_round_trips_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subscriptions.json");

    // First server life: promote and save.
    {
        let fixture = fixture().await;
        let store = Arc::new(FileSubscriptionStore::new(&path));
        let manager = manager(&fixture, store, Duration::from_secs(60));

        let request = spec("AAPL");
        fixture.server.subscribe(&request).await.unwrap();
        fixture.server.set_persistent(&request, true).await.unwrap();
        manager.refresh().await;
    }

    // Second server life: an empty registry is repopulated from the file.
    let fixture = fixture().await;
    let store = Arc::new(FileSubscriptionStore::new(&path));
    let manager = manager(&fixture, store, Duration::from_secs(60));

    assert_eq!(fixture.server.subscription_count(), 0);
    manager.refresh().await;

    assert_eq!(fixture.server.subscription_count(), 1);
    assert!(fixture.server.subscription_info()[0].persistent);
}

#[tokio::test]
async fn corrupt_storage_abandons_the_cycle_and_recovers_later() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subscriptions.json");
    tokio::fs::write(&path, b"not json").await.unwrap();

    let fixture = fixture().await;
    let store = Arc::new(FileSubscriptionStore::new(&path));
    let manager = manager(
        &fixture,
        Arc::clone(&store) as Arc<dyn SubscriptionStore>,
        Duration::from_secs(60),
    );

    // The corrupt read abandons the cycle without touching the registry.
    manager.refresh().await;
    assert_eq!(fixture.server.subscription_count(), 0);

    // Once the file is repaired, the next cycle succeeds.
    let durable: BTreeSet<_> = [PersistentSubscription::new(spec("AAPL"))].into();
    store.write(&durable).await.unwrap();
    manager.refresh().await;
    assert_eq!(fixture.server.subscription_count(), 1);
}

#[tokio::test]
async fn background_loop_reconciles_and_stops_cleanly() {
    let fixture = fixture().await;

    let store = Arc::new(InMemorySubscriptionStore::new());
    store.seed([PersistentSubscription::new(spec("AAPL"))]);

    let manager = manager(
        &fixture,
        Arc::clone(&store) as Arc<dyn SubscriptionStore>,
        Duration::from_millis(5),
    );

    assert!(manager.start());
    assert!(!manager.start());

    tokio::time::sleep(Duration::from_millis(50)).await;
    manager.stop().await;
    assert!(!manager.is_running());

    assert_eq!(fixture.server.subscription_count(), 1);
    // The loop also saved the reconciled set back.
    assert_eq!(store.len(), 1);
}
