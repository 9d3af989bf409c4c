//! Application Metrics
//!
//! Emits through the `metrics` facade; without an installed recorder the
//! calls are no-ops, so instrumented code paths carry no configuration
//! burden in tests.

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Register metric descriptions. Call once at startup.
pub fn register_metrics() {
    describe_gauge!(
        "livedata_active_subscriptions",
        "Number of active upstream subscriptions"
    );
    describe_gauge!(
        "livedata_persistent_subscriptions",
        "Number of distributors flagged persistent"
    );
    describe_counter!(
        "livedata_ticks_received_total",
        "Total live ticks received from the provider"
    );
    describe_counter!(
        "livedata_normalization_failures_total",
        "Total per-distributor normalization failures"
    );
}

/// Record the current active subscription count.
pub fn set_active_subscriptions(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("livedata_active_subscriptions").set(count as f64);
}

/// Record the current persistent distributor count.
pub fn set_persistent_subscriptions(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("livedata_persistent_subscriptions").set(count as f64);
}

/// Record one live tick arrival.
pub fn record_tick() {
    counter!("livedata_ticks_received_total").increment(1);
}

/// Record one normalization failure.
pub fn record_normalization_failure() {
    counter!("livedata_normalization_failures_total").increment(1);
}
