//! Server Settings
//!
//! Configuration for the livedata server, loaded from environment
//! variables. Unset variables fall back to defaults; malformed numeric
//! values fall back rather than aborting startup.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the livedata server.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Prefix for generated publish topics.
    pub topic_prefix: String,
    /// Identifier schemes the server resolves, highest priority first.
    pub scheme_priority: Vec<String>,
    /// Interval between persistent-subscription reconciliation cycles.
    pub reconcile_interval: Duration,
    /// Capacity of the broadcast fan-out channel.
    pub broadcast_capacity: usize,
    /// Path of the durable subscription store.
    pub subscription_store_path: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            topic_prefix: "livedata".to_string(),
            scheme_priority: vec!["TICKER".to_string()],
            reconcile_interval: Duration::from_secs(60),
            broadcast_capacity: 10_000,
            subscription_store_path: PathBuf::from("persistent-subscriptions.json"),
        }
    }
}

impl ServerSettings {
    /// Load settings from environment variables.
    ///
    /// - `LIVEDATA_TOPIC_PREFIX`: topic prefix (default: `livedata`)
    /// - `LIVEDATA_SCHEME_PRIORITY`: comma-separated schemes (default: `TICKER`)
    /// - `LIVEDATA_RECONCILE_INTERVAL_SECS`: reconcile interval (default: 60)
    /// - `LIVEDATA_BROADCAST_CAPACITY`: broadcast capacity (default: 10000)
    /// - `LIVEDATA_STORE_PATH`: durable store path
    ///   (default: `persistent-subscriptions.json`)
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let topic_prefix =
            std::env::var("LIVEDATA_TOPIC_PREFIX").unwrap_or(defaults.topic_prefix);

        let scheme_priority = std::env::var("LIVEDATA_SCHEME_PRIORITY")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
            })
            .ok()
            .filter(|schemes| !schemes.is_empty())
            .unwrap_or(defaults.scheme_priority);

        let reconcile_interval = std::env::var("LIVEDATA_RECONCILE_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(defaults.reconcile_interval, Duration::from_secs);

        let broadcast_capacity = std::env::var("LIVEDATA_BROADCAST_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.broadcast_capacity);

        let subscription_store_path = std::env::var("LIVEDATA_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.subscription_store_path);

        Self {
            topic_prefix,
            scheme_priority,
            reconcile_interval,
            broadcast_capacity,
            subscription_store_path,
        }
    }
}
