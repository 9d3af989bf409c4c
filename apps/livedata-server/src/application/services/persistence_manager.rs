//! Persistent Subscription Manager
//!
//! Background reconciliation between the durable subscription set and the
//! live registry. On every cycle the durable set is read, missing entries
//! are resubscribed with their distributors flagged persistent, and the
//! current persistent set is written back. Storage failures abandon the
//! cycle; the next scheduled tick retries.
//!
//! Reads are asynchronous relative to server startup: a server may be
//! briefly active with zero persistent subscriptions before the first read
//! completes.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::ports::{PersistentSubscription, SubscriptionStore};
use crate::application::server::StandardLiveDataServer;
use crate::infrastructure::metrics;

/// Handle to the running reconciliation task.
struct RunningState {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Keeps the durable subscription set and the live registry in sync.
pub struct PersistentSubscriptionManager {
    server: Arc<StandardLiveDataServer>,
    store: Arc<dyn SubscriptionStore>,
    interval: Duration,
    /// Serializes scheduled and forced cycles; a stop request lets the
    /// cycle holding this lock finish cleanly.
    cycle_lock: AsyncMutex<()>,
    state: Mutex<Option<RunningState>>,
}

impl PersistentSubscriptionManager {
    /// Create a manager over a server and durable store.
    #[must_use]
    pub fn new(
        server: Arc<StandardLiveDataServer>,
        store: Arc<dyn SubscriptionStore>,
        interval: Duration,
    ) -> Self {
        Self {
            server,
            store,
            interval,
            cycle_lock: AsyncMutex::new(()),
            state: Mutex::new(None),
        }
    }

    /// Whether the background task is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Start the periodic reconciliation task.
    ///
    /// Returns `true` if the task was started, `false` if it was already
    /// running. Safe to call repeatedly.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut state = self.state.lock();
        if state.is_some() {
            debug!("Persistent subscription manager already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let manager = Arc::clone(self);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(manager.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = task_cancel.cancelled() => {
                        info!("Persistent subscription manager stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        manager.reconcile().await;
                    }
                }
            }
        });

        *state = Some(RunningState { cancel, task });
        info!(interval_secs = self.interval.as_secs(), "Persistent subscription manager started");
        true
    }

    /// Stop the background task and wait for it to finish.
    ///
    /// A cycle that is mid-flight completes before the task exits. Safe to
    /// call repeatedly.
    pub async fn stop(&self) {
        let Some(running) = self.state.lock().take() else {
            return;
        };
        running.cancel.cancel();
        if let Err(e) = running.task.await {
            warn!(error = %e, "Persistent subscription task join failed");
        }
    }

    /// Force an immediate save/resubscribe cycle.
    ///
    /// Picks up distributors promoted to persistent since the last
    /// scheduled cycle; serialized against the scheduled task.
    pub async fn refresh(&self) {
        self.reconcile().await;
    }

    /// One reconciliation cycle: read, resubscribe missing, save current.
    async fn reconcile(&self) {
        let _guard = self.cycle_lock.lock().await;

        let stored = match self.store.read().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Reading persistent subscriptions failed; retrying next cycle");
                return;
            }
        };

        let active = self.server.persistent_specifications();
        for record in &stored {
            if active.contains(&record.specification) {
                continue;
            }
            match self.server.subscribe_persistent(&record.specification).await {
                Ok(result) => {
                    info!(topic = %result.topic, "Persistent subscription established");
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        spec = %record.specification,
                        "Persistent resubscribe failed"
                    );
                }
            }
        }

        let current: BTreeSet<PersistentSubscription> = self
            .server
            .persistent_specifications()
            .into_iter()
            .map(PersistentSubscription::new)
            .collect();
        metrics::set_persistent_subscriptions(current.len());

        if let Err(e) = self.store.write(&current).await {
            warn!(error = %e, "Saving persistent subscriptions failed; retrying next cycle");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
