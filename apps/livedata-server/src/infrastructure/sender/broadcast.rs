//! Broadcast Sender
//!
//! Fans merged updates out to in-process consumers over a tokio broadcast
//! channel. Slow consumers lag and drop rather than applying backpressure
//! to the tick path.

use tokio::sync::broadcast;

use crate::application::ports::MarketDataSender;
use crate::domain::message::FieldMessage;
use crate::domain::specification::DistributionSpecification;

/// Default channel capacity.
const DEFAULT_CAPACITY: usize = 10_000;

/// One published update.
#[derive(Debug, Clone)]
pub struct TopicUpdate {
    /// Topic the update belongs to.
    pub topic: String,
    /// Merged last-known-value view.
    pub data: FieldMessage,
}

/// Broadcast-channel fan-out of merged updates.
pub struct BroadcastSender {
    tx: broadcast::Sender<TopicUpdate>,
}

impl BroadcastSender {
    /// Create a sender with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a sender with an explicit channel capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Get a receiver for published updates.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TopicUpdate> {
        self.tx.subscribe()
    }

    /// Number of attached receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastSender {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketDataSender for BroadcastSender {
    fn send(&self, distribution: &DistributionSpecification, data: &FieldMessage) {
        // A send error only means no receivers are attached right now.
        let _ = self.tx.send(TopicUpdate {
            topic: distribution.topic().to_string(),
            data: data.clone(),
        });
    }
}
