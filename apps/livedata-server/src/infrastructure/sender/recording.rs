//! Recording sender for tests.

use parking_lot::Mutex;

use crate::application::ports::MarketDataSender;
use crate::domain::message::FieldMessage;
use crate::domain::specification::DistributionSpecification;

/// Captures every published update for assertions.
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(String, FieldMessage)>>,
}

impl RecordingSender {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(topic, merged view)` pairs published so far.
    #[must_use]
    pub fn sent(&self) -> Vec<(String, FieldMessage)> {
        self.sent.lock().clone()
    }

    /// Number of published updates.
    #[must_use]
    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }

    /// The most recent update for a topic.
    #[must_use]
    pub fn last_for(&self, topic: &str) -> Option<FieldMessage> {
        self.sent
            .lock()
            .iter()
            .rev()
            .find(|(t, _)| t == topic)
            .map(|(_, msg)| msg.clone())
    }

    /// Drop everything recorded.
    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl MarketDataSender for RecordingSender {
    fn send(&self, distribution: &DistributionSpecification, data: &FieldMessage) {
        self.sent
            .lock()
            .push((distribution.topic().to_string(), data.clone()));
    }
}
