//! Market Data Sender Port (Driven Port)
//!
//! For each tick, the server hands the registered sender the distributor's
//! distribution specification and the merged last-known-value view. Message
//! queue publishers, test recorders and local broadcast hubs all sit behind
//! this port.

use crate::domain::message::FieldMessage;
use crate::domain::specification::DistributionSpecification;

/// Port for outbound distribution of normalized updates.
///
/// Called on the tick-delivery path; implementations must not block.
pub trait MarketDataSender: Send + Sync {
    /// Publish the merged view for one distributor.
    fn send(&self, distribution: &DistributionSpecification, data: &FieldMessage);
}
