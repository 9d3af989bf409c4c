//! Outbound Senders
//!
//! Implementations of [`crate::application::ports::MarketDataSender`]:
//! a tokio broadcast hub for in-process consumers and a recording sender
//! for tests. Message-queue publishers for remote consumers implement the
//! same port in their own deployables.

mod broadcast;
mod recording;

pub use broadcast::{BroadcastSender, TopicUpdate};
pub use recording::RecordingSender;
