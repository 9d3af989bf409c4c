//! Application Services
//!
//! Long-running orchestration around the live data server.

mod persistence_manager;

pub use persistence_manager::PersistentSubscriptionManager;
