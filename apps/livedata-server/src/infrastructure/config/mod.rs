//! Configuration
//!
//! Environment-driven settings for the server.

mod settings;

pub use settings::ServerSettings;
