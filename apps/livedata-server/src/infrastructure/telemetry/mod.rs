//! Tracing Initialization
//!
//! Console tracing with `RUST_LOG`-style filtering.

use tracing_subscriber::EnvFilter;

/// Initialize console tracing.
///
/// Respects `RUST_LOG`; defaults to `info`. Safe to call once at startup.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}
