//! Domain layer - Core value objects and pure market-data logic.

/// Scheme-qualified external identifiers and identifier bundles.
pub mod ids;

/// Field history store (last-known-value cache).
pub mod history;

/// Field messages exchanged with providers and consumers.
pub mod message;

/// Normalization rules and rule sets.
pub mod normalization;

/// Client request keys and resolved distribution targets.
pub mod specification;
