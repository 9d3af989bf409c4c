//! Identifier Resolution
//!
//! Picks the one canonical identifier out of a bundle that the upstream
//! provider should be subscribed with.

use crate::domain::ids::{ExternalId, ExternalIdBundle};

/// Resolves an identifier bundle to a single canonical identifier.
pub trait IdResolver: Send + Sync {
    /// Pick the canonical identifier, or `None` when no identifier in a
    /// supported scheme exists.
    fn resolve(&self, bundle: &ExternalIdBundle) -> Option<ExternalId>;

    /// Resolve a batch, preserving input order.
    fn resolve_batch(
        &self,
        bundles: &[ExternalIdBundle],
    ) -> Vec<(ExternalIdBundle, Option<ExternalId>)> {
        bundles
            .iter()
            .map(|bundle| (bundle.clone(), self.resolve(bundle)))
            .collect()
    }
}

/// Resolves by scheme priority: the first configured scheme that the bundle
/// carries an identifier in wins.
#[derive(Debug, Clone)]
pub struct SchemePriorityIdResolver {
    schemes: Vec<String>,
}

impl SchemePriorityIdResolver {
    /// Create a resolver preferring the given schemes, in order.
    #[must_use]
    pub fn new(schemes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            schemes: schemes.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a resolver supporting a single scheme.
    #[must_use]
    pub fn single_scheme(scheme: impl Into<String>) -> Self {
        Self::new([scheme])
    }
}

impl IdResolver for SchemePriorityIdResolver {
    fn resolve(&self, bundle: &ExternalIdBundle) -> Option<ExternalId> {
        self.schemes
            .iter()
            .find_map(|scheme| bundle.id_in_scheme(scheme).cloned())
    }
}
