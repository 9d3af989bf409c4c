//! External Identifiers
//!
//! Scheme-qualified identifiers for market data instruments. An instrument
//! is usually known under several equivalent identifiers (one per scheme),
//! collected into an [`ExternalIdBundle`].

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// ExternalId
// =============================================================================

/// A single scheme-qualified identifier, e.g. `TICKER~AAPL`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExternalId {
    /// Identification scheme, e.g. `TICKER` or `ISIN`.
    scheme: String,
    /// Identifier value within the scheme.
    value: String,
}

impl ExternalId {
    /// Create a new identifier.
    #[must_use]
    pub fn new(scheme: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            value: value.into(),
        }
    }

    /// Get the identification scheme.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Get the identifier value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.scheme, self.value)
    }
}

// =============================================================================
// ExternalIdBundle
// =============================================================================

/// An unordered set of equivalent identifiers for one instrument.
///
/// A bundle may carry several identifiers in different schemes. Bundles used
/// as subscription keys must not be empty; that invariant is enforced at the
/// server boundary rather than at construction, so intermediate empty bundles
/// (e.g. while building requests) remain representable.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExternalIdBundle {
    ids: BTreeSet<ExternalId>,
}

impl ExternalIdBundle {
    /// Create a bundle from any collection of identifiers.
    ///
    /// Duplicates are collapsed.
    #[must_use]
    pub fn new(ids: impl IntoIterator<Item = ExternalId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Create a bundle holding a single identifier.
    #[must_use]
    pub fn single(id: ExternalId) -> Self {
        Self::new([id])
    }

    /// Convenience constructor from a scheme/value pair.
    #[must_use]
    pub fn of(scheme: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(ExternalId::new(scheme, value))
    }

    /// Check whether the bundle holds no identifiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of identifiers in the bundle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Iterate over the identifiers.
    pub fn iter(&self) -> impl Iterator<Item = &ExternalId> {
        self.ids.iter()
    }

    /// Find the identifier in the given scheme, if any.
    #[must_use]
    pub fn id_in_scheme(&self, scheme: &str) -> Option<&ExternalId> {
        self.ids.iter().find(|id| id.scheme() == scheme)
    }

    /// Check whether the bundle contains an identifier in the given scheme.
    #[must_use]
    pub fn contains_scheme(&self, scheme: &str) -> bool {
        self.id_in_scheme(scheme).is_some()
    }
}

impl fmt::Display for ExternalIdBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, id) in self.ids.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{id}")?;
        }
        write!(f, "]")
    }
}

impl FromIterator<ExternalId> for ExternalIdBundle {
    fn from_iter<T: IntoIterator<Item = ExternalId>>(iter: T) -> Self {
        Self::new(iter)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_id_display() {
        let id = ExternalId::new("TICKER", "AAPL");
        assert_eq!(id.to_string(), "TICKER~AAPL");
        assert_eq!(id.scheme(), "TICKER");
        assert_eq!(id.value(), "AAPL");
    }

    #[test]
    fn bundle_collapses_duplicates() {
        let bundle = ExternalIdBundle::new([
            ExternalId::new("TICKER", "AAPL"),
            ExternalId::new("TICKER", "AAPL"),
            ExternalId::new("ISIN", "US0378331005"),
        ]);

        assert_eq!(bundle.len(), 2);
    }

    #[test]
    fn bundle_scheme_lookup() {
        let bundle = ExternalIdBundle::new([
            ExternalId::new("TICKER", "AAPL"),
            ExternalId::new("ISIN", "US0378331005"),
        ]);

        assert_eq!(
            bundle.id_in_scheme("ISIN").map(ExternalId::value),
            Some("US0378331005")
        );
        assert!(bundle.contains_scheme("TICKER"));
        assert!(!bundle.contains_scheme("CUSIP"));
    }

    #[test]
    fn bundle_equality_ignores_insertion_order() {
        let a = ExternalIdBundle::new([
            ExternalId::new("TICKER", "AAPL"),
            ExternalId::new("ISIN", "US0378331005"),
        ]);
        let b = ExternalIdBundle::new([
            ExternalId::new("ISIN", "US0378331005"),
            ExternalId::new("TICKER", "AAPL"),
        ]);

        assert_eq!(a, b);
    }

    #[test]
    fn empty_bundle_is_representable() {
        let bundle = ExternalIdBundle::default();
        assert!(bundle.is_empty());
        assert_eq!(bundle.len(), 0);
    }

    #[test]
    fn bundle_serde_round_trip() {
        let bundle = ExternalIdBundle::of("TICKER", "MSFT");
        let json = serde_json::to_string(&bundle).unwrap();
        let parsed: ExternalIdBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, bundle);
    }
}
