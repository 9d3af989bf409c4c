//! Caching Resolver Decorator
//!
//! Wraps any resolver with a read-through cache keyed by the full
//! [`LiveDataSpecification`]. Only successes are cached: a permanent miss
//! today may become resolvable once its rule set is registered, so misses
//! always go back to the delegate.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::DistributionSpecResolver;
use crate::domain::specification::{DistributionSpecification, LiveDataSpecification};

/// Read-through caching decorator over any [`DistributionSpecResolver`].
///
/// The cache is read-mostly: concurrent readers are unlimited and racing
/// writers on a miss are harmless because the resolved value is a pure
/// function of the key.
pub struct CachingDistributionSpecResolver<R> {
    delegate: R,
    cache: RwLock<HashMap<LiveDataSpecification, DistributionSpecification>>,
}

impl<R: DistributionSpecResolver> CachingDistributionSpecResolver<R> {
    /// Wrap a resolver with a fresh cache.
    #[must_use]
    pub fn new(delegate: R) -> Self {
        Self {
            delegate,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached resolutions.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }

    /// Drop all cached resolutions.
    pub fn clear(&self) {
        self.cache.write().clear();
    }
}

impl<R: DistributionSpecResolver> DistributionSpecResolver
    for CachingDistributionSpecResolver<R>
{
    fn resolve(&self, spec: &LiveDataSpecification) -> Option<DistributionSpecification> {
        if let Some(hit) = self.cache.read().get(spec) {
            return Some(hit.clone());
        }

        let resolved = self.delegate.resolve(spec);
        if let Some(ref value) = resolved {
            self.cache.write().insert(spec.clone(), value.clone());
        }
        resolved
    }

    fn resolve_batch(
        &self,
        specs: &[LiveDataSpecification],
    ) -> Vec<(LiveDataSpecification, Option<DistributionSpecification>)> {
        let mut results: Vec<Option<DistributionSpecification>> = {
            let cache = self.cache.read();
            specs.iter().map(|spec| cache.get(spec).cloned()).collect()
        };

        let misses: Vec<LiveDataSpecification> = specs
            .iter()
            .zip(&results)
            .filter(|(_, cached)| cached.is_none())
            .map(|(spec, _)| spec.clone())
            .collect();

        if !misses.is_empty() {
            let mut resolved = self.delegate.resolve_batch(&misses).into_iter();
            let mut cache = self.cache.write();
            for slot in results.iter_mut().filter(|slot| slot.is_none()) {
                if let Some((spec, value)) = resolved.next() {
                    if let Some(ref value) = value {
                        cache.insert(spec, value.clone());
                    }
                    *slot = value;
                }
            }
        }

        specs.iter().cloned().zip(results).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::ids::{ExternalId, ExternalIdBundle};
    use crate::domain::normalization::NormalizationRuleSet;

    /// Delegate that counts invocations and resolves only "known" specs.
    struct CountingResolver {
        calls: Arc<AtomicUsize>,
        known_rule_set: String,
    }

    impl DistributionSpecResolver for CountingResolver {
        fn resolve(&self, spec: &LiveDataSpecification) -> Option<DistributionSpecification> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if spec.normalization_rule_set_id() != self.known_rule_set {
                return None;
            }
            let id = spec.identifiers().iter().next()?.clone();
            let topic = format!("t.{}", id.value());
            Some(DistributionSpecification::new(
                id,
                NormalizationRuleSet::no_normalization(),
                topic,
            ))
        }
    }

    fn caching() -> (CachingDistributionSpecResolver<CountingResolver>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let delegate = CountingResolver {
            calls: Arc::clone(&calls),
            known_rule_set: "std".to_string(),
        };
        (CachingDistributionSpecResolver::new(delegate), calls)
    }

    fn spec(rule: &str, value: &str) -> LiveDataSpecification {
        LiveDataSpecification::new(rule, ExternalIdBundle::single(ExternalId::new("T", value)))
    }

    #[test]
    fn delegate_invoked_exactly_once_for_repeated_hits() {
        let (resolver, calls) = caching();
        let request = spec("std", "AAPL");

        for _ in 0..5 {
            assert!(resolver.resolve(&request).is_some());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cached_count(), 1);
    }

    #[test]
    fn misses_are_not_cached() {
        let (resolver, calls) = caching();
        let request = spec("unknown", "AAPL");

        assert!(resolver.resolve(&request).is_none());
        assert!(resolver.resolve(&request).is_none());

        // Every miss goes back to the delegate.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.cached_count(), 0);
    }

    #[test]
    fn batch_serves_hits_from_cache() {
        let (resolver, calls) = caching();
        let a = spec("std", "AAPL");
        let b = spec("std", "MSFT");

        // Prime the cache with one entry.
        assert!(resolver.resolve(&a).is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let results = resolver.resolve_batch(&[a.clone(), b.clone()]);
        assert!(results.iter().all(|(_, r)| r.is_some()));

        // Only the miss hit the delegate.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.cached_count(), 2);
    }

    #[test]
    fn batch_preserves_order_and_misses() {
        let (resolver, _) = caching();
        let specs = vec![spec("std", "A"), spec("unknown", "B"), spec("std", "C")];

        let results = resolver.resolve_batch(&specs);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, specs[0]);
        assert!(results[0].1.is_some());
        assert!(results[1].1.is_none());
        assert!(results[2].1.is_some());
    }

    #[test]
    fn clear_forces_redelegation() {
        let (resolver, calls) = caching();
        let request = spec("std", "AAPL");

        assert!(resolver.resolve(&request).is_some());
        resolver.clear();
        assert!(resolver.resolve(&request).is_some());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
