//! Cache metrics, labelled by key namespace (`profile`, `feed`).
//!
//! Collectors live in a process-wide `OnceLock`; `CacheMetrics::register`
//! attaches them to a registry once at startup.

use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

use crate::CacheNamespace;

static COLLECTORS: OnceLock<Collectors> = OnceLock::new();

struct Collectors {
    /// outcome: hit | miss
    lookups: IntCounterVec,
    writes: IntCounterVec,
    keys_invalidated: IntCounterVec,
    /// operation: get | set | delete | scan_delete
    errors: IntCounterVec,
}

fn counter(name: &str, help: &str, labels: &[&str]) -> IntCounterVec {
    IntCounterVec::new(Opts::new(name, help), labels).expect("valid metric definition")
}

impl Collectors {
    fn new() -> Self {
        Self {
            lookups: counter(
                "shared_cache_lookups_total",
                "Cache lookups by namespace and outcome",
                &["namespace", "outcome"],
            ),
            writes: counter(
                "shared_cache_writes_total",
                "Values written to the cache by namespace",
                &["namespace"],
            ),
            keys_invalidated: counter(
                "shared_cache_keys_invalidated_total",
                "Keys removed by single or namespace invalidation",
                &["namespace"],
            ),
            errors: counter(
                "shared_cache_errors_total",
                "Cache failures absorbed as misses, by namespace and operation",
                &["namespace", "operation", "error_type"],
            ),
        }
    }
}

fn collectors() -> &'static Collectors {
    COLLECTORS.get_or_init(Collectors::new)
}

#[derive(Clone, Default)]
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn new() -> Self {
        Self
    }

    pub fn register(registry: &Registry) -> Result<(), prometheus::Error> {
        let c = collectors();
        registry.register(Box::new(c.lookups.clone()))?;
        registry.register(Box::new(c.writes.clone()))?;
        registry.register(Box::new(c.keys_invalidated.clone()))?;
        registry.register(Box::new(c.errors.clone()))?;
        Ok(())
    }

    pub fn record_lookup(&self, key: &str, hit: bool) {
        let outcome = if hit { "hit" } else { "miss" };
        collectors()
            .lookups
            .with_label_values(&[CacheNamespace::of(key).as_str(), outcome])
            .inc();
    }

    pub fn record_write(&self, key: &str) {
        collectors()
            .writes
            .with_label_values(&[CacheNamespace::of(key).as_str()])
            .inc();
    }

    /// `key` may be a bare prefix such as `feed:`.
    pub fn record_invalidation(&self, key: &str, removed: usize) {
        collectors()
            .keys_invalidated
            .with_label_values(&[CacheNamespace::of(key).as_str()])
            .inc_by(removed as u64);
    }

    pub fn record_error(&self, key: &str, operation: &str, error_type: &str) {
        collectors()
            .errors
            .with_label_values(&[CacheNamespace::of(key).as_str(), operation, error_type])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups_split_by_namespace() {
        let metrics = CacheMetrics::new();
        let lookups = &collectors().lookups;
        let feed_hits = lookups.with_label_values(&["feed", "hit"]).get();
        let profile_misses = lookups.with_label_values(&["profile", "miss"]).get();

        metrics.record_lookup("feed:global", true);
        metrics.record_lookup("profile:abc", false);

        assert!(lookups.with_label_values(&["feed", "hit"]).get() > feed_hits);
        assert!(lookups.with_label_values(&["profile", "miss"]).get() > profile_misses);
    }

    #[test]
    fn test_namespace_invalidation_counts_removed_keys() {
        let metrics = CacheMetrics::new();
        let invalidated = &collectors().keys_invalidated;
        let before = invalidated.with_label_values(&["feed"]).get();

        metrics.record_invalidation("feed:", 3);

        assert!(invalidated.with_label_values(&["feed"]).get() >= before + 3);
    }

    #[test]
    fn test_register_exposes_collectors() {
        let registry = Registry::new();
        CacheMetrics::register(&registry).unwrap();
        CacheMetrics::new().record_write("profile:abc");

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"shared_cache_writes_total".to_string()));
    }
}
