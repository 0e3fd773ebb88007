//! Shared cache layer for Pulse services
//!
//! Holds per-identity profile snapshots and assembled feed views with:
//! - A fixed key schema (`profile:{identity}`, `feed:{scope}`)
//! - SCAN-based prefix invalidation (no blocking KEYS)
//! - A degrading facade: every backend failure is reported as a miss
//! - Redis pub/sub invalidation messages for cross-service coherence
//! - Metrics integration
//!
//! The cache is an optional accelerator and never a source of truth. Callers
//! talk to [`SharedCache`], which cannot fail: an unreachable backend, a
//! corrupt entry, or an unconfigured cache all look like an absent key.

mod error;
mod keys;
mod memory;
mod metrics;
mod redis_store;

pub mod invalidation;

pub use error::{CacheError, CacheResult};
pub use keys::{CacheKey, CacheNamespace, FEED_PREFIX, GLOBAL_FEED_SCOPE, PROFILE_PREFIX};
pub use memory::MemoryCache;
pub use metrics::CacheMetrics;
pub use redis_store::RedisCache;

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default TTL values (seconds)
pub mod ttl {
    pub const PROFILE: u64 = 600; // 10 minutes
    pub const FEED: u64 = 300; // 5 minutes
}

/// Raw key-value operations a cache backend must provide.
///
/// Single-key operations are atomic. `scan_del` is not atomic across keys.
#[async_trait::async_trait]
pub trait CacheOperations: Send + Sync {
    /// Get a raw value; expired entries are absent.
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>>;

    /// Set a raw value with an absolute expiry of now + `ttl`.
    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()>;

    /// Delete a single key.
    async fn del(&self, key: &str) -> CacheResult<()>;

    /// Delete every key starting with `prefix`; returns how many were removed.
    async fn scan_del(&self, prefix: &str) -> CacheResult<usize>;
}

/// Facade used by services. Never surfaces a cache failure.
#[derive(Clone)]
pub struct SharedCache {
    backend: Option<Arc<dyn CacheOperations>>,
    metrics: CacheMetrics,
}

impl SharedCache {
    pub fn new(backend: Arc<dyn CacheOperations>) -> Self {
        Self {
            backend: Some(backend),
            metrics: CacheMetrics::new(),
        }
    }

    /// A cache that always misses. Used when no backend is configured or the
    /// backend could not be reached at startup.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            metrics: CacheMetrics::new(),
        }
    }

    /// In-process cache, for tests and single-node development.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()))
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Get a typed value. Returns `None` on miss, backend error, or corrupt data.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let backend = self.backend.as_ref()?;

        let raw = match backend.get_raw(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                self.metrics.record_lookup(key, false);
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                self.metrics.record_error(key, "get", e.kind());
                return None;
            }
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) => {
                debug!(key = %key, "Cache hit");
                self.metrics.record_lookup(key, true);
                Some(value)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache deserialization failed");
                self.metrics.record_error(key, "get", "deserialize");
                // Corrupted entry, drop it so the next read repopulates
                if let Err(e) = backend.del(key).await {
                    debug!(key = %key, error = %e, "Failed to drop corrupt cache entry");
                }
                None
            }
        }
    }

    /// Store a typed value. Returns whether the write reached the backend.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            return false;
        };

        let data = match serde_json::to_string(value) {
            Ok(data) => data,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache serialization failed");
                self.metrics.record_error(key, "set", "serialize");
                return false;
            }
        };

        match backend.set_raw(key, data, ttl).await {
            Ok(()) => {
                debug!(key = %key, ttl_secs = ttl.as_secs(), "Cache set");
                self.metrics.record_write(key);
                true
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache write failed");
                self.metrics.record_error(key, "set", e.kind());
                false
            }
        }
    }

    /// Remove a single key. Returns whether the delete reached the backend.
    pub async fn invalidate(&self, key: &str) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            return false;
        };

        match backend.del(key).await {
            Ok(()) => {
                debug!(key = %key, "Cache delete");
                self.metrics.record_invalidation(key, 1);
                true
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache delete failed");
                self.metrics.record_error(key, "delete", e.kind());
                false
            }
        }
    }

    /// Remove every key under `prefix` in one call.
    pub async fn invalidate_pattern(&self, prefix: &str) -> usize {
        let Some(backend) = self.backend.as_ref() else {
            return 0;
        };

        match backend.scan_del(prefix).await {
            Ok(count) => {
                debug!(prefix = %prefix, deleted = count, "Cache prefix invalidation");
                self.metrics.record_invalidation(prefix, count);
                count
            }
            Err(e) => {
                warn!(prefix = %prefix, error = %e, "Cache prefix invalidation failed");
                self.metrics.record_error(prefix, "scan_delete", e.kind());
                0
            }
        }
    }
}
