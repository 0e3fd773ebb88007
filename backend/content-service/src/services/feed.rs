//! Feed aggregation
//!
//! ```text
//! GET feed
//!   1. cache lookup (feed:global or feed:{owner})   -> hit: return verbatim
//!   2. store read, newest first
//!   3. collect every owner identity (items, comments, replies)
//!   4. resolve each identity once, concurrently     -> placeholder on failure
//!   5. assemble, write back to the feed cache
//! ```
//!
//! A write-back is dropped if a mutation invalidated the namespace while the
//! read was in flight, so a stale assembly never outlives the invalidation
//! that should have removed it.

use shared_cache::{CacheKey, SharedCache};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

use super::ProfileResolver;
use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::metrics::feed::{
    FEED_READS_TOTAL, FEED_READ_DURATION_SECONDS, FEED_WRITEBACK_TOTAL,
};
use crate::models::{ContentItem, FeedItem};

/// Which feed a read asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    /// Every item, identical for all viewers
    Global,
    /// Items owned by one identity
    Owner(Uuid),
}

impl FeedScope {
    pub fn cache_key(&self) -> String {
        match self {
            FeedScope::Global => CacheKey::global_feed(),
            FeedScope::Owner(owner) => CacheKey::owner_feed(*owner),
        }
    }

    /// Metric label; owner identities stay out of label values.
    fn label(&self) -> &'static str {
        match self {
            FeedScope::Global => "global",
            FeedScope::Owner(_) => "owner",
        }
    }
}

pub struct FeedService {
    store: Arc<dyn ContentStore>,
    profiles: Arc<ProfileResolver>,
    cache: SharedCache,
    feed_ttl: Duration,
    max_items: i64,
    /// Bumped by every invalidation
    generation: AtomicU64,
}

impl FeedService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        profiles: Arc<ProfileResolver>,
        cache: SharedCache,
        feed_ttl: Duration,
        max_items: i64,
    ) -> Self {
        Self {
            store,
            profiles,
            cache,
            feed_ttl,
            max_items,
            generation: AtomicU64::new(0),
        }
    }

    /// Global feed, newest first. The same for every viewer.
    pub async fn get_feed(&self, viewer: Uuid) -> Result<Vec<FeedItem>> {
        debug!(%viewer, "Feed requested");
        self.read_scope(FeedScope::Global).await
    }

    /// Items owned by `owner`, newest first.
    pub async fn get_items_by_owner(&self, owner: Uuid) -> Result<Vec<FeedItem>> {
        self.read_scope(FeedScope::Owner(owner)).await
    }

    /// One enriched item, uncached.
    pub async fn get_item(&self, item_id: Uuid) -> Result<FeedItem> {
        let item = self
            .store
            .get(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", item_id)))?;
        Ok(self.enrich_item(&item).await)
    }

    async fn read_scope(&self, scope: FeedScope) -> Result<Vec<FeedItem>> {
        let started = Instant::now();
        let key = scope.cache_key();

        if let Some(items) = self.cache.get::<Vec<FeedItem>>(&key).await {
            record_read(scope, "cache", started);
            return Ok(items);
        }

        let generation = self.generation.load(Ordering::Acquire);

        let items = match scope {
            FeedScope::Global => self.store.list_recent(self.max_items).await?,
            FeedScope::Owner(owner) => self.store.list_by_owner(owner, self.max_items).await?,
        };
        let feed = self.enrich_items(&items).await;

        self.write_back(&key, &feed, generation).await;
        record_read(scope, "store", started);

        Ok(feed)
    }

    async fn write_back(&self, key: &str, feed: &[FeedItem], generation: u64) {
        if !self.cache.is_enabled() {
            return;
        }
        if self.generation.load(Ordering::Acquire) != generation {
            FEED_WRITEBACK_TOTAL.with_label_values(&["dropped_stale"]).inc();
            debug!(key = %key, "Feed changed during assembly, skipping cache write");
            return;
        }

        if !self.cache.set(key, feed, self.feed_ttl).await {
            FEED_WRITEBACK_TOTAL.with_label_values(&["failed"]).inc();
            return;
        }

        // An invalidation may have landed between the check and the write
        if self.generation.load(Ordering::Acquire) != generation {
            self.cache.invalidate(key).await;
            FEED_WRITEBACK_TOTAL.with_label_values(&["dropped_stale"]).inc();
            return;
        }
        FEED_WRITEBACK_TOTAL.with_label_values(&["stored"]).inc();
    }

    /// Two-phase enrichment: collect identities across all items, resolve
    /// each once, then assemble.
    pub async fn enrich_items(&self, items: &[ContentItem]) -> Vec<FeedItem> {
        let identities: BTreeSet<Uuid> = items
            .iter()
            .flat_map(|item| item.owner_identities())
            .collect();
        let profiles = self.profiles.resolve_many(identities).await;

        items
            .iter()
            .map(|item| FeedItem::assemble(item, &profiles))
            .collect()
    }

    pub async fn enrich_item(&self, item: &ContentItem) -> FeedItem {
        let profiles = self.profiles.resolve_many(item.owner_identities()).await;
        FeedItem::assemble(item, &profiles)
    }

    /// Drop every assembled feed. Returns the number of cache keys removed.
    pub async fn invalidate(&self) -> usize {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let removed = self
            .cache
            .invalidate_pattern(CacheKey::feed_namespace())
            .await;
        debug!(removed, "Feed cache invalidated");
        removed
    }
}

fn record_read(scope: FeedScope, source: &str, started: Instant) {
    let labels = [scope.label(), source];
    FEED_READS_TOTAL.with_label_values(&labels).inc();
    FEED_READ_DURATION_SECONDS
        .with_label_values(&labels)
        .observe(started.elapsed().as_secs_f64());
}
