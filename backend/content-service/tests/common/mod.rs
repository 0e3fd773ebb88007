//! Shared fixtures for the integration tests.

#![allow(dead_code)]

pub mod mock_clients;

use async_trait::async_trait;
use content_service::db::{ContentStore, InMemoryContentStore};
use content_service::error::Result;
use content_service::models::ContentItem;
use content_service::realtime::EventHub;
use content_service::services::{FeedService, MutationService, ProfileResolver};
use shared_cache::SharedCache;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use uuid::Uuid;

pub use mock_clients::{token_for, MockIdentityVerifier, MockProfileStore};

pub const ENRICHMENT_TIMEOUT: Duration = Duration::from_millis(100);
pub const FEED_MAX_ITEMS: i64 = 500;

/// Pauses one `list_recent` call after it has read the store.
#[derive(Clone, Default)]
pub struct ListGate {
    /// Signalled once the held read has its snapshot
    pub entered: Arc<Notify>,
    /// Signal to let the held read return
    pub release: Arc<Notify>,
}

/// Wraps the in-memory store, counts every call and can be told to fail
/// writes or hold a listing mid-flight.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryContentStore,
    calls: AtomicUsize,
    fail_writes: AtomicBool,
    list_gate: Mutex<Option<ListGate>>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Writes fail as if the database were unreachable.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Hold the next `list_recent` until the returned gate is released.
    pub fn hold_next_list(&self) -> ListGate {
        let gate = ListGate::default();
        *self.list_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut.into());
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for CountingStore {
    async fn get(&self, item_id: Uuid) -> Result<Option<ContentItem>> {
        self.hit();
        self.inner.get(item_id).await
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<ContentItem>> {
        self.hit();
        let items = self.inner.list_recent(limit).await?;

        let gate = self.list_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        Ok(items)
    }

    async fn list_by_owner(&self, owner_id: Uuid, limit: i64) -> Result<Vec<ContentItem>> {
        self.hit();
        self.inner.list_by_owner(owner_id, limit).await
    }

    async fn insert(&self, item: &ContentItem) -> Result<()> {
        self.hit();
        self.check_write()?;
        self.inner.insert(item).await
    }

    async fn replace(&self, item: &ContentItem) -> Result<bool> {
        self.hit();
        self.check_write()?;
        self.inner.replace(item).await
    }

    async fn delete(&self, item_id: Uuid) -> Result<bool> {
        self.hit();
        self.check_write()?;
        self.inner.delete(item_id).await
    }
}

/// Fully wired service graph over in-process collaborators.
pub struct TestApp {
    pub store: Arc<CountingStore>,
    pub cache: SharedCache,
    pub profile_store: MockProfileStore,
    pub verifier: MockIdentityVerifier,
    pub profiles: Arc<ProfileResolver>,
    pub feed: Arc<FeedService>,
    pub mutations: Arc<MutationService>,
    pub hub: Arc<EventHub>,
}

impl TestApp {
    /// In-memory cache backend.
    pub fn new() -> Self {
        Self::with_cache(SharedCache::in_memory())
    }

    /// No cache at all; every read goes to the store.
    pub fn without_cache() -> Self {
        Self::with_cache(SharedCache::disabled())
    }

    pub fn with_cache(cache: SharedCache) -> Self {
        let store = Arc::new(CountingStore::new());
        let profile_store = MockProfileStore::new();
        let verifier = MockIdentityVerifier::new();

        let profiles = Arc::new(ProfileResolver::new(
            Arc::new(profile_store.clone()),
            cache.clone(),
            ENRICHMENT_TIMEOUT,
            Duration::from_secs(shared_cache::ttl::PROFILE),
        ));
        let feed = Arc::new(FeedService::new(
            store.clone(),
            profiles.clone(),
            cache.clone(),
            Duration::from_secs(shared_cache::ttl::FEED),
            FEED_MAX_ITEMS,
        ));
        let hub = Arc::new(EventHub::new());
        let mutations = Arc::new(MutationService::new(
            store.clone(),
            feed.clone(),
            profiles.clone(),
            hub.clone(),
        ));

        Self {
            store,
            cache,
            profile_store,
            verifier,
            profiles,
            feed,
            mutations,
            hub,
        }
    }

    /// Register a user with a resolvable profile.
    pub fn user(&self, first_name: &str) -> Uuid {
        self.profile_store.add(first_name)
    }
}
