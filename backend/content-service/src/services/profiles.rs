//! Profile resolution for enrichment
//!
//! Cache first, then a live lookup bounded by the enrichment timeout. Any
//! failure yields a placeholder; resolution itself never fails.

use futures::future::join_all;
use shared_cache::{CacheKey, SharedCache};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clients::{ClientError, ProfileStore};
use crate::metrics::feed::PROFILE_RESOLUTION_TOTAL;
use crate::models::{ProfileDirectory, ProfileSnapshot};

pub struct ProfileResolver {
    store: Arc<dyn ProfileStore>,
    cache: SharedCache,
    lookup_timeout: Duration,
    profile_ttl: Duration,
}

impl ProfileResolver {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        cache: SharedCache,
        lookup_timeout: Duration,
        profile_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            lookup_timeout,
            profile_ttl,
        }
    }

    pub async fn resolve(&self, identity: Uuid) -> ProfileSnapshot {
        let key = CacheKey::profile(identity);
        if let Some(snapshot) = self.cache.get::<ProfileSnapshot>(&key).await {
            PROFILE_RESOLUTION_TOTAL.with_label_values(&["cache"]).inc();
            return snapshot;
        }

        let lookup = tokio::time::timeout(self.lookup_timeout, self.store.get_profile(identity))
            .await
            .unwrap_or(Err(ClientError::Timeout));

        match lookup {
            Ok(snapshot) => {
                PROFILE_RESOLUTION_TOTAL.with_label_values(&["live"]).inc();
                self.cache.set(&key, &snapshot, self.profile_ttl).await;
                snapshot
            }
            Err(ClientError::NotFound) => {
                debug!(%identity, "Profile not found, using placeholder");
                PROFILE_RESOLUTION_TOTAL
                    .with_label_values(&["placeholder"])
                    .inc();
                ProfileSnapshot::placeholder(identity)
            }
            Err(e) => {
                warn!(%identity, error = %e, "Profile lookup failed, using placeholder");
                PROFILE_RESOLUTION_TOTAL
                    .with_label_values(&["placeholder"])
                    .inc();
                ProfileSnapshot::placeholder(identity)
            }
        }
    }

    /// Resolve each distinct identity once, concurrently.
    pub async fn resolve_many(&self, identities: BTreeSet<Uuid>) -> ProfileDirectory {
        join_all(identities.into_iter().map(|id| self.resolve(id)))
            .await
            .into_iter()
            .collect()
    }
}
