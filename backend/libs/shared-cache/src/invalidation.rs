//! Cross-service cache invalidation over Redis Pub/Sub
//!
//! ```text
//! profile-service:
//!   1. Update profile in its own store
//!   2. PUBLISH cache:invalidate {"target": {"kind": "profile", "identity": "..."}}
//!      ↓
//! Redis Pub/Sub (broadcast to all subscribers)
//!      ↓
//! content-service:
//!   3. Receive message
//!   4. DEL profile:{identity}, then drop the feed:* namespace because
//!      assembled feeds embed that profile
//! ```

use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{CacheKey, SharedCache};

/// Default Redis channel for cache invalidation
pub const DEFAULT_CHANNEL: &str = "cache:invalidate";

#[derive(Error, Debug)]
pub enum InvalidationError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

type Result<T> = std::result::Result<T, InvalidationError>;

/// What a message asks subscribers to drop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvalidationTarget {
    /// A single profile changed; its snapshot and every feed embedding it are stale.
    Profile { identity: Uuid },
    /// Every assembled feed is stale.
    FeedNamespace,
}

/// Cache invalidation message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationMessage {
    pub message_id: Uuid,
    pub target: InvalidationTarget,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub source_service: String,
}

impl InvalidationMessage {
    pub fn new(target: InvalidationTarget, source_service: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            target,
            timestamp: chrono::Utc::now(),
            source_service: source_service.into(),
        }
    }

    pub fn profile(identity: Uuid, source_service: impl Into<String>) -> Self {
        Self::new(InvalidationTarget::Profile { identity }, source_service)
    }

    pub fn feed_namespace(source_service: impl Into<String>) -> Self {
        Self::new(InvalidationTarget::FeedNamespace, source_service)
    }
}

/// Apply a received message to the local view of the shared cache.
///
/// Returns the number of keys removed.
pub async fn apply(cache: &SharedCache, msg: &InvalidationMessage) -> usize {
    match &msg.target {
        InvalidationTarget::Profile { identity } => {
            let profile_removed = cache.invalidate(&CacheKey::profile(*identity)).await;
            let feeds_removed = cache.invalidate_pattern(CacheKey::feed_namespace()).await;
            usize::from(profile_removed) + feeds_removed
        }
        InvalidationTarget::FeedNamespace => {
            cache.invalidate_pattern(CacheKey::feed_namespace()).await
        }
    }
}

/// Publisher for cache invalidation events
#[derive(Clone)]
pub struct InvalidationPublisher {
    client: ConnectionManager,
    channel: String,
    service_name: String,
}

impl InvalidationPublisher {
    pub async fn new(redis_url: &str, service_name: impl Into<String>) -> Result<Self> {
        Self::with_channel(redis_url, service_name, DEFAULT_CHANNEL).await
    }

    pub async fn with_channel(
        redis_url: &str,
        service_name: impl Into<String>,
        channel: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self {
            client: connection,
            channel: channel.into(),
            service_name: service_name.into(),
        })
    }

    /// Publish invalidation message
    ///
    /// Returns number of subscribers that received the message
    pub async fn publish(&self, msg: &InvalidationMessage) -> Result<usize> {
        let payload = serde_json::to_string(msg)?;

        let mut conn = self.client.clone();
        let subscriber_count: usize = conn.publish(&self.channel, payload).await?;

        debug!(
            message_id = %msg.message_id,
            target = ?msg.target,
            subscribers = subscriber_count,
            "Invalidation message published"
        );

        Ok(subscriber_count)
    }

    pub async fn invalidate_profile(&self, identity: Uuid) -> Result<usize> {
        self.publish(&InvalidationMessage::profile(identity, self.service_name.clone()))
            .await
    }

    pub async fn invalidate_feeds(&self) -> Result<usize> {
        self.publish(&InvalidationMessage::feed_namespace(self.service_name.clone()))
            .await
    }
}

/// Subscriber for cache invalidation events
pub struct InvalidationSubscriber {
    client: Client,
    channel: String,
}

impl InvalidationSubscriber {
    pub fn new(redis_url: &str) -> Result<Self> {
        Self::with_channel(redis_url, DEFAULT_CHANNEL)
    }

    pub fn with_channel(redis_url: &str, channel: impl Into<String>) -> Result<Self> {
        let client = Client::open(redis_url)?;
        Ok(Self {
            client,
            channel: channel.into(),
        })
    }

    /// Subscribe and run `callback` for every well-formed message on a
    /// background task. Malformed payloads are logged and skipped.
    pub async fn subscribe<F, Fut>(&self, callback: F) -> Result<JoinHandle<()>>
    where
        F: Fn(InvalidationMessage) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(&self.channel).await?;

        info!(channel = %self.channel, "Subscribed to invalidation events");

        let callback = Arc::new(callback);

        let handle = tokio::spawn(async move {
            let mut stream = pubsub.on_message();

            while let Some(msg) = stream.next().await {
                let payload = match msg.get_payload::<String>() {
                    Ok(p) => p,
                    Err(e) => {
                        error!(error = ?e, "Failed to get message payload");
                        continue;
                    }
                };

                let invalidation_msg: InvalidationMessage = match serde_json::from_str(&payload) {
                    Ok(m) => m,
                    Err(e) => {
                        error!(error = ?e, payload = %payload, "Failed to deserialize message");
                        continue;
                    }
                };

                debug!(
                    message_id = %invalidation_msg.message_id,
                    target = ?invalidation_msg.target,
                    source = %invalidation_msg.source_service,
                    "Received invalidation message"
                );

                callback(invalidation_msg).await;
            }

            warn!("Invalidation subscription ended");
        });

        Ok(handle)
    }

    /// Subscribe and apply every message to `cache`.
    pub async fn subscribe_cache(&self, cache: SharedCache) -> Result<JoinHandle<()>> {
        self.subscribe(move |msg| {
            let cache = cache.clone();
            async move {
                let removed = apply(&cache, &msg).await;
                debug!(message_id = %msg.message_id, removed, "Invalidation applied");
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_message_wire_format() {
        let identity = Uuid::new_v4();
        let msg = InvalidationMessage::profile(identity, "profile-service");

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["target"]["kind"], "profile");
        assert_eq!(json["target"]["identity"], identity.to_string());
        assert_eq!(json["source_service"], "profile-service");

        let decoded: InvalidationMessage = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.target, InvalidationTarget::Profile { identity });
    }

    #[test]
    fn test_feed_namespace_message() {
        let msg = InvalidationMessage::feed_namespace("content-service");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"kind\":\"feed_namespace\""));
    }

    #[tokio::test]
    async fn test_apply_profile_drops_profile_and_feeds() {
        let cache = SharedCache::in_memory();
        let identity = Uuid::new_v4();
        let other = Uuid::new_v4();
        let ttl = Duration::from_secs(60);

        cache.set(&CacheKey::profile(identity), &"a", ttl).await;
        cache.set(&CacheKey::profile(other), &"b", ttl).await;
        cache.set(&CacheKey::global_feed(), &"feed", ttl).await;
        cache.set(&CacheKey::owner_feed(other), &"feed", ttl).await;

        let removed = apply(&cache, &InvalidationMessage::profile(identity, "test")).await;
        assert_eq!(removed, 3);
        assert_eq!(cache.get::<String>(&CacheKey::profile(identity)).await, None);
        assert_eq!(cache.get::<String>(&CacheKey::global_feed()).await, None);
        assert_eq!(
            cache.get::<String>(&CacheKey::profile(other)).await,
            Some("b".to_string())
        );
    }
}
