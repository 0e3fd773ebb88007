//! Redis cache backend
//!
//! Every command is bounded by `op_timeout` so a hung Redis degrades to a
//! miss instead of stalling the request.

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Pipeline};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

use crate::{CacheError, CacheOperations, CacheResult};

/// SCAN batch size for prefix invalidation
const SCAN_COUNT: usize = 100;

#[derive(Clone)]
pub struct RedisCache {
    redis: ConnectionManager,
    op_timeout: Duration,
}

impl RedisCache {
    pub fn new(redis: ConnectionManager, op_timeout: Duration) -> Self {
        Self { redis, op_timeout }
    }

    /// Open a managed connection. Fails if Redis is unreachable right now;
    /// callers fall back to [`crate::SharedCache::disabled`].
    pub async fn connect(redis_url: &str, op_timeout: Duration) -> CacheResult<Self> {
        let client = Client::open(redis_url)?;
        let manager = tokio::time::timeout(op_timeout * 10, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout(op_timeout * 10))??;

        info!("Redis cache connection established");
        Ok(Self::new(manager, op_timeout))
    }

    async fn bounded<F, T>(&self, fut: F) -> CacheResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .map_err(|_| CacheError::Timeout(self.op_timeout))?
            .map_err(CacheError::Redis)
    }
}

#[async_trait::async_trait]
impl CacheOperations for RedisCache {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.redis.clone();
        self.bounded(async move { conn.get::<_, Option<String>>(key).await })
            .await
    }

    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.redis.clone();
        // Redis rejects EX 0
        let secs = ttl.as_secs().max(1);
        self.bounded(async move { conn.set_ex::<_, _, ()>(key, value, secs).await })
            .await
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.redis.clone();
        self.bounded(async move { conn.del::<_, ()>(key).await })
            .await
    }

    async fn scan_del(&self, prefix: &str) -> CacheResult<usize> {
        let pattern = format!("{}*", prefix);
        let conn = self.redis.clone();
        let mut cursor: u64 = 0;
        let mut total_deleted = 0;

        loop {
            // Use SCAN instead of KEYS to avoid blocking
            let mut scan_conn = conn.clone();
            let scan_pattern = pattern.clone();
            let (next_cursor, keys): (u64, Vec<String>) = self
                .bounded(async move {
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&scan_pattern)
                        .arg("COUNT")
                        .arg(SCAN_COUNT)
                        .query_async(&mut scan_conn)
                        .await
                })
                .await?;

            if !keys.is_empty() {
                let mut pipe = Pipeline::new();
                for key in &keys {
                    pipe.del(key);
                }
                let mut del_conn = conn.clone();
                self.bounded(async move { pipe.query_async::<_, ()>(&mut del_conn).await })
                    .await?;

                total_deleted += keys.len();
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(pattern = %pattern, deleted = total_deleted, "Cache scan delete");
        Ok(total_deleted)
    }
}
