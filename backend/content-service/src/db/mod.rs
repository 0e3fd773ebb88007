/// Content store access layer
///
/// The store owns content documents. One item (with its comments, replies
/// and likes) is one document; writes to a single document are atomic and
/// there are no cross-document transactions.
///
/// - `PgContentStore`: PostgreSQL, one JSONB document per item
/// - `InMemoryContentStore`: process-local map for tests and development
use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::ContentItem;

pub mod content_repo;
pub mod memory;

pub use content_repo::{init_pool, PgContentStore, MIGRATOR};
pub use memory::InMemoryContentStore;

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn get(&self, item_id: Uuid) -> Result<Option<ContentItem>>;

    /// Newest first, at most `limit` items.
    async fn list_recent(&self, limit: i64) -> Result<Vec<ContentItem>>;

    /// Items owned by `owner_id`, newest first, at most `limit` items.
    async fn list_by_owner(&self, owner_id: Uuid, limit: i64) -> Result<Vec<ContentItem>>;

    async fn insert(&self, item: &ContentItem) -> Result<()>;

    /// Overwrite the stored document. Returns false if it no longer exists.
    async fn replace(&self, item: &ContentItem) -> Result<bool>;

    /// Returns false if there was nothing to delete.
    async fn delete(&self, item_id: Uuid) -> Result<bool>;

    /// Liveness check used by the readiness endpoint.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
