use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::Row;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use super::ContentStore;
use crate::error::Result;
use crate::models::ContentItem;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connect and bring the schema up to date.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .test_before_acquire(true)
        .connect(database_url)
        .await?;

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;

    info!(max_connections, "Content store pool ready");
    Ok(pool)
}

#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn decode_rows(rows: Vec<sqlx::postgres::PgRow>) -> Result<Vec<ContentItem>> {
    rows.into_iter()
        .map(|row| {
            let Json(item): Json<ContentItem> = row.try_get("document")?;
            Ok(item)
        })
        .collect()
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn get(&self, item_id: Uuid) -> Result<Option<ContentItem>> {
        let row = sqlx::query(
            r#"
            SELECT document
            FROM content_items
            WHERE id = $1
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let Json(item): Json<ContentItem> = row.try_get("document")?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<ContentItem>> {
        let rows = sqlx::query(
            r#"
            SELECT document
            FROM content_items
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        decode_rows(rows)
    }

    async fn list_by_owner(&self, owner_id: Uuid, limit: i64) -> Result<Vec<ContentItem>> {
        let rows = sqlx::query(
            r#"
            SELECT document
            FROM content_items
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        decode_rows(rows)
    }

    async fn insert(&self, item: &ContentItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO content_items (id, owner_id, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(item.id)
        .bind(item.owner_id)
        .bind(Json(item))
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn replace(&self, item: &ContentItem) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE content_items
            SET document = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(item.id)
        .bind(Json(item))
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, item_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM content_items WHERE id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
