use actix_web::{web, HttpResponse};
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::UserId;
use crate::models::FeedItem;
use crate::services::FeedService;

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub items: Vec<FeedItem>,
    pub total_count: usize,
}

impl From<Vec<FeedItem>> for FeedResponse {
    fn from(items: Vec<FeedItem>) -> Self {
        Self {
            total_count: items.len(),
            items,
        }
    }
}

/// Global feed, newest first
pub async fn get_feed(
    feed: web::Data<FeedService>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let items = feed.get_feed(user_id.0).await?;
    Ok(HttpResponse::Ok().json(FeedResponse::from(items)))
}

/// Posts by one owner, newest first
pub async fn get_user_posts(
    feed: web::Data<FeedService>,
    owner_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let items = feed.get_items_by_owner(owner_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(FeedResponse::from(items)))
}
