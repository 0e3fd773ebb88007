/// Post handlers - HTTP endpoints for post operations
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::UserId;
use crate::services::{ContentChanges, FeedService, MutationService};

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub body: String,
    /// Image URL or video link
    pub media: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub body: Option<String>,
    /// Empty string removes the current media
    pub media: Option<String>,
}

/// Create a new post
pub async fn create_post(
    mutations: web::Data<MutationService>,
    user_id: UserId,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let item = mutations
        .create_content(user_id.0, &req.body, req.media.as_deref())
        .await?;

    Ok(HttpResponse::Created().json(item))
}

/// Get a single enriched post
pub async fn get_post(
    feed: web::Data<FeedService>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let item = feed.get_item(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(item))
}

/// Edit body and/or media of an owned post
pub async fn update_post(
    mutations: web::Data<MutationService>,
    post_id: web::Path<Uuid>,
    user_id: UserId,
    req: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let changes = ContentChanges {
        body: req.body,
        media: req.media,
    };
    let item = mutations
        .update_content(user_id.0, post_id.into_inner(), changes)
        .await?;

    Ok(HttpResponse::Ok().json(item))
}

/// Delete an owned post with its comments and replies
pub async fn delete_post(
    mutations: web::Data<MutationService>,
    post_id: web::Path<Uuid>,
    user_id: UserId,
) -> Result<HttpResponse> {
    mutations
        .delete_content(user_id.0, post_id.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn like_post(
    mutations: web::Data<MutationService>,
    post_id: web::Path<Uuid>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let summary = mutations.like(user_id.0, post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

pub async fn unlike_post(
    mutations: web::Data<MutationService>,
    post_id: web::Path<Uuid>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let summary = mutations.unlike(user_id.0, post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(summary))
}
