/// Comment handlers - HTTP endpoints for comments and their replies
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::UserId;
use crate::services::MutationService;

/// Request body for creating a comment or reply
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
}

/// Create a new comment
pub async fn create_comment(
    mutations: web::Data<MutationService>,
    post_id: web::Path<Uuid>,
    user_id: UserId,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let comment = mutations
        .add_comment(user_id.0, post_id.into_inner(), &req.body)
        .await?;

    Ok(HttpResponse::Created().json(comment))
}

/// Delete a comment
pub async fn delete_comment(
    mutations: web::Data<MutationService>,
    path: web::Path<(Uuid, Uuid)>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    mutations
        .delete_comment(user_id.0, post_id, comment_id)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Reply to a comment
pub async fn create_reply(
    mutations: web::Data<MutationService>,
    path: web::Path<(Uuid, Uuid)>,
    user_id: UserId,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let reply = mutations
        .add_reply(user_id.0, post_id, comment_id, &req.body)
        .await?;

    Ok(HttpResponse::Created().json(reply))
}

/// Delete a reply
pub async fn delete_reply(
    mutations: web::Data<MutationService>,
    path: web::Path<(Uuid, Uuid, Uuid)>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let (post_id, comment_id, reply_id) = path.into_inner();
    mutations
        .delete_reply(user_id.0, post_id, comment_id, reply_id)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
