/// HTTP handlers for content-related endpoints
///
/// This module contains handlers for:
/// - Feed: global and per-owner enriched feeds
/// - Posts: create, read, update, delete, like, unlike
/// - Comments: comments and replies on a post
/// - Events: WebSocket stream of domain events
pub mod comments;
pub mod events;
pub mod feed;
pub mod posts;

use actix_web::web;
use std::sync::Arc;

use crate::clients::IdentityVerifier;
use crate::middleware::IdentityAuth;

// Re-export handler functions at module level
pub use comments::{create_comment, create_reply, delete_comment, delete_reply};
pub use events::events_ws;
pub use feed::{get_feed, get_user_posts};
pub use posts::{create_post, delete_post, get_post, like_post, unlike_post, update_post};

/// Register every authenticated `/api/v1` route.
///
/// Register health routes before calling this: the scope claims every path
/// under `/api/v1`.
pub fn configure_api(cfg: &mut web::ServiceConfig, verifier: Arc<dyn IdentityVerifier>) {
    cfg.service(
        web::scope("/api/v1")
            .wrap(IdentityAuth::new(verifier))
            .route("/feed", web::get().to(get_feed))
            .route("/events", web::get().to(events_ws))
            .route("/users/{owner_id}/posts", web::get().to(get_user_posts))
            .service(
                web::scope("/posts")
                    .service(web::resource("").route(web::post().to(create_post)))
                    .service(
                        web::resource("/{post_id}")
                            .route(web::get().to(get_post))
                            .route(web::patch().to(update_post))
                            .route(web::delete().to(delete_post)),
                    )
                    .service(
                        web::resource("/{post_id}/like")
                            .route(web::post().to(like_post))
                            .route(web::delete().to(unlike_post)),
                    )
                    .route("/{post_id}/comments", web::post().to(create_comment))
                    .route(
                        "/{post_id}/comments/{comment_id}",
                        web::delete().to(delete_comment),
                    )
                    .route(
                        "/{post_id}/comments/{comment_id}/replies",
                        web::post().to(create_reply),
                    )
                    .route(
                        "/{post_id}/comments/{comment_id}/replies/{reply_id}",
                        web::delete().to(delete_reply),
                    ),
            ),
    );
}
