//! HTTP surface: authentication gate, status codes and JSON bodies.

mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use common::{token_for, TestApp};
use content_service::handlers;
use serde_json::{json, Value};
use std::sync::Arc;

macro_rules! init_app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::from($ctx.feed.clone()))
                .app_data(web::Data::from($ctx.mutations.clone()))
                .app_data(web::Data::from($ctx.hub.clone()))
                .configure(|cfg| handlers::configure_api(cfg, Arc::new($ctx.verifier.clone()))),
        )
        .await
    };
}

fn bearer(identity: uuid::Uuid) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(identity)))
}

#[actix_web::test]
async fn test_missing_credential_is_rejected_before_store_access() {
    let ctx = TestApp::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/api/v1/feed").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .set_json(json!({"body": "sneaky"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(ctx.store.call_count(), 0);
    assert_eq!(ctx.verifier.call_count(), 0);
}

#[actix_web::test]
async fn test_invalid_credential_is_rejected() {
    let ctx = TestApp::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/v1/feed")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.verifier.call_count(), 1);
    assert_eq!(ctx.store.call_count(), 0);
}

#[actix_web::test]
async fn test_identity_service_outage_is_unauthorized() {
    let ctx = TestApp::new();
    let alice = ctx.user("Alice");
    ctx.verifier.set_unavailable(true);
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/v1/feed")
        .insert_header(bearer(alice))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.store.call_count(), 0);
}

#[actix_web::test]
async fn test_create_then_read_feed() {
    let ctx = TestApp::new();
    let alice = ctx.user("Alice");
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(bearer(alice))
        .set_json(json!({
            "body": "hello pulse",
            "media": "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["owner"]["first_name"], "Alice");
    assert_eq!(created["media"]["kind"], "video");
    assert_eq!(
        created["media"]["embed_url"],
        "https://www.youtube.com/embed/dQw4w9WgXcQ"
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/feed")
        .insert_header(bearer(alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let feed: Value = test::read_body_json(resp).await;
    assert_eq!(feed["total_count"], 1);
    assert_eq!(feed["items"][0]["id"], created["id"]);
    assert_eq!(feed["items"][0]["body"], "hello pulse");
}

#[actix_web::test]
async fn test_token_query_parameter_is_accepted() {
    let ctx = TestApp::new();
    let alice = ctx.user("Alice");
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/users/{}/posts?access_token={}",
            alice,
            token_for(alice)
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let feed: Value = test::read_body_json(resp).await;
    assert_eq!(feed["total_count"], 0);
}

#[actix_web::test]
async fn test_double_like_returns_conflict() {
    let ctx = TestApp::new();
    let alice = ctx.user("Alice");
    let bob = ctx.user("Bob");
    let item = ctx
        .mutations
        .create_content(alice, "like me", None)
        .await
        .unwrap();
    let app = init_app!(ctx);
    let uri = format!("/api/v1/posts/{}/like", item.id);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(bob))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let summary: Value = test::read_body_json(resp).await;
    assert_eq!(summary["like_count"], 1);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(bob))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 409);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(bob))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let summary: Value = test::read_body_json(resp).await;
    assert_eq!(summary["like_count"], 0);
}

#[actix_web::test]
async fn test_foreign_delete_is_forbidden_with_json_body() {
    let ctx = TestApp::new();
    let alice = ctx.user("Alice");
    let bob = ctx.user("Bob");
    let item = ctx
        .mutations
        .create_content(alice, "mine", None)
        .await
        .unwrap();
    let app = init_app!(ctx);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/posts/{}", item.id))
        .insert_header(bearer(bob))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 403);
    assert!(body["error"].as_str().unwrap().starts_with("Forbidden"));
}

#[actix_web::test]
async fn test_comment_and_reply_routes() {
    let ctx = TestApp::new();
    let alice = ctx.user("Alice");
    let bob = ctx.user("Bob");
    let item = ctx
        .mutations
        .create_content(alice, "discuss", None)
        .await
        .unwrap();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/posts/{}/comments", item.id))
        .insert_header(bearer(bob))
        .set_json(json!({"body": "first!"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let comment: Value = test::read_body_json(resp).await;
    let comment_id = comment["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!(
            "/api/v1/posts/{}/comments/{}/replies",
            item.id, comment_id
        ))
        .insert_header(bearer(alice))
        .set_json(json!({"body": "thanks"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let reply: Value = test::read_body_json(resp).await;
    assert_eq!(reply["owner"]["first_name"], "Alice");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/posts/{}/comments/{}", item.id, comment_id))
        .insert_header(bearer(bob))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/posts/{}", item.id))
        .insert_header(bearer(alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let post: Value = test::read_body_json(resp).await;
    assert_eq!(post["comments"], json!([]));
}

#[actix_web::test]
async fn test_unknown_post_is_not_found() {
    let ctx = TestApp::new();
    let alice = ctx.user("Alice");
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/posts/{}", uuid::Uuid::new_v4()))
        .insert_header(bearer(alice))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
