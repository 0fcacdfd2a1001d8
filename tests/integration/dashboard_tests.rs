//! Dashboard page and form tests against a mock backend.
//!
//! Tests verify:
//! - Pending posts are listed with links to their details
//! - Empty and failing backends render the empty state
//! - Post details render platform content and proxied images
//! - Generate and approve forms redirect with banner codes

use axum::http::StatusCode;
use httpmock::prelude::*;
use serde_json::json;
use tower::ServiceExt;

use super::test_utils::{
    body_string, client_for, get, location, post_form, post_json, post_list_json, test_router,
    valid_token, MockImageSource,
};

// =============================================================================
// Dashboard
// =============================================================================

#[tokio::test]
async fn test_dashboard_lists_pending_posts() {
    let server = MockServer::start_async().await;
    let token = valid_token();
    let bearer = format!("Bearer {}", token);
    let backend = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/posts")
                .query_param("status", "Generated")
                .header("authorization", bearer.as_str());
            then.status(200).json_body(post_list_json(vec![
                post_json("p-1", "Quantum Farming"),
                post_json("p-2", "Ocean Cleanup"),
            ]));
        })
        .await;
    let router = test_router(client_for(&server), MockImageSource::new());

    let response = router.oneshot(get("/", Some(&token))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Quantum Farming"));
    assert!(html.contains("Ocean Cleanup"));
    assert!(html.contains("/posts/p-1"));
    assert!(!html.contains("No posts found."));
    backend.assert_async().await;
}

#[tokio::test]
async fn test_dashboard_empty_state() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/posts");
            then.status(200).json_body(post_list_json(vec![]));
        })
        .await;
    let router = test_router(client_for(&server), MockImageSource::new());

    let token = valid_token();
    let response = router.oneshot(get("/", Some(&token))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("No posts found."));
}

#[tokio::test]
async fn test_dashboard_backend_failure_renders_empty_state() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/posts");
            then.status(500).body("internal error");
        })
        .await;
    let router = test_router(client_for(&server), MockImageSource::new());

    let token = valid_token();
    let response = router.oneshot(get("/", Some(&token))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("No posts found."));
}

#[tokio::test]
async fn test_dashboard_shows_banner() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/posts");
            then.status(200).json_body(post_list_json(vec![]));
        })
        .await;
    let router = test_router(client_for(&server), MockImageSource::new());

    let token = valid_token();
    let response = router
        .oneshot(get("/?notice=approved", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response)
        .await
        .contains("Post approved successfully!"));
}

// =============================================================================
// Post Details
// =============================================================================

#[tokio::test]
async fn test_post_detail_renders_platforms_and_images() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/post/id")
                .query_param("post_id", "p-1");
            then.status(200).json_body(json!({
                "message": "Post fetched",
                "data": post_json("p-1", "EV Charging")
            }));
        })
        .await;
    let router = test_router(client_for(&server), MockImageSource::new());

    let token = valid_token();
    let response = router
        .oneshot(get("/posts/p-1", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("EV Charging on LinkedIn"));
    assert!(html.contains("WhatsApp"));
    assert!(html.contains("/api/image/drive-1"));
    assert!(html.contains("/posts/p-1/approve"));
}

#[tokio::test]
async fn test_post_detail_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/post/id");
            then.status(404).json_body(json!({ "message": "Post not found" }));
        })
        .await;
    let router = test_router(client_for(&server), MockImageSource::new());

    let token = valid_token();
    let response = router
        .oneshot(get("/posts/missing", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_string(response).await.contains("could not be loaded"));
}

#[tokio::test]
async fn test_post_detail_backend_failure_is_bad_gateway() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/post/id");
            then.status(500);
        })
        .await;
    let router = test_router(client_for(&server), MockImageSource::new());

    let token = valid_token();
    let response = router
        .oneshot(get("/posts/p-1", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

// =============================================================================
// Forms
// =============================================================================

#[tokio::test]
async fn test_generate_redirects_with_notice() {
    let server = MockServer::start_async().await;
    let token = valid_token();
    let bearer = format!("Bearer {}", token);
    let webhook = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/generate-topic")
                .header("authorization", bearer.as_str())
                .json_body(json!({ "topics": "Solar Innovation", "image_generated": true }));
            then.status(200).json_body(json!({ "message": "Content generated" }));
        })
        .await;
    let router = test_router(client_for(&server), MockImageSource::new());

    let response = router
        .oneshot(post_form(
            "/generate",
            Some(&token),
            "topic=Solar+Innovation&image_generated=on",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?notice=generated");
    webhook.assert_async().await;
}

#[tokio::test]
async fn test_generate_blank_topic_skips_backend() {
    let server = MockServer::start_async().await;
    let webhook = server
        .mock_async(|when, then| {
            when.method(POST).path("/generate-topic");
            then.status(200).json_body(json!({}));
        })
        .await;
    let router = test_router(client_for(&server), MockImageSource::new());

    let token = valid_token();
    let response = router
        .oneshot(post_form("/generate", Some(&token), "topic=+++"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?error=topic");
    assert_eq!(webhook.calls_async().await, 0);
}

#[tokio::test]
async fn test_generate_failure_redirects_with_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/generate-topic");
            then.status(500).json_body(json!({ "detail": "LLM unavailable" }));
        })
        .await;
    let router = test_router(client_for(&server), MockImageSource::new());

    let token = valid_token();
    let response = router
        .oneshot(post_form("/generate", Some(&token), "topic=Solar"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?error=generate");
}

#[tokio::test]
async fn test_approve_redirects_with_notice() {
    let server = MockServer::start_async().await;
    let webhook = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/approve")
                .json_body(json!({ "postId": "p-1", "status": "approved" }));
            then.status(200).json_body(json!({ "message": "Post approved" }));
        })
        .await;
    let router = test_router(client_for(&server), MockImageSource::new());

    let token = valid_token();
    let response = router
        .oneshot(post_form("/posts/p-1/approve", Some(&token), ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?notice=approved");
    webhook.assert_async().await;
}

#[tokio::test]
async fn test_approve_with_empty_reply_redirects_with_notice() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/approve");
            then.status(204);
        })
        .await;
    let router = test_router(client_for(&server), MockImageSource::new());

    let token = valid_token();
    let response = router
        .oneshot(post_form("/posts/p-1/approve", Some(&token), ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?notice=approved");
}

#[tokio::test]
async fn test_approve_unauthorized_signs_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/approve");
            then.status(401);
        })
        .await;
    let router = test_router(client_for(&server), MockImageSource::new());

    let token = valid_token();
    let response = router
        .oneshot(post_form("/posts/p-1/approve", Some(&token), ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/signin");
}
