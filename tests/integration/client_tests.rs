//! Client layer tests against a mock backend.
//!
//! Tests verify:
//! - Bearer token attachment from the session cookie, skipped on sign-in
//! - 401 responses clear the cookie and navigate to sign-in once
//! - Rebinding and releasing the interceptor pair
//! - Sign-in requests stay unauthenticated after a 401 sign-out
//! - Mutation error normalization and body-less successes
//! - Server-side queries with an explicit token

use std::sync::Arc;

use httpmock::prelude::*;
use serde_json::json;

use agent_dashboard::client::{
    query_fetch, query_fetch_server, ApiBase, AuthInterceptors, CookieStore, Location, NoParams,
    ServerQueryResult, NO_PARAMS, SESSION_COOKIE, SIGN_IN_PATH,
};
use agent_dashboard::error::ApiError;
use agent_dashboard::posts::{
    fetch_posts_server, generate_topic, update_post_status, GenerateTopic, MessageResult,
    MutationOptions, PostData, PostStatus, UpdatePostStatus, MISSING_POST_ID,
};

use super::test_utils::{client_for, post_json, post_list_json, unreachable_urls};

/// Cookie store holding `token` as the session.
fn cookies_with(token: &str) -> CookieStore {
    let cookies = CookieStore::new();
    cookies.set(SESSION_COOKIE, token);
    cookies
}

// =============================================================================
// Bearer Token Interceptor
// =============================================================================

#[tokio::test]
async fn test_bearer_token_attached_from_cookie() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/whoami")
                .header("authorization", "Bearer tok-123");
            then.status(200).json_body(json!({ "ok": true }));
        })
        .await;

    let ctx = client_for(&server);
    let location = Arc::new(Location::new("/"));
    let auth = AuthInterceptors::new(ctx.interceptors(), cookies_with("tok-123"));
    auth.on_path_change(&location.current());
    auth.on_navigator_change(location.clone());

    let body: serde_json::Value = query_fetch(&ctx, ApiBase::Main, "/api/v1/whoami", NO_PARAMS)
        .await
        .unwrap();

    assert_eq!(body["ok"], true);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_bearer_token_skipped_on_signin_path() {
    let server = MockServer::start_async().await;
    let with_auth = server
        .mock_async(|when, then| {
            when.method(GET).path("/login").header_exists("authorization");
            then.status(500);
        })
        .await;
    let without_auth = server
        .mock_async(|when, then| {
            when.method(GET).path("/login");
            then.status(200).json_body(json!({}));
        })
        .await;

    let ctx = client_for(&server);
    let auth = AuthInterceptors::new(ctx.interceptors(), cookies_with("tok-123"));
    auth.on_path_change(SIGN_IN_PATH);

    let result: Result<serde_json::Value, ApiError> =
        query_fetch(&ctx, ApiBase::Public, "/login", NO_PARAMS).await;

    assert!(result.is_ok());
    assert_eq!(with_auth.calls_async().await, 0);
    assert_eq!(without_auth.calls_async().await, 1);
}

#[tokio::test]
async fn test_bearer_token_follows_path_changes() {
    let server = MockServer::start_async().await;
    let authed = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/ping")
                .header("authorization", "Bearer tok");
            then.status(200).json_body(json!({}));
        })
        .await;

    let ctx = client_for(&server);
    let auth = AuthInterceptors::new(ctx.interceptors(), cookies_with("tok"));

    assert!(auth.on_path_change(SIGN_IN_PATH));
    assert!(!auth.on_path_change(SIGN_IN_PATH));
    assert!(auth.on_path_change("/"));
    assert_eq!(ctx.interceptors().request().len(), 1);

    let _: serde_json::Value = query_fetch(&ctx, ApiBase::Main, "/ping", NO_PARAMS)
        .await
        .unwrap();
    assert_eq!(authed.calls_async().await, 1);
}

#[tokio::test]
async fn test_default_header_from_set_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/ping")
                .header("authorization", "Bearer direct");
            then.status(200).json_body(json!({}));
        })
        .await;

    let ctx = client_for(&server);
    ctx.set_token(Some("direct"));

    let _: serde_json::Value = query_fetch(&ctx, ApiBase::Webhook, "/ping", NO_PARAMS)
        .await
        .unwrap();
    mock.assert_async().await;
}

// =============================================================================
// Unauthorized Interceptor
// =============================================================================

#[tokio::test]
async fn test_unauthorized_clears_cookie_and_navigates_once() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/posts");
            then.status(401)
                .json_body(json!({ "status": 401, "message": "Token expired" }));
        })
        .await;

    let ctx = client_for(&server);
    let cookies = cookies_with("stale");
    let location = Arc::new(Location::new("/"));
    let auth = AuthInterceptors::new(ctx.interceptors(), cookies.clone());
    auth.on_path_change("/");
    auth.on_navigator_change(location.clone());

    let err = query_fetch::<serde_json::Value, NoParams>(&ctx, ApiBase::Main, "/api/v1/posts", None)
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert!(!cookies.contains(SESSION_COOKIE));
    assert_eq!(location.current(), SIGN_IN_PATH);
    assert_eq!(location.history(), vec![SIGN_IN_PATH.to_string()]);
}

#[tokio::test]
async fn test_other_errors_keep_session() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/broken");
            then.status(500).body("boom");
        })
        .await;

    let ctx = client_for(&server);
    let cookies = cookies_with("tok");
    let location = Arc::new(Location::new("/"));
    let auth = AuthInterceptors::new(ctx.interceptors(), cookies.clone());
    auth.on_navigator_change(location.clone());

    let err = query_fetch::<serde_json::Value, NoParams>(&ctx, ApiBase::Main, "/broken", None)
        .await
        .unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
    assert!(cookies.contains(SESSION_COOKIE));
    assert!(location.history().is_empty());
}

#[tokio::test]
async fn test_released_interceptors_stop_reacting() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/secret");
            then.status(401);
        })
        .await;

    let ctx = client_for(&server);
    let cookies = cookies_with("tok");
    let location = Arc::new(Location::new("/"));
    {
        let auth = AuthInterceptors::new(ctx.interceptors(), cookies.clone());
        auth.on_path_change("/");
        auth.on_navigator_change(location.clone());
    }

    assert!(ctx.interceptors().request().is_empty());
    assert!(ctx.interceptors().response().is_empty());

    let _ = query_fetch::<serde_json::Value, NoParams>(&ctx, ApiBase::Main, "/secret", None).await;
    assert!(cookies.contains(SESSION_COOKIE));
    assert!(location.history().is_empty());
}

#[tokio::test]
async fn test_navigator_change_replaces_response_interceptor() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/secret");
            then.status(401);
        })
        .await;

    let ctx = client_for(&server);
    let first = Arc::new(Location::new("/"));
    let second = Arc::new(Location::new("/posts/1"));
    let auth = AuthInterceptors::new(ctx.interceptors(), cookies_with("tok"));

    assert!(auth.on_navigator_change(first.clone()));
    assert!(auth.on_navigator_change(second.clone()));
    assert_eq!(ctx.interceptors().response().len(), 1);

    let _ = query_fetch::<serde_json::Value, NoParams>(&ctx, ApiBase::Main, "/secret", None).await;
    assert!(first.history().is_empty());
    assert_eq!(second.visits(SIGN_IN_PATH), 1);
}

#[tokio::test]
async fn test_no_token_sent_on_signin_after_sign_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/secret");
            then.status(401);
        })
        .await;
    let with_auth = server
        .mock_async(|when, then| {
            when.method(GET).path("/login").header_exists("authorization");
            then.status(500);
        })
        .await;
    let without_auth = server
        .mock_async(|when, then| {
            when.method(GET).path("/login");
            then.status(200).json_body(json!({}));
        })
        .await;

    let ctx = client_for(&server);
    let cookies = cookies_with("tok");
    let location = Arc::new(Location::new("/"));
    let auth = AuthInterceptors::new(ctx.interceptors(), cookies.clone());
    auth.on_path_change(&location.current());
    auth.on_navigator_change(location.clone());

    let _ = query_fetch::<serde_json::Value, NoParams>(&ctx, ApiBase::Main, "/secret", None).await;
    assert_eq!(location.current(), SIGN_IN_PATH);
    assert_eq!(auth.current_path(), SIGN_IN_PATH);

    cookies.set(SESSION_COOKIE, "new");
    let result: Result<serde_json::Value, ApiError> =
        query_fetch(&ctx, ApiBase::Public, "/login", NO_PARAMS).await;

    assert!(result.is_ok());
    assert_eq!(with_auth.calls_async().await, 0);
    assert_eq!(without_auth.calls_async().await, 1);
}

// =============================================================================
// Mutations
// =============================================================================

#[tokio::test]
async fn test_mutation_succeeds_without_body() {
    let server = MockServer::start_async().await;
    let approve = server
        .mock_async(|when, then| {
            when.method(PUT).path("/approve");
            then.status(200);
        })
        .await;
    let generate = server
        .mock_async(|when, then| {
            when.method(POST).path("/generate-topic");
            then.status(204);
        })
        .await;

    let ctx = client_for(&server);
    let approved = update_post_status(
        &ctx,
        &UpdatePostStatus::approve("p-1"),
        MutationOptions::default(),
    )
    .await
    .unwrap();
    let generated = generate_topic(&ctx, &GenerateTopic::new("x"), MutationOptions::default())
        .await
        .unwrap();

    assert_eq!(approved, MessageResult::default());
    assert_eq!(generated, MessageResult::default());
    approve.assert_async().await;
    generate.assert_async().await;
}

#[tokio::test]
async fn test_mutation_succeeds_with_plain_text_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/approve");
            then.status(200).body("Accepted");
        })
        .await;

    let ctx = client_for(&server);
    let result = update_post_status(
        &ctx,
        &UpdatePostStatus::approve("p-1"),
        MutationOptions::default(),
    )
    .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_mutation_detail_kept_beside_other_fields() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/generate-topic");
            then.status(409)
                .json_body(json!({ "status": "error", "detail": "Topic already queued" }));
        })
        .await;

    let ctx = client_for(&server);
    let err = generate_topic(&ctx, &GenerateTopic::new("x"), MutationOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.status, 409);
    assert_eq!(err.detail, "Topic already queued");
}

#[tokio::test]
async fn test_generate_topic_posts_json_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/generate-topic")
                .header("content-type", "application/json")
                .json_body(json!({ "topics": "EV Charging", "image_generated": true }));
            then.status(200)
                .json_body(json!({ "status": 200, "message": "Content generated" }));
        })
        .await;

    let ctx = client_for(&server);
    let input = GenerateTopic::new("EV Charging").with_image(true);
    let result = generate_topic(&ctx, &input, MutationOptions::default())
        .await
        .unwrap();

    assert_eq!(result.message, "Content generated");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_mutation_error_uses_backend_detail() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/approve");
            then.status(422)
                .json_body(json!({ "detail": "Post already approved" }));
        })
        .await;

    let ctx = client_for(&server);
    let err = update_post_status(
        &ctx,
        &UpdatePostStatus::approve("p-1"),
        MutationOptions::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status, 422);
    assert_eq!(err.detail, "Post already approved");
}

#[tokio::test]
async fn test_mutation_error_defaults_without_detail() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/generate-topic");
            then.status(503).body("upstream down");
        })
        .await;

    let ctx = client_for(&server);
    let err = generate_topic(&ctx, &GenerateTopic::new("x"), MutationOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.status, 503);
    assert_eq!(err.detail, "Something went wrong");
}

#[tokio::test]
async fn test_mutation_error_without_response() {
    let ctx = agent_dashboard::client::ClientContext::new(&unreachable_urls()).unwrap();
    let err = generate_topic(&ctx, &GenerateTopic::new("x"), MutationOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.status, 500);
    assert_eq!(err.detail, "Something went wrong");
}

#[tokio::test]
async fn test_update_status_sends_approved() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/approve")
                .json_body(json!({ "postId": "p-9", "status": "approved" }));
            then.status(200).json_body(json!({ "message": "Post approved" }));
        })
        .await;

    let ctx = client_for(&server);
    let result = update_post_status(
        &ctx,
        &UpdatePostStatus::approve("p-9"),
        MutationOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.message, "Post approved");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_status_blank_id_never_sent() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.path("/approve");
            then.status(200).json_body(json!({}));
        })
        .await;

    let ctx = client_for(&server);
    let seen = Arc::new(parking_lot::Mutex::new(None));
    let seen_in_callback = Arc::clone(&seen);
    let options = MutationOptions::<MessageResult>::new().on_error(move |err| {
        *seen_in_callback.lock() = Some(err.status);
    });

    let err = update_post_status(&ctx, &UpdatePostStatus::approve("  "), options)
        .await
        .unwrap_err();

    assert_eq!(err.status, 400);
    assert_eq!(err.detail, MISSING_POST_ID);
    assert_eq!(*seen.lock(), Some(400));
    assert_eq!(mock.calls_async().await, 0);
}

// =============================================================================
// Server-side Queries
// =============================================================================

#[tokio::test]
async fn test_server_query_attaches_explicit_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/posts")
                .query_param("status", "Generated")
                .header("authorization", "Bearer server-token");
            then.status(200)
                .json_body(post_list_json(vec![post_json("p-1", "Solar")]));
        })
        .await;

    let ctx = client_for(&server);
    let result = fetch_posts_server(&ctx, &PostStatus::Generated, Some("server-token")).await;

    assert!(!result.is_error);
    let posts = result.data.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].topic, "Solar");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_query_reports_unauthorized() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/post/id");
            then.status(401).json_body(json!({
                "exceptionName": "UnauthorizedException",
                "message": "Invalid token",
                "status": 401
            }));
        })
        .await;

    let ctx = client_for(&server);
    let result: ServerQueryResult<PostData> = query_fetch_server(
        &ctx,
        ApiBase::Main,
        "/api/v1/post/id",
        Some(&[("post_id", "p-1")]),
        Some("bad"),
    )
    .await;

    assert!(result.is_error);
    assert!(result.data.is_none());
    assert!(result.is_unauthorized());
    let error = result.error.unwrap();
    assert_eq!(error.message.as_deref(), Some("Invalid token"));
    assert_eq!(error.exception_name.as_deref(), Some("UnauthorizedException"));
}

#[tokio::test]
async fn test_server_query_decode_failure_is_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/posts");
            then.status(200).body("<html>not json</html>");
        })
        .await;

    let ctx = client_for(&server);
    let result = fetch_posts_server(&ctx, &PostStatus::Generated, None).await;

    assert!(result.is_error);
    assert!(result.status.is_none());
    assert!(result.error.is_none());
}
