//! Image proxy tests.
//!
//! Tests verify:
//! - Images stream through with upstream content type and long-lived caching
//! - Missing ids are rejected before reaching the image host
//! - Upstream failures keep their status; unreachable hosts map to 404
//! - The proxy needs no session

use axum::http::{header, StatusCode};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use tower::ServiceExt;

use agent_dashboard::client::ClientContext;
use agent_dashboard::error::ProxyError;
use agent_dashboard::server::{DriveImageSource, IMAGE_CACHE_CONTROL};

use super::test_utils::{body_string, get, test_router, unreachable_urls, MockImageSource};

fn offline_client() -> ClientContext {
    ClientContext::new(&unreachable_urls()).unwrap()
}

// =============================================================================
// Mock Image Source
// =============================================================================

#[tokio::test]
async fn test_image_served_with_headers() {
    let images = MockImageSource::new().with_image("img-1", Some("image/png"), b"\x89PNG".to_vec());
    let router = test_router(offline_client(), images.clone());

    let response = router.oneshot(get("/api/image/img-1", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        IMAGE_CACHE_CONTROL
    );
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"\x89PNG");
    assert_eq!(images.request_count(), 1);
}

#[tokio::test]
async fn test_image_defaults_to_jpeg() {
    let images = MockImageSource::new().with_image("img-2", None, vec![0xFF, 0xD8]);
    let router = test_router(offline_client(), images);

    let response = router.oneshot(get("/api/image/img-2", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "image/jpeg");
}

#[tokio::test]
async fn test_missing_image_id_is_bad_request() {
    let images = MockImageSource::new();
    let router = test_router(offline_client(), images.clone());

    for uri in ["/api/image", "/api/image/", "/api/image/%20"] {
        let response = router.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri: {}", uri);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "missing_image_id");
    }

    assert_eq!(images.request_count(), 0);
}

#[tokio::test]
async fn test_upstream_status_passes_through() {
    let images = MockImageSource::new().with_failure("private", ProxyError::Upstream { status: 403 });
    let router = test_router(offline_client(), images);

    let response = router.oneshot(get("/api/image/private", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["message"], "Failed to fetch image from Google Drive");
    assert_eq!(body["status"], 403);
}

#[tokio::test]
async fn test_unreachable_host_is_not_found() {
    let images = MockImageSource::new()
        .with_failure("gone", ProxyError::Unreachable("connection refused".to_string()));
    let router = test_router(offline_client(), images);

    let response = router.oneshot(get("/api/image/gone", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["message"], "Image not found or forbidden");
}

// =============================================================================
// Drive Image Source
// =============================================================================

#[tokio::test]
async fn test_drive_source_requests_export_view() {
    let server = MockServer::start_async().await;
    let drive = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/uc")
                .query_param("export", "view")
                .query_param("id", "drive-1");
            then.status(200)
                .header("content-type", "image/webp")
                .body(vec![1u8, 2, 3]);
        })
        .await;

    let source = DriveImageSource::with_endpoint(server.url("/uc")).unwrap();
    let router = test_router(offline_client(), source);

    let response = router.oneshot(get("/api/image/drive-1", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "image/webp");
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], &[1u8, 2, 3]);
    drive.assert_async().await;
}

#[tokio::test]
async fn test_drive_source_upstream_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/uc");
            then.status(404);
        })
        .await;

    let source = DriveImageSource::with_endpoint(server.url("/uc")).unwrap();
    let router = test_router(offline_client(), source);

    let response = router.oneshot(get("/api/image/nope", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error"], "upstream_error");
}

#[tokio::test]
async fn test_drive_source_unreachable() {
    let source = DriveImageSource::with_endpoint("http://127.0.0.1:9/uc").unwrap();
    let router = test_router(offline_client(), source);

    let response = router.oneshot(get("/api/image/drive-1", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error"], "not_found");
}
