//! Image proxy for generated images hosted on Google Drive.
//!
//! `GET /api/image/{image_id}` fetches `uc?export=view&id={image_id}` from the
//! image host and streams the body back with a long-lived cache header.
//!
//! | Condition                   | Response                         |
//! |-----------------------------|----------------------------------|
//! | blank or missing id         | 400, no upstream request         |
//! | upstream non-success status | same status                      |
//! | upstream unreachable        | 404                              |
//! | success                     | 200, upstream `Content-Type`     |

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use super::handlers::{log_error_response, AppState, ErrorResponse};
use crate::error::ProxyError;

/// Default image host endpoint.
pub const DRIVE_IMAGE_ENDPOINT: &str = "https://drive.google.com/uc";

/// Content type used when the image host does not send one.
pub const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Cache-Control sent with every proxied image.
pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

// =============================================================================
// Image Source
// =============================================================================

/// An image fetched from the host, body not yet read.
pub struct FetchedImage {
    /// Upstream `Content-Type`, if any
    pub content_type: Option<String>,

    /// Image bytes, possibly streaming
    pub body: Body,
}

impl FetchedImage {
    /// Image with an in-memory body.
    pub fn from_bytes(content_type: Option<String>, data: impl Into<Bytes>) -> Self {
        Self {
            content_type,
            body: Body::from(data.into()),
        }
    }
}

/// Where proxied images come from.
#[async_trait]
pub trait ImageSource: Send + Sync + 'static {
    /// Fetch the image `image_id`. The id is never blank.
    async fn fetch(&self, image_id: &str) -> Result<FetchedImage, ProxyError>;
}

/// Fetches images from Google Drive (or any host with the same `uc` endpoint).
#[derive(Debug, Clone)]
pub struct DriveImageSource {
    http: Client,
    endpoint: String,
}

impl DriveImageSource {
    /// Source backed by Google Drive.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_endpoint(DRIVE_IMAGE_ENDPOINT)
    }

    /// Source backed by another host exposing the `uc` endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: Client::builder().build()?,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageSource for DriveImageSource {
    async fn fetch(&self, image_id: &str) -> Result<FetchedImage, ProxyError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("export", "view"), ("id", image_id)])
            .send()
            .await
            .map_err(|e| ProxyError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::Upstream {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        debug!(image_id, content_type = ?content_type, "Streaming image");

        Ok(FetchedImage {
            content_type,
            body: Body::from_stream(response.bytes_stream()),
        })
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ProxyError::MissingId => (
                StatusCode::BAD_REQUEST,
                "missing_image_id",
                self.to_string(),
            ),
            ProxyError::Upstream { status } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                "upstream_error",
                "Failed to fetch image from Google Drive".to_string(),
            ),
            ProxyError::Unreachable(_) => (
                StatusCode::NOT_FOUND,
                "not_found",
                "Image not found or forbidden".to_string(),
            ),
        };

        log_error_response(status, error_type, &self.to_string());

        let body = ErrorResponse::with_status(error_type, message, status);
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Proxy one image.
///
/// # Endpoint
///
/// `GET /api/image/{image_id}`
///
/// # Headers
///
/// - `Content-Type`: upstream value, `image/jpeg` if absent
/// - `Cache-Control: public, max-age=31536000, immutable`
pub async fn image_proxy_handler<I: ImageSource>(
    State(state): State<AppState<I>>,
    Path(image_id): Path<String>,
) -> Result<Response, ProxyError> {
    let image_id = image_id.trim();
    if image_id.is_empty() {
        return Err(ProxyError::MissingId);
    }

    let image = state.images.fetch(image_id).await?;
    let content_type = image
        .content_type
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_IMAGE_CONTENT_TYPE.to_string());

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, IMAGE_CACHE_CONTROL.to_string()),
        ],
        image.body,
    )
        .into_response())
}

/// `GET /api/image` and `GET /api/image/`: no id to proxy.
pub async fn missing_image_id_handler() -> ProxyError {
    ProxyError::MissingId
}
