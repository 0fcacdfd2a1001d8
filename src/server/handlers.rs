//! HTTP request handlers for the dashboard.
//!
//! # Endpoints
//!
//! - `GET /` - Posts pending approval (session required)
//! - `GET /posts/{post_id}` - Post details (session required)
//! - `POST /generate` - Generate content for a topic (session required)
//! - `POST /posts/{post_id}/approve` - Approve a post (session required)
//! - `GET /signin` - Sign-in page
//! - `GET /health` - Health check

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use super::image_proxy::ImageSource;
use super::pages::{self, Banner};
use super::session::{SessionError, SessionToken};
use crate::client::ClientContext;
use crate::posts::{
    fetch_post_by_id_server, fetch_posts_server, generate_topic, update_post_status,
    GenerateTopic, MutationOptions, PostStatus, UpdatePostStatus,
};

/// Default page render timeout: 5 seconds
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_millis(5000);

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<I: ImageSource> {
    /// Backend clients; handlers derive a request-scoped copy per session
    pub client: ClientContext,

    /// Source for the image proxy
    pub images: Arc<I>,

    /// Upper bound on rendering one page
    pub render_timeout: Duration,
}

impl<I: ImageSource> AppState<I> {
    /// Create application state with the default render timeout.
    pub fn new(client: ClientContext, images: I) -> Self {
        Self {
            client,
            images: Arc::new(images),
            render_timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    /// Set the render timeout.
    pub fn with_render_timeout(mut self, render_timeout: Duration) -> Self {
        self.render_timeout = render_timeout;
        self
    }
}

impl<I: ImageSource> Clone for AppState<I> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            images: Arc::clone(&self.images),
            render_timeout: self.render_timeout,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Banner codes on the dashboard URL.
#[derive(Debug, Default, Deserialize)]
pub struct BannerParams {
    #[serde(default)]
    pub notice: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

/// Form body of `POST /generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    pub topic: String,

    /// Present (any value) when the checkbox is ticked
    #[serde(default)]
    pub image_generated: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "render_timeout")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code
    pub status: u16,
}

impl ErrorResponse {
    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: status.as_u16(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Log an error response by severity: 5xx at ERROR, 404 at DEBUG, other 4xx at WARN.
pub(crate) fn log_error_response(status: StatusCode, error_type: &str, message: &str) {
    if status.is_server_error() {
        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            message
        );
    } else if status == StatusCode::NOT_FOUND {
        debug!(
            error_type = error_type,
            status = status.as_u16(),
            "Resource not found: {}",
            message
        );
    } else if status.is_client_error() {
        warn!(
            error_type = error_type,
            status = status.as_u16(),
            "Client error: {}",
            message
        );
    }
}

/// Failure to produce a page.
#[derive(Debug, Clone, Error)]
pub enum PageError {
    /// Rendering did not finish within the configured timeout
    #[error("Page rendering timed out after {}ms", .after.as_millis())]
    RenderTimeout { after: Duration },
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            PageError::RenderTimeout { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "render_timeout")
            }
        };

        let message = self.to_string();
        log_error_response(status, error_type, &message);

        (
            status,
            Json(ErrorResponse::with_status(error_type, message, status)),
        )
            .into_response()
    }
}

/// Run a page future, failing with [`PageError::RenderTimeout`] if it overruns.
async fn render_within<F>(timeout: Duration, page: F) -> Result<Response, PageError>
where
    F: Future<Output = Response>,
{
    tokio::time::timeout(timeout, page)
        .await
        .map_err(|_| PageError::RenderTimeout { after: timeout })
}

// =============================================================================
// Handlers
// =============================================================================

/// Dashboard listing posts with status `Generated`.
///
/// # Endpoint
///
/// `GET /?notice={code}&error={code}`
///
/// A backend 401 clears the session and redirects to sign-in. Any other
/// backend failure renders the empty state.
pub async fn dashboard_handler<I: ImageSource>(
    State(state): State<AppState<I>>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    Query(params): Query<BannerParams>,
) -> Result<Response, PageError> {
    render_within(state.render_timeout, async move {
        let posts = fetch_posts_server(&state.client, &PostStatus::Generated, Some(&token)).await;
        if posts.is_unauthorized() {
            return SessionError::Rejected.into_response();
        }

        let banner = Banner::from_codes(params.notice.as_deref(), params.error.as_deref());
        Html(pages::dashboard(&posts, banner)).into_response()
    })
    .await
}

/// Details of one post.
///
/// # Endpoint
///
/// `GET /posts/{post_id}`
///
/// # Response
///
/// - `200 OK`: details page
/// - `302 Found`: backend rejected the session
/// - `404 Not Found`: backend has no such post
/// - `502 Bad Gateway`: any other backend failure
pub async fn post_detail_handler<I: ImageSource>(
    State(state): State<AppState<I>>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    Path(post_id): Path<String>,
) -> Result<Response, PageError> {
    render_within(state.render_timeout, async move {
        let result = fetch_post_by_id_server(&state.client, &post_id, Some(&token)).await;
        if result.is_unauthorized() {
            return SessionError::Rejected.into_response();
        }

        match result.data {
            Some(post) => Html(pages::post_detail(&post)).into_response(),
            None => {
                let status = match result.status {
                    Some(StatusCode::NOT_FOUND) => StatusCode::NOT_FOUND,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, Html(pages::post_unavailable(&post_id))).into_response()
            }
        }
    })
    .await
}

/// Generate content for a topic, then return to the dashboard.
///
/// # Endpoint
///
/// `POST /generate` with form fields `topic` and optional `image_generated`
///
/// Redirects to `/?notice=generated` on success and `/?error=generate` on
/// failure. A blank topic redirects to `/?error=topic` without calling the
/// backend.
pub async fn generate_handler<I: ImageSource>(
    State(state): State<AppState<I>>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    Form(form): Form<GenerateForm>,
) -> Response {
    let topic = form.topic.trim();
    if topic.is_empty() {
        return Redirect::to("/?error=topic").into_response();
    }

    let ctx = state.client.with_token(Some(&token));
    let input = GenerateTopic::new(topic).with_image(form.image_generated.is_some());

    match generate_topic(&ctx, &input, MutationOptions::default()).await {
        Ok(_) => Redirect::to("/?notice=generated").into_response(),
        Err(err) if err.is_unauthorized() => SessionError::Rejected.into_response(),
        Err(_) => Redirect::to("/?error=generate").into_response(),
    }
}

/// Approve a post, then return to the dashboard.
///
/// # Endpoint
///
/// `POST /posts/{post_id}/approve`
pub async fn approve_handler<I: ImageSource>(
    State(state): State<AppState<I>>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    Path(post_id): Path<String>,
) -> Response {
    let ctx = state.client.with_token(Some(&token));
    let input = UpdatePostStatus::approve(post_id);

    match update_post_status(&ctx, &input, MutationOptions::default()).await {
        Ok(_) => Redirect::to("/?notice=approved").into_response(),
        Err(err) if err.is_unauthorized() => SessionError::Rejected.into_response(),
        Err(_) => Redirect::to("/?error=approve").into_response(),
    }
}

/// Sign-in page.
///
/// # Endpoint
///
/// `GET /signin`
pub async fn signin_handler() -> Html<String> {
    Html(pages::signin())
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
