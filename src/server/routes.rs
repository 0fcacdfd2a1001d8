//! Router configuration for the dashboard.
//!
//! # Route Structure
//!
//! ```text
//! /                            - Dashboard (session)
//! /posts/{post_id}             - Post details (session)
//! /generate                    - Generate form target (session)
//! /posts/{post_id}/approve     - Approve form target (session)
//! /signin                      - Sign-in page (public)
//! /api/image/{image_id}        - Image proxy (public)
//! /health                      - Health check (public)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use agent_dashboard::client::{BaseUrls, ClientContext};
//! use agent_dashboard::server::{create_router, DriveImageSource, RouterConfig};
//!
//! let client = ClientContext::new(&BaseUrls::new(main, webhook, public))?;
//! let router = create_router(client, DriveImageSource::new()?, RouterConfig::new());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    approve_handler, dashboard_handler, generate_handler, health_handler, post_detail_handler,
    signin_handler, AppState, DEFAULT_RENDER_TIMEOUT,
};
use super::image_proxy::{image_proxy_handler, missing_image_id_handler, ImageSource};
use super::session::session_middleware;
use crate::client::ClientContext;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Upper bound on rendering one page
    pub render_timeout: Duration,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Render timeout is 5 seconds
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the page render timeout.
    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
///
/// Page and form routes sit behind [`session_middleware`]; sign-in, health
/// and the image proxy are public.
pub fn create_router<I: ImageSource>(
    client: ClientContext,
    images: I,
    config: RouterConfig,
) -> Router {
    let app_state = AppState::new(client, images).with_render_timeout(config.render_timeout);

    let protected_routes = Router::new()
        .route("/", get(dashboard_handler::<I>))
        .route("/posts/{post_id}", get(post_detail_handler::<I>))
        .route("/posts/{post_id}/approve", post(approve_handler::<I>))
        .route("/generate", post(generate_handler::<I>))
        .layer(middleware::from_fn(session_middleware))
        .with_state(app_state.clone());

    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/signin", get(signin_handler))
        .route("/api/image", get(missing_image_id_handler))
        .route("/api/image/", get(missing_image_id_handler))
        .route("/api/image/{image_id}", get(image_proxy_handler::<I>))
        .with_state(app_state);

    let router = Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .layer(build_cors_layer(&config));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::HEAD, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}
