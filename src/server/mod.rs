//! HTTP server layer for the dashboard.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  session    │  │  handlers   │  │      image_proxy        │  │
//! │  │  (guard)    │─►│  + pages    │  │  (Drive passthrough)    │  │
//! │  └─────────────┘  └──────┬──────┘  └─────────────────────────┘  │
//! │                          │ ClientContext::with_token            │
//! └──────────────────────────┼──────────────────────────────────────┘
//!                            ▼
//!                      backend APIs
//! ```

pub mod handlers;
pub mod image_proxy;
pub mod pages;
pub mod routes;
pub mod session;

pub use handlers::{
    approve_handler, dashboard_handler, generate_handler, health_handler, post_detail_handler,
    signin_handler, AppState, BannerParams, ErrorResponse, GenerateForm, HealthResponse,
    PageError, DEFAULT_RENDER_TIMEOUT,
};
pub use image_proxy::{
    image_proxy_handler, missing_image_id_handler, DriveImageSource, FetchedImage, ImageSource,
    DEFAULT_IMAGE_CONTENT_TYPE, DRIVE_IMAGE_ENDPOINT, IMAGE_CACHE_CONTROL,
};
pub use routes::{create_router, RouterConfig};
pub use session::{
    clear_session_cookie, decode_token_expiry, require_user_session, require_user_session_at,
    session_middleware, sign_in_redirect, SessionError, SessionToken,
};
