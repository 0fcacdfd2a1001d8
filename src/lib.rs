//! # Agent Dashboard
//!
//! A dashboard for reviewing AI-generated social media posts.
//!
//! Operators submit a topic, the backend generates Blog, LinkedIn and
//! WhatsApp content (optionally with an image stored on Google Drive), and
//! the generated posts are listed, inspected and approved from here.
//!
//! ## Features
//!
//! - **Typed HTTP client**: One client per backend base URL (main, webhook,
//!   public) sharing default headers and an interceptor registry
//! - **Session handling**: Bearer token attachment and 401 sign-out through
//!   scoped interceptors; a server-side guard that checks token expiry
//! - **Query caching**: Query results stay fresh for 60 seconds
//! - **Image proxy**: Streams Google Drive images through the dashboard origin
//!
//! ## Architecture
//!
//! - [`client`] - Client contexts, interceptors and fetch wrappers
//! - [`query`] - Keyed cache with a staleness window
//! - [`posts`] - Post models, queries and mutations
//! - [`server`] - Axum-based dashboard pages, session guard and image proxy
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use agent_dashboard::client::{BaseUrls, ClientContext};
//! use agent_dashboard::posts::{fetch_posts, PostStatus};
//! use agent_dashboard::query::QueryCache;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = ClientContext::new(&BaseUrls::new(
//!         "https://api.example.com",
//!         "https://hooks.example.com",
//!         "https://public.example.com",
//!     ))?;
//!     ctx.set_token(Some("eyJ..."));
//!
//!     let cache = QueryCache::new();
//!     let posts = fetch_posts(&ctx, &cache, &PostStatus::Generated).await?;
//!     println!("{} posts awaiting review", posts.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod posts;
pub mod query;
pub mod server;

// Re-export commonly used types
pub use client::{
    mutation_fetch, query_fetch, query_fetch_server, ApiBase, AuthInterceptors, BaseUrls,
    ClientContext, CookieStore, ServerQueryResult,
};
pub use config::{Cli, Command, ServeConfig};
pub use error::{ApiError, ContextError, ErrorBody, MutationError, ProxyError, RawResponse};
pub use posts::{
    fetch_post_by_id, fetch_posts, generate_topic, update_post_status, PostData, PostStatus,
};
pub use query::{QueryCache, QueryKey};
pub use server::{create_router, AppState, DriveImageSource, ImageSource, RouterConfig};
