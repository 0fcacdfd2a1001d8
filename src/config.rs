//! Configuration management for the dashboard.
//!
//! Every option can be given on the command line or through the environment.
//!
//! # Environment Variables
//!
//! Backend base URLs (required by every command):
//!
//! - `URL_API_BASE_MAIN` - General API
//! - `URL_API_BASE_WEBHOOK` - Generation and approval API
//! - `URL_API_BASE_PUBLIC` - Unauthenticated API
//!
//! Server (`serve`):
//!
//! - `DASHBOARD_HOST` - Bind address (default: 0.0.0.0)
//! - `DASHBOARD_PORT` - Port (default: 3000)
//! - `DASHBOARD_IMAGE_ENDPOINT` - Image host endpoint (default: Google Drive)
//! - `DASHBOARD_RENDER_TIMEOUT_MS` - Page render timeout (default: 5000)
//! - `DASHBOARD_CORS_ORIGINS` - Allowed CORS origins, comma-separated
//!
//! Client commands (`posts`, `post`, `generate`, `approve`):
//!
//! - `ACCESS_TOKEN` - Session token sent as a bearer token
//! - `DASHBOARD_CACHE_STALE_SECS` - Query staleness window (default: 60)

use clap::{Args, Parser, Subcommand};

use crate::client::{parse_base_url, ApiBase, BaseUrls};
use crate::query::DEFAULT_STALE_TIME;
use crate::server::DRIVE_IMAGE_ENDPOINT;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default page render timeout in milliseconds.
pub const DEFAULT_RENDER_TIMEOUT_MS: u64 = 5000;

// =============================================================================
// CLI
// =============================================================================

/// Agent Dashboard - generate, review and approve AI-written social posts.
#[derive(Parser, Debug, Clone)]
#[command(name = "agent-dashboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the dashboard server
    Serve(ServeConfig),

    /// List posts by status
    Posts(PostsConfig),

    /// Show one post
    Post(PostConfig),

    /// Generate content for a topic
    Generate(GenerateConfig),

    /// Approve a post
    Approve(ApproveConfig),
}

// =============================================================================
// Shared Sections
// =============================================================================

/// Backend base URLs.
#[derive(Args, Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the general API.
    #[arg(long = "api-main", env = "URL_API_BASE_MAIN")]
    pub main: String,

    /// Base URL of the generation and approval API.
    #[arg(long = "api-webhook", env = "URL_API_BASE_WEBHOOK")]
    pub webhook: String,

    /// Base URL of the unauthenticated API.
    #[arg(long = "api-public", env = "URL_API_BASE_PUBLIC")]
    pub public: String,
}

impl ApiConfig {
    pub fn base_urls(&self) -> BaseUrls {
        BaseUrls::new(&self.main, &self.webhook, &self.public)
    }

    /// Check that every base URL is an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), String> {
        let urls = self.base_urls();
        for base in ApiBase::ALL {
            parse_base_url(base, urls.get(base)).map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

/// Options shared by the client commands.
#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    #[command(flatten)]
    pub api: ApiConfig,

    /// Session token to send as a bearer token.
    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Seconds a fetched query stays fresh.
    #[arg(long, default_value_t = DEFAULT_STALE_TIME.as_secs(), env = "DASHBOARD_CACHE_STALE_SECS")]
    pub cache_stale_secs: u64,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl ClientArgs {
    pub fn validate(&self) -> Result<(), String> {
        self.api.validate()
    }
}

// =============================================================================
// Serve Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    #[command(flatten)]
    pub api: ApiConfig,

    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "DASHBOARD_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "DASHBOARD_PORT")]
    pub port: u16,

    /// Image host endpoint used by the image proxy.
    #[arg(long, default_value = DRIVE_IMAGE_ENDPOINT, env = "DASHBOARD_IMAGE_ENDPOINT")]
    pub image_endpoint: String,

    /// Page render timeout in milliseconds.
    #[arg(long, default_value_t = DEFAULT_RENDER_TIMEOUT_MS, env = "DASHBOARD_RENDER_TIMEOUT_MS")]
    pub render_timeout_ms: u64,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "DASHBOARD_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.api.validate()?;

        if self.render_timeout_ms == 0 {
            return Err("render_timeout_ms must be greater than 0".to_string());
        }

        match url::Url::parse(&self.image_endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(format!(
                    "image_endpoint '{}' is not an absolute http(s) URL",
                    self.image_endpoint
                ))
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Client Commands
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct PostsConfig {
    #[command(flatten)]
    pub client: ClientArgs,

    /// Status to list.
    #[arg(long, default_value = "Generated")]
    pub status: String,

    /// Re-list every N seconds, reusing results while they are fresh.
    #[arg(long)]
    pub watch: Option<u64>,

    /// Print JSON instead of a table.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PostConfig {
    #[command(flatten)]
    pub client: ClientArgs,

    /// Post identifier.
    pub post_id: String,

    /// Print JSON instead of text.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateConfig {
    #[command(flatten)]
    pub client: ClientArgs,

    /// Topic to generate content for.
    pub topic: String,

    /// Also generate an image.
    #[arg(long, default_value_t = false)]
    pub image: bool,
}

impl GenerateConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.client.validate()?;
        if self.topic.trim().is_empty() {
            return Err("topic must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct ApproveConfig {
    #[command(flatten)]
    pub client: ClientArgs,

    /// Post identifier.
    pub post_id: String,
}

// =============================================================================
// Tests
// =============================================================================
