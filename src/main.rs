//! Agent Dashboard - serve the dashboard or drive the backend from the shell.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_dashboard::{
    client::{AuthInterceptors, ClientContext, CookieStore, Location, SESSION_COOKIE, SIGN_IN_PATH},
    config::{
        ApproveConfig, ClientArgs, Cli, Command, GenerateConfig, PostConfig, PostsConfig,
        ServeConfig,
    },
    posts::{
        fetch_post_by_id, fetch_posts, generate_topic, update_post_status, GenerateTopic,
        MessageResult, MutationOptions, PostData, PostStatus, UpdatePostStatus,
    },
    query::{QueryCache, DEFAULT_MAX_ENTRIES},
    server::{create_router, DriveImageSource, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Posts(config) => run_posts(config).await,
        Command::Post(config) => run_post(config).await,
        Command::Generate(config) => run_generate(config).await,
        Command::Approve(config) => run_approve(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let client = match ClientContext::new(&config.api.base_urls()) {
        Ok(client) => client,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let images = match DriveImageSource::with_endpoint(&config.image_endpoint) {
        Ok(images) => images,
        Err(e) => {
            error!("Failed to build image client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Configuration:");
    info!("  Main API: {}", config.api.main);
    info!("  Webhook API: {}", config.api.webhook);
    info!("  Public API: {}", config.api.public);
    info!("  Image host: {}", config.image_endpoint);
    info!("  Render timeout: {}ms", config.render_timeout_ms);

    let router = create_router(client, images, build_router_config(&config));
    let addr = config.bind_address();

    info!("");
    info!("  Dashboard listening on: http://{}", addr);
    info!("    curl http://{}/health", addr);
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "agent_dashboard=debug,tower_http=debug"
    } else {
        "agent_dashboard=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_render_timeout(Duration::from_millis(config.render_timeout_ms))
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}

// =============================================================================
// Client Session
// =============================================================================

/// Client context wired with the bearer/401 interceptor pair.
struct Session {
    ctx: ClientContext,
    cache: QueryCache,
    location: Arc<Location>,
    _auth: AuthInterceptors,
}

impl Session {
    fn open(args: &ClientArgs) -> Result<Self, String> {
        init_logging(args.verbose);
        args.validate()?;

        let ctx = ClientContext::new(&args.api.base_urls()).map_err(|e| e.to_string())?;

        let cookies = CookieStore::new();
        if let Some(token) = args.token.as_deref().filter(|t| !t.is_empty()) {
            cookies.set(SESSION_COOKIE, token);
        }

        let location = Arc::new(Location::new("/"));
        let auth = AuthInterceptors::new(ctx.interceptors(), cookies);
        auth.on_path_change(&location.current());
        auth.on_navigator_change(location.clone());

        let cache = QueryCache::with_config(
            Duration::from_secs(args.cache_stale_secs),
            DEFAULT_MAX_ENTRIES,
        );

        Ok(Self {
            ctx,
            cache,
            location,
            _auth: auth,
        })
    }

    /// Whether the backend rejected the token during this session.
    fn signed_out(&self) -> bool {
        self.location.visits(SIGN_IN_PATH) > 0
    }

    /// Report a failure, pointing at the token when the backend rejected it.
    fn fail(&self, what: &str, err: impl std::fmt::Display) -> ExitCode {
        if self.signed_out() {
            eprintln!("Error: session rejected by the backend; set a fresh ACCESS_TOKEN");
        } else {
            eprintln!("Error: {} failed: {}", what, err);
        }
        ExitCode::FAILURE
    }
}

fn open_session(args: &ClientArgs) -> Result<Session, ExitCode> {
    Session::open(args).map_err(|e| {
        eprintln!("Error: {}", e);
        ExitCode::FAILURE
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: failed to serialize output: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_post_row(post: &PostData) {
    let platforms: Vec<&str> = post.platforms().iter().map(|p| p.label()).collect();
    println!(
        "{:<24} {:<10} {:<20} {} [{}]",
        post.post_id,
        post.status,
        post.created_at,
        post.topic,
        platforms.join(", ")
    );
}

// =============================================================================
// Posts Command
// =============================================================================

async fn run_posts(config: PostsConfig) -> ExitCode {
    let session = match open_session(&config.client) {
        Ok(session) => session,
        Err(code) => return code,
    };
    let status = PostStatus::from(config.status.as_str());

    loop {
        let posts = match fetch_posts(&session.ctx, &session.cache, &status).await {
            Ok(posts) => posts,
            Err(e) => return session.fail("listing posts", e),
        };

        if config.json {
            let code = print_json(&posts);
            if config.watch.is_none() {
                return code;
            }
        } else if posts.is_empty() {
            println!("No posts found.");
        } else {
            for post in &posts {
                print_post_row(post);
            }
        }

        match config.watch {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs.max(1))).await,
            None => return ExitCode::SUCCESS,
        }
    }
}

// =============================================================================
// Post Command
// =============================================================================

async fn run_post(config: PostConfig) -> ExitCode {
    let session = match open_session(&config.client) {
        Ok(session) => session,
        Err(code) => return code,
    };

    let post = match fetch_post_by_id(&session.ctx, &session.cache, Some(&config.post_id)).await {
        Ok(Some(post)) => post,
        Ok(None) => {
            eprintln!("Error: post ID is required");
            return ExitCode::FAILURE;
        }
        Err(e) => return session.fail("loading post", e),
    };

    if config.json {
        return print_json(&post);
    }

    println!("{} ({})", post.topic, post.status);
    for platform in post.platforms() {
        let Some(data) = post.platform(platform) else {
            continue;
        };
        println!();
        println!("── {} ──", platform.label());
        for text in [&data.title, &data.content, &data.message].into_iter().flatten() {
            println!("{}", text);
        }
        if !data.tags.is_empty() {
            println!("tags: {}", data.tags.join(", "));
        }
    }
    for image in &post.images {
        println!("image: {}", image.public_image_url);
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Mutation Commands
// =============================================================================

async fn run_generate(config: GenerateConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    let session = match open_session(&config.client) {
        Ok(session) => session,
        Err(code) => return code,
    };

    let input = GenerateTopic::new(config.topic.trim()).with_image(config.image);
    let options = MutationOptions::new().on_success(|result: &MessageResult| {
        info!(message = %result.message, "Generation accepted");
    });

    match generate_topic(&session.ctx, &input, options).await {
        Ok(_) => {
            println!("Content generated successfully. Please check email for approval.");
            ExitCode::SUCCESS
        }
        Err(e) => session.fail("generation", e),
    }
}

async fn run_approve(config: ApproveConfig) -> ExitCode {
    let session = match open_session(&config.client) {
        Ok(session) => session,
        Err(code) => return code,
    };

    let input = UpdatePostStatus::approve(config.post_id);
    match update_post_status(&session.ctx, &input, MutationOptions::default()).await {
        Ok(result) => {
            if result.message.is_empty() {
                println!("Post approved.");
            } else {
                println!("{}", result.message);
            }
            ExitCode::SUCCESS
        }
        Err(e) => session.fail("approval", e),
    }
}
