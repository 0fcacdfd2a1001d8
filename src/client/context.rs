//! Explicit client context: three base URLs, their HTTP clients, default
//! headers and the interceptor registry.
//!
//! Every data-access call takes a `&ClientContext` instead of reaching for
//! process-wide clients. Cloning a context is cheap and shares all state;
//! [`ClientContext::with_token`] produces a copy with its own default headers
//! for request-scoped use on the server.

use std::fmt;
use std::sync::Arc;

use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, warn};
use url::Url;

use super::auth::bearer_header;
use super::interceptor::InterceptorRegistry;
use crate::error::{ApiError, ContextError, RawResponse};

// =============================================================================
// Base Selection
// =============================================================================

/// Which backend API group a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApiBase {
    /// General API
    #[default]
    Main,

    /// Content generation and approval endpoints
    Webhook,

    /// Unauthenticated endpoints
    Public,
}

impl ApiBase {
    /// All bases, in index order.
    pub const ALL: [ApiBase; 3] = [ApiBase::Main, ApiBase::Webhook, ApiBase::Public];

    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            ApiBase::Main => "main",
            ApiBase::Webhook => "webhook",
            ApiBase::Public => "public",
        }
    }

    fn index(&self) -> usize {
        match self {
            ApiBase::Main => 0,
            ApiBase::Webhook => 1,
            ApiBase::Public => 2,
        }
    }
}

/// Base URLs for the three API groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrls {
    pub main: String,
    pub webhook: String,
    pub public: String,
}

impl BaseUrls {
    /// Create a set of base URLs.
    pub fn new(
        main: impl Into<String>,
        webhook: impl Into<String>,
        public: impl Into<String>,
    ) -> Self {
        Self {
            main: main.into(),
            webhook: webhook.into(),
            public: public.into(),
        }
    }

    /// URL configured for `base`.
    pub fn get(&self, base: ApiBase) -> &str {
        match base {
            ApiBase::Main => &self.main,
            ApiBase::Webhook => &self.webhook,
            ApiBase::Public => &self.public,
        }
    }
}

/// Parse and check a base URL.
pub fn parse_base_url(base: ApiBase, raw: &str) -> Result<Url, ContextError> {
    let invalid = |reason: String| ContextError::InvalidBaseUrl {
        base: base.name(),
        url: raw.to_string(),
        reason,
    };

    if raw.trim().is_empty() {
        return Err(invalid("not set".to_string()));
    }

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }

    Ok(url)
}

// =============================================================================
// Client Context
// =============================================================================

struct ApiClient {
    base_url: Url,
    http: Client,
}

impl ApiClient {
    /// Append `path` to the base URL, keeping any path prefix the base carries.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| ApiError::InvalidRequest(format!("{}: {}", joined, e)))
    }
}

/// HTTP clients, default headers and interceptors for the three API groups.
#[derive(Clone)]
pub struct ClientContext {
    clients: Arc<[ApiClient; 3]>,
    default_headers: Arc<RwLock<[HeaderMap; 3]>>,
    interceptors: Arc<InterceptorRegistry>,
}

impl ClientContext {
    /// Build a context with one HTTP client per base URL.
    pub fn new(urls: &BaseUrls) -> Result<Self, ContextError> {
        let build = |base: ApiBase| -> Result<ApiClient, ContextError> {
            let base_url = parse_base_url(base, urls.get(base))?;
            let http = Client::builder()
                .build()
                .map_err(|e| ContextError::Client(e.to_string()))?;
            Ok(ApiClient { base_url, http })
        };

        Ok(Self {
            clients: Arc::new([
                build(ApiBase::Main)?,
                build(ApiBase::Webhook)?,
                build(ApiBase::Public)?,
            ]),
            default_headers: Arc::new(RwLock::new(Default::default())),
            interceptors: Arc::new(InterceptorRegistry::new()),
        })
    }

    fn client(&self, base: ApiBase) -> &ApiClient {
        &self.clients[base.index()]
    }

    /// Base URL of `base`.
    pub fn base_url(&self, base: ApiBase) -> &Url {
        &self.client(base).base_url
    }

    /// Interceptors applied to every request made through this context.
    pub fn interceptors(&self) -> &InterceptorRegistry {
        &self.interceptors
    }

    /// Set or clear the default `Authorization` header on all three clients.
    pub fn set_token(&self, token: Option<&str>) {
        let value = token.filter(|t| !t.is_empty()).and_then(|t| {
            let value = bearer_header(t);
            if value.is_none() {
                warn!("Token is not a valid header value, clearing default authorization");
            }
            value
        });

        let mut headers = self.default_headers.write();
        for map in headers.iter_mut() {
            match &value {
                Some(value) => {
                    map.insert(AUTHORIZATION, value.clone());
                }
                None => {
                    map.remove(AUTHORIZATION);
                }
            }
        }
    }

    /// Copy of this context with its own default headers, then `set_token(token)`.
    ///
    /// Clients and interceptors are shared with the original.
    pub fn with_token(&self, token: Option<&str>) -> Self {
        let headers = self.default_headers.read().clone();
        let scoped = Self {
            clients: Arc::clone(&self.clients),
            default_headers: Arc::new(RwLock::new(headers)),
            interceptors: Arc::clone(&self.interceptors),
        };
        scoped.set_token(token);
        scoped
    }

    /// Default header `name` for `base`, if set.
    pub fn default_header(&self, base: ApiBase, name: &HeaderName) -> Option<HeaderValue> {
        self.default_headers.read()[base.index()].get(name).cloned()
    }

    /// Send a request through the interceptor pipeline.
    ///
    /// Header precedence: defaults, then headers set by `build`, then
    /// interceptors. Non-success statuses become [`ApiError::Response`].
    /// Response interceptors see every outcome before the caller does.
    pub(crate) async fn execute<F>(
        &self,
        base: ApiBase,
        method: Method,
        path: &str,
        build: F,
    ) -> Result<Response, ApiError>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let client = self.client(base);
        let url = client.endpoint(path)?;
        let mut request = build(client.http.request(method, url))
            .build()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        {
            let defaults = self.default_headers.read();
            for (name, value) in defaults[base.index()].iter() {
                if !request.headers().contains_key(name) {
                    request.headers_mut().insert(name.clone(), value.clone());
                }
            }
        }

        self.interceptors.apply_request(&mut request);

        debug!(
            base = base.name(),
            method = %request.method(),
            url = %request.url(),
            "Sending request"
        );

        let response = match client.http.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                let err = ApiError::Connection(e.to_string());
                self.interceptors.notify_error(&err);
                return Err(err);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::Response(Box::new(RawResponse {
                status,
                headers,
                body,
            }));
            self.interceptors.notify_error(&err);
            return Err(err);
        }

        self.interceptors.notify_response(&response);
        Ok(response)
    }
}

impl fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext")
            .field("main", &self.base_url(ApiBase::Main).as_str())
            .field("webhook", &self.base_url(ApiBase::Webhook).as_str())
            .field("public", &self.base_url(ApiBase::Public).as_str())
            .field("interceptors", &self.interceptors)
            .finish()
    }
}
