//! Bearer-token interceptor pair.
//!
//! - [`BearerTokenInterceptor`] copies the session cookie into an
//!   `Authorization: Bearer <token>` header, except on the sign-in route.
//! - [`UnauthorizedInterceptor`] clears the session cookie and navigates to
//!   sign-in whenever the backend answers 401.
//!
//! [`AuthInterceptors`] owns one scoped registration for each and rebinds them
//! when the current path or the navigator changes.

use std::sync::Arc;

use http::header::AUTHORIZATION;
use http::HeaderValue;
use parking_lot::RwLock;
use reqwest::Request;
use tracing::{debug, warn};

use super::cookie::CookieStore;
use super::interceptor::{
    InterceptorRegistry, RequestInterceptor, ResponseInterceptor, ScopedInterceptor,
};
use crate::error::ApiError;

/// Name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "access_token";

/// Path of the sign-in route.
pub const SIGN_IN_PATH: &str = "/signin";

/// Build the `Authorization` header value for a token.
pub fn bearer_header(token: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("Bearer {}", token)).ok()
}

// =============================================================================
// Navigation
// =============================================================================

/// Client-side navigation.
pub trait Navigator: Send + Sync {
    /// Move to `path`.
    fn navigate(&self, path: &str);
}

/// Navigator that records the current location and every navigation.
#[derive(Debug)]
pub struct Location {
    current: RwLock<String>,
    history: RwLock<Vec<String>>,
}

impl Location {
    /// Start at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            current: RwLock::new(path.into()),
            history: RwLock::new(Vec::new()),
        }
    }

    /// The current path.
    pub fn current(&self) -> String {
        self.current.read().clone()
    }

    /// Every path navigated to, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history.read().clone()
    }

    /// How many times `path` was navigated to.
    pub fn visits(&self, path: &str) -> usize {
        self.history.read().iter().filter(|p| *p == path).count()
    }
}

impl Navigator for Location {
    fn navigate(&self, path: &str) {
        debug!(path, "Navigating");
        *self.current.write() = path.to_string();
        self.history.write().push(path.to_string());
    }
}

// =============================================================================
// Interceptors
// =============================================================================

/// Path the client is currently on, shared between the request interceptor
/// and the navigator that moves it.
#[derive(Debug, Clone, Default)]
pub struct CurrentPath(Arc<RwLock<String>>);

impl CurrentPath {
    /// Start at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(path.into())))
    }

    pub fn get(&self) -> String {
        self.0.read().clone()
    }

    pub fn set(&self, path: &str) {
        *self.0.write() = path.to_string();
    }

    fn is_sign_in(&self) -> bool {
        *self.0.read() == SIGN_IN_PATH
    }
}

/// Attaches the session token to outgoing requests.
///
/// The path is read at intercept time, so navigations made after the
/// interceptor was built are honored.
pub struct BearerTokenInterceptor {
    cookies: CookieStore,
    path: CurrentPath,
}

impl BearerTokenInterceptor {
    /// Create an interceptor for requests issued while on `path`.
    pub fn new(cookies: CookieStore, path: impl Into<String>) -> Self {
        Self::tracking(cookies, CurrentPath::new(path))
    }

    /// Create an interceptor following a shared current path.
    pub fn tracking(cookies: CookieStore, path: CurrentPath) -> Self {
        Self { cookies, path }
    }
}

impl RequestInterceptor for BearerTokenInterceptor {
    fn intercept(&self, request: &mut Request) {
        if self.path.is_sign_in() {
            return;
        }

        let Some(token) = self.cookies.get(SESSION_COOKIE).filter(|t| !t.is_empty()) else {
            return;
        };

        match bearer_header(&token) {
            Some(value) => {
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            None => warn!("Session token is not a valid header value, sending without it"),
        }
    }
}

/// Clears the session and redirects to sign-in on 401.
pub struct UnauthorizedInterceptor {
    cookies: CookieStore,
    navigator: Arc<dyn Navigator>,
}

impl UnauthorizedInterceptor {
    /// Create an interceptor that navigates with `navigator`.
    pub fn new(cookies: CookieStore, navigator: Arc<dyn Navigator>) -> Self {
        Self { cookies, navigator }
    }
}

impl ResponseInterceptor for UnauthorizedInterceptor {
    fn on_error(&self, error: &ApiError) {
        if !error.is_unauthorized() {
            return;
        }

        debug!(status = 401, "Backend rejected session, signing out");
        self.cookies.remove(SESSION_COOKIE);
        self.navigator.navigate(SIGN_IN_PATH);
    }
}

// =============================================================================
// Scoped Pair
// =============================================================================

/// Forwards navigations and records the new path for the request interceptor.
struct PathTrackingNavigator {
    inner: Arc<dyn Navigator>,
    path: CurrentPath,
}

impl Navigator for PathTrackingNavigator {
    fn navigate(&self, path: &str) {
        self.path.set(path);
        self.inner.navigate(path);
    }
}

/// Identity of a navigator, used to detect when it is replaced.
fn navigator_identity(navigator: &Arc<dyn Navigator>) -> usize {
    Arc::as_ptr(navigator) as *const () as usize
}

/// Owns the registrations of the interceptor pair on one registry.
pub struct AuthInterceptors {
    cookies: CookieStore,
    path: CurrentPath,
    request: ScopedInterceptor<String, dyn RequestInterceptor>,
    response: ScopedInterceptor<usize, dyn ResponseInterceptor>,
}

impl AuthInterceptors {
    /// Create an unbound pair on `registry`, reading tokens from `cookies`.
    pub fn new(registry: &InterceptorRegistry, cookies: CookieStore) -> Self {
        Self {
            cookies,
            path: CurrentPath::default(),
            request: ScopedInterceptor::new(Arc::clone(registry.request())),
            response: ScopedInterceptor::new(Arc::clone(registry.response())),
        }
    }

    /// Rebind the request interceptor for a new current path.
    ///
    /// Returns `true` if the registration was replaced.
    pub fn on_path_change(&self, path: &str) -> bool {
        self.path.set(path);
        let cookies = self.cookies.clone();
        let current = self.path.clone();
        self.request.bind(path.to_string(), move |_| {
            Arc::new(BearerTokenInterceptor::tracking(cookies, current))
                as Arc<dyn RequestInterceptor>
        })
    }

    /// The path the pair currently considers active.
    pub fn current_path(&self) -> String {
        self.path.get()
    }

    /// Rebind the response interceptor for a new navigator.
    ///
    /// Navigations made through it also move the request interceptor's path.
    /// Returns `true` if the registration was replaced.
    pub fn on_navigator_change(&self, navigator: Arc<dyn Navigator>) -> bool {
        let cookies = self.cookies.clone();
        let path = self.path.clone();
        self.response.bind(navigator_identity(&navigator), move |_| {
            let tracking = Arc::new(PathTrackingNavigator {
                inner: navigator,
                path,
            });
            Arc::new(UnauthorizedInterceptor::new(cookies, tracking))
                as Arc<dyn ResponseInterceptor>
        })
    }

    /// Detach both interceptors.
    pub fn release(&self) {
        self.request.release();
        self.response.release();
    }
}

impl Drop for AuthInterceptors {
    fn drop(&mut self) {
        self.release();
    }
}
