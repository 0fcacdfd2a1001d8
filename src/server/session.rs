//! Session guard for server-rendered routes.
//!
//! The session token lives in the `access_token` cookie. Its payload segment
//! is base64-decoded and `exp` (Unix seconds) is compared against the clock.
//!
//! # Trust boundary
//!
//! The signature is **not** verified. A forged token with a future `exp`
//! passes the guard; the backend is the party that authenticates it, and any
//! 401 it returns clears the cookie and redirects to sign-in.
//!
//! ```text
//! no cookie / empty         -> 302 /signin
//! undecodable / no exp      -> 302 /signin + clear cookie
//! exp < now                 -> 302 /signin + clear cookie
//! otherwise                 -> token
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use thiserror::Error;
use tracing::debug;

use crate::client::{SESSION_COOKIE, SIGN_IN_PATH};

// =============================================================================
// Errors
// =============================================================================

/// Why a request was sent to sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No session cookie, or an empty one
    #[error("No session token")]
    Missing,

    /// Token payload could not be read
    #[error("Session token is malformed: {0}")]
    Malformed(String),

    /// Token `exp` is in the past
    #[error("Session token expired at {expired_at} (now {now})")]
    Expired { expired_at: u64, now: u64 },

    /// Backend answered 401 while serving the request
    #[error("Backend rejected the session token")]
    Rejected,
}

impl SessionError {
    fn error_type(&self) -> &'static str {
        match self {
            SessionError::Missing => "missing_session",
            SessionError::Malformed(_) => "malformed_session",
            SessionError::Expired { .. } => "session_expired",
            SessionError::Rejected => "session_rejected",
        }
    }

    /// Whether the response should also clear the session cookie.
    pub fn clears_cookie(&self) -> bool {
        !matches!(self, SessionError::Missing)
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        debug!(
            error_type = self.error_type(),
            status = StatusCode::FOUND.as_u16(),
            "Redirecting to sign-in: {}",
            self
        );

        sign_in_redirect(self.clears_cookie())
    }
}

/// `302 Found` to the sign-in page, optionally clearing the session cookie.
pub fn sign_in_redirect(clear_cookie: bool) -> Response {
    let location = [(header::LOCATION, SIGN_IN_PATH)];
    if clear_cookie {
        let jar = CookieJar::new().add(clear_session_cookie());
        (StatusCode::FOUND, jar, location).into_response()
    } else {
        (StatusCode::FOUND, location).into_response()
    }
}

/// Removal cookie for the session: empty value, `Max-Age=0`.
pub fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(true)
        .build();
    cookie.make_removal();
    cookie
}

// =============================================================================
// Token Inspection
// =============================================================================

/// Read `exp` from the token's payload segment.
///
/// Accepts URL-safe or standard base64, with or without padding. `exp` must
/// be a positive JSON number; fractional values are truncated.
pub fn decode_token_expiry(token: &str) -> Result<u64, SessionError> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| SessionError::Malformed("missing payload segment".to_string()))?;

    let trimmed = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .map_err(|e| SessionError::Malformed(format!("payload is not base64: {}", e)))?;

    let claims: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| SessionError::Malformed(format!("payload is not JSON: {}", e)))?;

    claims
        .get("exp")
        .and_then(serde_json::Value::as_f64)
        .filter(|exp| exp.is_finite() && *exp > 0.0)
        .map(|exp| exp as u64)
        .ok_or_else(|| SessionError::Malformed("exp missing or not a positive number".to_string()))
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Session token from `headers`, if present and unexpired at `now` (Unix seconds).
pub fn require_user_session_at(headers: &HeaderMap, now: u64) -> Result<String, SessionError> {
    let jar = CookieJar::from_headers(headers);
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(SessionError::Missing)?;

    let expired_at = decode_token_expiry(&token)?;
    if expired_at < now {
        return Err(SessionError::Expired { expired_at, now });
    }

    Ok(token)
}

/// Session token from `headers`, if present and unexpired now.
pub fn require_user_session(headers: &HeaderMap) -> Result<String, SessionError> {
    require_user_session_at(headers, now_unix())
}

// =============================================================================
// Middleware
// =============================================================================

/// Validated session token, stored in request extensions by [`session_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

/// Redirect to sign-in unless the request carries a valid session.
pub async fn session_middleware(mut request: Request, next: Next) -> Result<Response, SessionError> {
    let token = require_user_session(request.headers())?;
    request.extensions_mut().insert(SessionToken(token));
    Ok(next.run(request).await)
}
