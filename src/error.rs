use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status reported for a failed mutation when the backend gave none.
pub const DEFAULT_MUTATION_STATUS: u16 = 500;

/// Detail reported for a failed mutation when the backend gave none.
pub const DEFAULT_MUTATION_DETAIL: &str = "Something went wrong";

// =============================================================================
// Raw Response
// =============================================================================

/// A non-success response captured verbatim from the backend.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status returned by the backend
    pub status: StatusCode,

    /// Response headers
    pub headers: HeaderMap,

    /// Response body as text (empty if unreadable)
    pub body: String,
}

impl RawResponse {
    /// Parse the body as the backend's JSON error shape, if it is one.
    pub fn error_body(&self) -> Option<ErrorBody> {
        serde_json::from_str(&self.body).ok()
    }

    /// The body's top-level `detail` string, when present and non-empty.
    ///
    /// Read from the raw JSON so unrelated fields of any shape do not hide it.
    pub fn detail(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(&self.body).ok()?;
        value
            .get("detail")
            .and_then(serde_json::Value::as_str)
            .filter(|detail| !detail.is_empty())
            .map(str::to_string)
    }
}

/// Error body the backend sends alongside failing responses.
///
/// Every field is optional; backends are inconsistent about which ones they fill.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<std::collections::HashMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

// =============================================================================
// Query Errors
// =============================================================================

/// Errors surfaced by query fetches against the backend.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Backend answered with a non-success status
    #[error("Backend returned {}", .0.status)]
    Response(Box<RawResponse>),

    /// No response was received (DNS, TCP, TLS, timeout)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Response arrived but its body did not have the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status of the failing response, if there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Response(raw) => Some(raw.status),
            _ => None,
        }
    }

    /// The raw response carried by this error, if any.
    pub fn response(&self) -> Option<&RawResponse> {
        match self {
            ApiError::Response(raw) => Some(raw),
            _ => None,
        }
    }

    /// Whether the backend rejected the request's credentials.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

// =============================================================================
// Mutation Errors
// =============================================================================

/// Normalized failure of a mutation: `{status, detail}`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{detail} (status {status})")]
pub struct MutationError {
    /// HTTP status, 500 when the backend gave none
    pub status: u16,

    /// Backend-provided detail, or a generic message
    pub detail: String,
}

impl MutationError {
    /// Create a mutation error with an explicit status and detail.
    pub fn new(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Whether the backend rejected the request's credentials.
    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED.as_u16()
    }
}

impl From<ApiError> for MutationError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Response(raw) => {
                let detail = raw
                    .detail()
                    .unwrap_or_else(|| DEFAULT_MUTATION_DETAIL.to_string());
                MutationError::new(raw.status.as_u16(), detail)
            }
            _ => MutationError::new(DEFAULT_MUTATION_STATUS, DEFAULT_MUTATION_DETAIL),
        }
    }
}

// =============================================================================
// Image Proxy Errors
// =============================================================================

/// Errors from the image proxy route.
#[derive(Debug, Clone, Error)]
pub enum ProxyError {
    /// No image identifier in the request
    #[error("Missing image ID")]
    MissingId,

    /// Image host answered with a non-success status
    #[error("Image host returned {status}")]
    Upstream { status: u16 },

    /// Image host could not be reached
    #[error("Image not found or forbidden: {0}")]
    Unreachable(String),
}

// =============================================================================
// Client Construction Errors
// =============================================================================

/// Errors raised while assembling a [`crate::client::ClientContext`].
#[derive(Debug, Clone, Error)]
pub enum ContextError {
    /// A base URL is missing or not an absolute http(s) URL
    #[error("Invalid {base} base URL '{url}': {reason}")]
    InvalidBaseUrl {
        base: &'static str,
        url: String,
        reason: String,
    },

    /// The underlying HTTP client could not be built
    #[error("HTTP client could not be constructed: {0}")]
    Client(String),
}
