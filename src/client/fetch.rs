//! Query and mutation fetch helpers.
//!
//! - [`query_fetch`]: GET, fails with [`ApiError`] carrying the raw response.
//! - [`mutation_fetch`]: JSON body, fails with a normalized [`MutationError`].
//! - [`query_fetch_server`]: GET with an explicit token, never fails; callers
//!   branch on [`ServerQueryResult::is_error`].

use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{Method, StatusCode};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};

use super::auth::bearer_header;
use super::context::{ApiBase, ClientContext};
use crate::error::{ApiError, ErrorBody, MutationError, RawResponse};

/// Empty query parameter set, for calls that pass `None`.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NoParams {}

/// No query parameters.
pub const NO_PARAMS: Option<&'static NoParams> = None;

/// HTTP methods accepted by [`mutation_fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationMethod {
    Post,
    Put,
    Patch,
    Delete,
}

impl From<MutationMethod> for Method {
    fn from(method: MutationMethod) -> Self {
        match method {
            MutationMethod::Post => Method::POST,
            MutationMethod::Put => Method::PUT,
            MutationMethod::Patch => Method::PATCH,
            MutationMethod::Delete => Method::DELETE,
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

/// Decode a successful mutation response.
///
/// Any 2xx counts as success: an empty or unparseable body yields `T::default()`.
async fn decode_acknowledgement<T>(response: Response) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::Connection(e.to_string()))?;

    if body.trim().is_empty() {
        return Ok(T::default());
    }

    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(
                status = status.as_u16(),
                error = %e,
                "Mutation succeeded with an unexpected body"
            );
            Ok(T::default())
        }
    }
}

/// GET `url` on `base`, with `params` form-encoded into the query string.
pub async fn query_fetch<T, Q>(
    ctx: &ClientContext,
    base: ApiBase,
    url: &str,
    params: Option<&Q>,
) -> Result<T, ApiError>
where
    T: DeserializeOwned,
    Q: Serialize + ?Sized,
{
    let response = ctx
        .execute(base, Method::GET, url, |builder| match params {
            Some(params) => builder.query(params),
            None => builder,
        })
        .await?;

    decode(response).await
}

/// Send a JSON mutation to `url` on `base`.
///
/// Failures are normalized to `{status, detail}`; see [`MutationError`].
/// Any 2xx answer succeeds, whatever its body.
pub async fn mutation_fetch<T, B>(
    ctx: &ClientContext,
    base: ApiBase,
    method: MutationMethod,
    url: &str,
    body: Option<&B>,
) -> Result<T, MutationError>
where
    T: DeserializeOwned + Default,
    B: Serialize + ?Sized,
{
    let response = ctx
        .execute(base, method.into(), url, |builder| {
            let builder = builder.header(CONTENT_TYPE, "application/json");
            match body {
                Some(body) => builder.json(body),
                None => builder,
            }
        })
        .await?;

    Ok(decode_acknowledgement(response).await?)
}

/// Result envelope of [`query_fetch_server`].
#[derive(Debug, Clone)]
pub struct ServerQueryResult<T> {
    /// Parsed body on success
    pub data: Option<T>,

    /// Whether the fetch failed
    pub is_error: bool,

    /// Backend error body, when the failure carried one
    pub error: Option<ErrorBody>,

    /// Status of the failing response, when there was one
    pub status: Option<StatusCode>,
}

impl<T> ServerQueryResult<T> {
    fn success(data: T) -> Self {
        Self {
            data: Some(data),
            is_error: false,
            error: None,
            status: None,
        }
    }

    fn failure(err: &ApiError) -> Self {
        Self {
            data: None,
            is_error: true,
            error: err.response().and_then(RawResponse::error_body),
            status: err.status(),
        }
    }

    /// Whether the backend rejected the token.
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(StatusCode::UNAUTHORIZED)
    }

    /// Transform the data, keeping the error fields.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ServerQueryResult<U> {
        ServerQueryResult {
            data: self.data.map(f),
            is_error: self.is_error,
            error: self.error,
            status: self.status,
        }
    }
}

/// GET for server rendering: attaches `token` explicitly and never fails.
pub async fn query_fetch_server<T, Q>(
    ctx: &ClientContext,
    base: ApiBase,
    url: &str,
    params: Option<&Q>,
    token: Option<&str>,
) -> ServerQueryResult<T>
where
    T: DeserializeOwned,
    Q: Serialize + ?Sized,
{
    let authorization = token.and_then(bearer_header);

    let outcome = match ctx
        .execute(base, Method::GET, url, |builder| {
            let builder = match params {
                Some(params) => builder.query(params),
                None => builder,
            };
            match authorization {
                Some(value) => builder.header(AUTHORIZATION, value),
                None => builder,
            }
        })
        .await
    {
        Ok(response) => decode::<T>(response).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(data) => ServerQueryResult::success(data),
        Err(err) => {
            error!(base = base.name(), url, error = %err, "Server-side query failed");
            ServerQueryResult::failure(&err)
        }
    }
}
