//! HTTP client layer.
//!
//! ```text
//! caller ──► ClientContext::execute
//!              │  default headers (Authorization if set_token was called)
//!              │  request interceptors (BearerTokenInterceptor)
//!              ▼
//!            reqwest ──► backend (main | webhook | public)
//!              │
//!              ▼
//!            response interceptors (UnauthorizedInterceptor on 401)
//!              │
//!              ▼
//!            query_fetch / mutation_fetch / query_fetch_server
//! ```

pub mod auth;
mod context;
mod cookie;
mod fetch;
pub mod interceptor;

pub use auth::{
    bearer_header, AuthInterceptors, BearerTokenInterceptor, CurrentPath, Location, Navigator,
    UnauthorizedInterceptor, SESSION_COOKIE, SIGN_IN_PATH,
};
pub use context::{parse_base_url, ApiBase, BaseUrls, ClientContext};
pub use cookie::CookieStore;
pub use fetch::{
    mutation_fetch, query_fetch, query_fetch_server, MutationMethod, NoParams,
    ServerQueryResult, NO_PARAMS,
};
pub use interceptor::{
    InterceptorGuard, InterceptorId, InterceptorRegistry, Interceptors, RequestInterceptor,
    ResponseInterceptor, ScopedInterceptor,
};
