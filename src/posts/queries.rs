//! Post queries on the main API.
//!
//! The cached variants back the CLI and any long-lived client; the `_server`
//! variants are used while rendering a page with the caller's own token.

use serde::Serialize;

use super::model::{PostData, PostListResponse, PostResponse, PostStatus};
use crate::client::{query_fetch, query_fetch_server, ApiBase, ClientContext, ServerQueryResult};
use crate::error::ApiError;
use crate::query::{QueryCache, QueryKey};

/// List endpoint.
pub const POSTS_PATH: &str = "/api/v1/posts";

/// Single-post endpoint.
pub const POST_BY_ID_PATH: &str = "/api/v1/post/id";

/// Cache resource for post lists, keyed by status.
pub const POSTS_RESOURCE: &str = "posts";

/// Cache resource for single posts, keyed by id.
pub const POST_RESOURCE: &str = "post";

#[derive(Debug, Serialize)]
struct PostsQuery<'a> {
    status: &'a PostStatus,
}

#[derive(Debug, Serialize)]
struct PostByIdQuery<'a> {
    post_id: &'a str,
}

/// Query key of the post list for `status`.
pub fn posts_key(status: &PostStatus) -> QueryKey {
    QueryKey::new(POSTS_RESOURCE, Some(status.to_string()))
}

/// Query key of the post `post_id`.
pub fn post_key(post_id: &str) -> QueryKey {
    QueryKey::new(POST_RESOURCE, Some(post_id.to_string()))
}

/// Posts with `status`, served from `cache` while fresh.
pub async fn fetch_posts(
    ctx: &ClientContext,
    cache: &QueryCache,
    status: &PostStatus,
) -> Result<Vec<PostData>, ApiError> {
    cache
        .fetch(posts_key(status), || async {
            let query = PostsQuery { status };
            let response: PostListResponse =
                query_fetch(ctx, ApiBase::Main, POSTS_PATH, Some(&query)).await?;
            Ok::<_, ApiError>(response.data)
        })
        .await
}

/// The post `post_id`, served from `cache` while fresh.
///
/// The query is disabled when the id is absent or blank: `Ok(None)` is
/// returned and nothing is sent.
pub async fn fetch_post_by_id(
    ctx: &ClientContext,
    cache: &QueryCache,
    post_id: Option<&str>,
) -> Result<Option<PostData>, ApiError> {
    let Some(post_id) = post_id.filter(|id| !id.trim().is_empty()) else {
        return Ok(None);
    };

    cache
        .fetch(post_key(post_id), || async {
            let query = PostByIdQuery { post_id };
            let response: PostResponse =
                query_fetch(ctx, ApiBase::Main, POST_BY_ID_PATH, Some(&query)).await?;
            Ok::<_, ApiError>(response.data)
        })
        .await
        .map(Some)
}

/// Posts with `status`, fetched with `token` for server rendering.
pub async fn fetch_posts_server(
    ctx: &ClientContext,
    status: &PostStatus,
    token: Option<&str>,
) -> ServerQueryResult<Vec<PostData>> {
    let query = PostsQuery { status };
    query_fetch_server::<PostListResponse, _>(ctx, ApiBase::Main, POSTS_PATH, Some(&query), token)
        .await
        .map(|response| response.data)
}

/// The post `post_id`, fetched with `token` for server rendering.
pub async fn fetch_post_by_id_server(
    ctx: &ClientContext,
    post_id: &str,
    token: Option<&str>,
) -> ServerQueryResult<PostData> {
    let query = PostByIdQuery { post_id };
    query_fetch_server::<PostResponse, _>(ctx, ApiBase::Main, POST_BY_ID_PATH, Some(&query), token)
        .await
        .map(|response| response.data)
}
