//! Data-access operations for generated posts.
//!
//! | Operation            | Base    | Request                              |
//! |----------------------|---------|--------------------------------------|
//! | `fetch_posts`        | main    | `GET /api/v1/posts?status=`          |
//! | `fetch_post_by_id`   | main    | `GET /api/v1/post/id?post_id=`       |
//! | `generate_topic`     | webhook | `POST /generate-topic`               |
//! | `update_post_status` | webhook | `PUT /approve`                       |

mod model;
mod mutations;
mod queries;

pub use model::{
    ImageData, MessageResult, Platform, PlatformData, PostData, PostListResponse, PostResponse,
    PostStatus,
};
pub use mutations::{
    generate_topic, update_post_status, GenerateTopic, MutationOptions, UpdatePostStatus,
    APPROVE_PATH, GENERATE_TOPIC_PATH, MISSING_POST_ID,
};
pub use queries::{
    fetch_post_by_id, fetch_post_by_id_server, fetch_posts, fetch_posts_server, post_key,
    posts_key, POSTS_PATH, POSTS_RESOURCE, POST_BY_ID_PATH, POST_RESOURCE,
};
