//! Post mutations on the webhook API.
//!
//! Mutations never touch the query cache; callers invalidate what they need.

use serde::Serialize;
use tracing::{debug, warn};

use super::model::{MessageResult, PostStatus};
use crate::client::{mutation_fetch, ApiBase, ClientContext, MutationMethod};
use crate::error::MutationError;

/// Topic generation endpoint.
pub const GENERATE_TOPIC_PATH: &str = "/generate-topic";

/// Status update endpoint.
pub const APPROVE_PATH: &str = "/approve";

/// Detail reported when a status update has no post id.
pub const MISSING_POST_ID: &str = "Post ID not provided";

/// Input of [`generate_topic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateTopic {
    #[serde(rename = "topics")]
    pub topic: String,

    pub image_generated: bool,
}

impl GenerateTopic {
    /// Generate text content for `topic`, without an image.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            image_generated: false,
        }
    }

    /// Also generate an image.
    pub fn with_image(mut self, image_generated: bool) -> Self {
        self.image_generated = image_generated;
        self
    }
}

/// Input of [`update_post_status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostStatus {
    pub post_id: String,
    pub status: PostStatus,
}

impl UpdatePostStatus {
    pub fn new(post_id: impl Into<String>, status: PostStatus) -> Self {
        Self {
            post_id: post_id.into(),
            status,
        }
    }

    /// Mark `post_id` as approved.
    pub fn approve(post_id: impl Into<String>) -> Self {
        Self::new(post_id, PostStatus::Approved)
    }
}

type SuccessCallback<T> = Box<dyn FnOnce(&T) + Send>;
type ErrorCallback = Box<dyn FnOnce(&MutationError) + Send>;

/// Optional callbacks run once a mutation settles.
///
/// The mutation's `Result` is still returned to the caller afterwards.
pub struct MutationOptions<T> {
    on_success: Option<SuccessCallback<T>>,
    on_error: Option<ErrorCallback>,
}

impl<T> MutationOptions<T> {
    /// No callbacks.
    pub fn new() -> Self {
        Self {
            on_success: None,
            on_error: None,
        }
    }

    /// Run `f` with the result on success.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Run `f` with the error on failure.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&MutationError) + Send + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }

    fn settle(self, result: Result<T, MutationError>) -> Result<T, MutationError> {
        match &result {
            Ok(value) => {
                if let Some(f) = self.on_success {
                    f(value);
                }
            }
            Err(err) => {
                if let Some(f) = self.on_error {
                    f(err);
                }
            }
        }
        result
    }
}

impl<T> Default for MutationOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Ask the webhook API to generate content for a topic.
pub async fn generate_topic(
    ctx: &ClientContext,
    input: &GenerateTopic,
    options: MutationOptions<MessageResult>,
) -> Result<MessageResult, MutationError> {
    debug!(
        topic = %input.topic,
        image_generated = input.image_generated,
        "Requesting topic generation"
    );

    let result = mutation_fetch(
        ctx,
        ApiBase::Webhook,
        MutationMethod::Post,
        GENERATE_TOPIC_PATH,
        Some(input),
    )
    .await;

    if let Err(err) = &result {
        warn!(status = err.status, detail = %err.detail, "Topic generation failed");
    }
    options.settle(result)
}

/// Change the status of a post.
///
/// A blank post id fails with status 400 before any request is sent.
pub async fn update_post_status(
    ctx: &ClientContext,
    input: &UpdatePostStatus,
    options: MutationOptions<MessageResult>,
) -> Result<MessageResult, MutationError> {
    if input.post_id.trim().is_empty() {
        return options.settle(Err(MutationError::new(400, MISSING_POST_ID)));
    }

    debug!(post_id = %input.post_id, status = %input.status, "Updating post status");

    let result = mutation_fetch(
        ctx,
        ApiBase::Webhook,
        MutationMethod::Put,
        APPROVE_PATH,
        Some(input),
    )
    .await;

    if let Err(err) = &result {
        warn!(
            post_id = %input.post_id,
            status = err.status,
            detail = %err.detail,
            "Status update failed"
        );
    }
    options.settle(result)
}
