//! Wire types for posts, as delivered by the backend (camelCase JSON).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Review status of a post.
///
/// Known values parse case-insensitively; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PostStatus {
    /// Awaiting review
    #[default]
    Generated,

    /// Approved for publishing
    Approved,

    /// Any status this crate does not know about
    Other(String),
}

impl PostStatus {
    /// Value sent on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            PostStatus::Generated => "Generated",
            PostStatus::Approved => "approved",
            PostStatus::Other(other) => other,
        }
    }
}

impl From<String> for PostStatus {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("generated") {
            PostStatus::Generated
        } else if value.eq_ignore_ascii_case("approved") {
            PostStatus::Approved
        } else {
            PostStatus::Other(value)
        }
    }
}

impl From<&str> for PostStatus {
    fn from(value: &str) -> Self {
        PostStatus::from(value.to_string())
    }
}

impl From<PostStatus> for String {
    fn from(status: PostStatus) -> Self {
        match status {
            PostStatus::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Content generated for one platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A generated image stored on Google Drive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    #[serde(default)]
    pub public_image_url: String,

    #[serde(default)]
    pub google_drive_image_url: String,

    #[serde(default)]
    pub google_drive_file_id: String,
}

/// Platforms a post can carry content for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Blog,
    Linkedin,
    Whatsapp,
}

impl Platform {
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Blog => "Blog",
            Platform::Linkedin => "LinkedIn",
            Platform::Whatsapp => "WhatsApp",
        }
    }
}

/// A generated post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
    pub post_id: String,

    pub topic: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blog: Option<PlatformData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<PlatformData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<PlatformData>,

    #[serde(default)]
    pub status: PostStatus,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageData>,

    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub updated_at: String,
}

impl PostData {
    /// Platforms this post has content for, in display order.
    pub fn platforms(&self) -> Vec<Platform> {
        [
            (Platform::Blog, self.blog.is_some()),
            (Platform::Linkedin, self.linkedin.is_some()),
            (Platform::Whatsapp, self.whatsapp.is_some()),
        ]
        .into_iter()
        .filter_map(|(platform, present)| present.then_some(platform))
        .collect()
    }

    /// Content for `platform`, if any.
    pub fn platform(&self, platform: Platform) -> Option<&PlatformData> {
        match platform {
            Platform::Blog => self.blog.as_ref(),
            Platform::Linkedin => self.linkedin.as_ref(),
            Platform::Whatsapp => self.whatsapp.as_ref(),
        }
    }
}

/// Envelope of `GET /api/v1/posts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostListResponse {
    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,

    #[serde(default)]
    pub data: Vec<PostData>,
}

/// Envelope of `GET /api/v1/post/id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostResponse {
    #[serde(default)]
    pub message: String,

    pub data: PostData,
}

/// Generic acknowledgement returned by mutations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}
