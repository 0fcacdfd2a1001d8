//! HTML rendering for dashboard pages.

use crate::client::ServerQueryResult;
use crate::posts::{Platform, PostData};

/// Topics offered as suggestions in the generate form.
pub const SUGGESTED_TOPICS: [&str; 7] = [
    "EV Charging",
    "Climate Change",
    "Green Energy",
    "Clean Mobility",
    "Battery Recycling",
    "Solar Innovation",
    "Smart Grids",
];

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Banner shown at the top of the dashboard after a form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    Notice(&'static str),
    Error(&'static str),
}

impl Banner {
    /// Banner for the `notice`/`error` query codes. Unknown codes show nothing.
    pub fn from_codes(notice: Option<&str>, error: Option<&str>) -> Option<Self> {
        if let Some(code) = error {
            return match code {
                "generate" => Some(Banner::Error("Something went wrong while generating!")),
                "approve" => Some(Banner::Error("Something went wrong!")),
                "topic" => Some(Banner::Error("Enter a topic to generate content.")),
                _ => None,
            };
        }

        match notice? {
            "generated" => Some(Banner::Notice(
                "Content generated successfully! Please check email for approval.",
            )),
            "approved" => Some(Banner::Notice("Post approved successfully!")),
            _ => None,
        }
    }

    fn render(&self) -> String {
        let (class, text) = match self {
            Banner::Notice(text) => ("notice", text),
            Banner::Error(text) => ("error", text),
        };
        format!(r#"<p class="banner {}">{}</p>"#, class, html_escape(text))
    }
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="description" content="Generate and approve AI marketing content">
    <title>{title}</title>
</head>
<body>
{body}
</body>
</html>"#,
        title = html_escape(title),
        body = body
    )
}

fn generate_form() -> String {
    let suggestions: String = SUGGESTED_TOPICS
        .iter()
        .map(|topic| format!(r#"<option value="{}"></option>"#, html_escape(topic)))
        .collect();

    format!(
        r#"<form method="post" action="/generate" class="generate">
    <input type="text" name="topic" list="suggested-topics" placeholder="Ask or enter a topic..." required>
    <datalist id="suggested-topics">{suggestions}</datalist>
    <label><input type="checkbox" name="image_generated" value="true"> Generate Image</label>
    <button type="submit">Generate</button>
</form>"#
    )
}

fn post_card(post: &PostData) -> String {
    let id = urlencoding::encode(&post.post_id);
    let platforms: String = post
        .platforms()
        .iter()
        .map(|p| format!(r#"<span class="chip">{}</span>"#, p.label()))
        .collect();

    format!(
        r#"<article class="post">
    <small>{created}</small>
    <h3>{topic}</h3>
    <p>Content generated for: {platforms}</p>
    <a href="/posts/{id}">Click to see details &gt;</a>
    <form method="post" action="/posts/{id}/approve"><button type="submit">Approve</button></form>
</article>"#,
        created = html_escape(&post.created_at),
        topic = html_escape(&post.topic),
        platforms = platforms,
        id = id
    )
}

/// Dashboard listing posts pending approval.
pub fn dashboard(posts: &ServerQueryResult<Vec<PostData>>, banner: Option<Banner>) -> String {
    let list = match &posts.data {
        Some(posts) if !posts.is_empty() => posts.iter().map(post_card).collect::<String>(),
        _ => r#"<p class="empty">No posts found.</p>"#.to_string(),
    };

    let body = format!(
        "{banner}\n{form}\n<section>\n<h2>Pending posts for approval</h2>\n{list}\n</section>",
        banner = banner.map(|b| b.render()).unwrap_or_default(),
        form = generate_form(),
        list = list
    );

    layout("Agentic AI - Social Media Marketing", &body)
}

fn platform_section(post: &PostData, platform: Platform) -> String {
    let Some(data) = post.platform(platform) else {
        return String::new();
    };

    let mut section = format!("<section>\n<h3>{}</h3>\n", platform.label());
    if let Some(title) = &data.title {
        section.push_str(&format!("<h4>{}</h4>\n", html_escape(title)));
    }
    if let Some(content) = &data.content {
        section.push_str(&format!("<p>{}</p>\n", html_escape(content)));
    }
    if let Some(message) = &data.message {
        section.push_str(&format!("<p>{}</p>\n", html_escape(message)));
    }
    if !data.tags.is_empty() {
        let tags: Vec<String> = data.tags.iter().map(|t| html_escape(t)).collect();
        section.push_str(&format!("<p class=\"tags\">{}</p>\n", tags.join(", ")));
    }
    section.push_str("</section>\n");
    section
}

/// Details of one post: platform content and generated images.
pub fn post_detail(post: &PostData) -> String {
    let mut body = format!(
        "<a href=\"/\">&lt; Back</a>\n<h2>{} - Platform Details</h2>\n",
        html_escape(&post.topic)
    );

    for platform in [Platform::Blog, Platform::Linkedin, Platform::Whatsapp] {
        body.push_str(&platform_section(post, platform));
    }

    let images: Vec<&str> = post
        .images
        .iter()
        .map(|image| image.google_drive_file_id.as_str())
        .filter(|id| !id.is_empty())
        .collect();

    if !images.is_empty() {
        body.push_str("<section>\n<h3>Generated Images</h3>\n");
        for (idx, id) in images.iter().enumerate() {
            body.push_str(&format!(
                "<img loading=\"lazy\" src=\"/api/image/{}\" alt=\"Generated Image {}\">\n",
                urlencoding::encode(id),
                idx + 1
            ));
        }
        body.push_str("</section>\n");
    }

    let id = urlencoding::encode(&post.post_id);
    body.push_str(&format!(
        r#"<form method="post" action="/posts/{id}/approve"><button type="submit">Approve</button></form>"#
    ));

    layout(&post.topic, &body)
}

/// Shown when a post could not be loaded.
pub fn post_unavailable(post_id: &str) -> String {
    let body = format!(
        "<a href=\"/\">&lt; Back</a>\n<p class=\"empty\">Post {} could not be loaded.</p>",
        html_escape(post_id)
    );
    layout("Post unavailable", &body)
}

/// Sign-in placeholder. Login itself is handled by the backend.
pub fn signin() -> String {
    layout(
        "Sign in",
        "<h2>Sign in</h2>\n<p>Your session has ended. Sign in again to continue.</p>",
    )
}
