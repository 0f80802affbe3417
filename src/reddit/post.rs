//! Post requests, post kind resolution and submission results.

use serde::Serialize;

use crate::error::GatewayError;

/// The kind of post to create, with the field that kind needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostKind {
    /// A text post (`kind=self`).
    SelfPost,
    /// A link post (`kind=link`).
    Link { url: String },
    /// An image or video post, uploaded from `media_url` first.
    Media { media_url: String },
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Resolves the post kind from the requested type and the supplied fields.
///
/// Without an explicit `post_type`, a media URL makes a media post, a plain
/// URL makes a link post, and anything else is a text post. An explicit
/// `media` or `link` type only applies when its field is present; every
/// other combination falls back to a text post. Empty strings count as
/// absent.
pub fn resolve_post_kind(
    post_type: Option<&str>,
    url: Option<&str>,
    media_url: Option<&str>,
) -> PostKind {
    let url = present(url);
    let media_url = present(media_url);

    let requested = present(post_type).unwrap_or(if media_url.is_some() {
        "media"
    } else if url.is_some() {
        "link"
    } else {
        "self"
    });

    match (requested, url, media_url) {
        ("media", _, Some(media_url)) => PostKind::Media {
            media_url: media_url.to_string(),
        },
        ("link", Some(url), _) => PostKind::Link {
            url: url.to_string(),
        },
        _ => PostKind::SelfPost,
    }
}

/// A request to create one post. Built per inbound call and never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostRequest {
    pub subreddit: String,
    pub title: String,
    pub text: Option<String>,
    pub url: Option<String>,
    pub media_url: Option<String>,
    pub post_type: Option<String>,
    pub flair_id: Option<String>,
}

impl PostRequest {
    pub fn kind(&self) -> PostKind {
        resolve_post_kind(
            self.post_type.as_deref(),
            self.url.as_deref(),
            self.media_url.as_deref(),
        )
    }
}

/// Outcome of a submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmissionResult {
    pub success: bool,
    pub post_id: Option<String>,
    pub post_name: Option<String>,
    pub permalink: Option<String>,
    pub error: Option<String>,
}

impl SubmissionResult {
    pub(crate) fn posted(
        post_id: Option<String>,
        post_name: Option<String>,
        permalink: Option<String>,
    ) -> Self {
        SubmissionResult {
            success: true,
            post_id,
            post_name,
            permalink,
            error: None,
        }
    }

    pub(crate) fn failed(error: &GatewayError) -> Self {
        SubmissionResult {
            success: false,
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    /// Public URL of the created post, e.g. `https://reddit.com/r/test/abc`.
    pub fn post_url(&self) -> String {
        format!(
            "https://reddit.com{}",
            self.permalink.as_deref().unwrap_or_default()
        )
    }
}

impl From<Result<SubmissionResult, GatewayError>> for SubmissionResult {
    fn from(outcome: Result<SubmissionResult, GatewayError>) -> Self {
        match outcome {
            Ok(result) => result,
            Err(e) => SubmissionResult::failed(&e),
        }
    }
}
