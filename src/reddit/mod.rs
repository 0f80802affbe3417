//! Reddit API integration module.
//!
//! This module contains the Reddit client: password-grant authentication,
//! the media upload exchange, and text, link and media submissions.

mod api;
mod auth;
mod media;
mod post;
mod submit;

use reqwest::Client;
use std::time::Duration;

use crate::oauth::{Credentials, TokenStore};

pub use media::{extract_location, guess_mime_type, media_filename, media_kind, MediaKind, UploadLease};
pub use post::{resolve_post_kind, PostKind, PostRequest, SubmissionResult};

#[allow(unused_imports)]
pub(crate) use api::sanitize_for_logging;

/// Timeout for the token exchange.
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for submissions and upload lease requests.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for downloading the source media.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(60);
/// Timeout for the storage upload.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Remote endpoints used by [`RedditClient`].
///
/// The defaults point at Reddit; tests swap them for a local stub server.
#[derive(Debug, Clone, PartialEq)]
pub struct RedditEndpoints {
    /// Password-grant token endpoint.
    pub token_url: String,
    /// Base URL of the OAuth API (`/api/submit`, `/api/media/asset`).
    pub api_base: String,
    /// Scheme prefixed to the protocol-relative lease `action`.
    pub upload_scheme: String,
}

impl Default for RedditEndpoints {
    fn default() -> Self {
        RedditEndpoints {
            token_url: "https://www.reddit.com/api/v1/access_token".to_string(),
            api_base: "https://oauth.reddit.com".to_string(),
            upload_scheme: "https:".to_string(),
        }
    }
}

impl RedditEndpoints {
    pub fn submit_url(&self) -> String {
        format!("{}/api/submit", self.api_base)
    }

    pub fn media_asset_url(&self) -> String {
        format!("{}/api/media/asset", self.api_base)
    }

    /// Storage upload URL for a protocol-relative lease `action`.
    pub fn upload_url(&self, action: &str) -> String {
        format!("{}{}", self.upload_scheme, action)
    }
}

/// Session with the Reddit API.
///
/// Owns the HTTP client, the endpoints and the [`TokenStore`]. One instance
/// is shared (behind an `Arc`) by every request the server handles.
#[derive(Debug)]
pub struct RedditClient {
    http: Client,
    endpoints: RedditEndpoints,
    tokens: TokenStore,
}

impl RedditClient {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_endpoints(credentials, RedditEndpoints::default())
    }

    pub fn with_endpoints(credentials: Credentials, endpoints: RedditEndpoints) -> Self {
        RedditClient {
            http: Client::new(),
            endpoints,
            tokens: TokenStore::new(credentials),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn endpoints(&self) -> &RedditEndpoints {
        &self.endpoints
    }
}

#[cfg(test)]
mod tests;
