//! HTTP route handlers for the redpost service.
//!
//! This module contains the HTTP route handler functions that process
//! incoming requests and return appropriate responses.

use axum::{body::Bytes, extract::State, http::StatusCode, response::Json};
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::reddit::{PostRequest, RedditClient};

/// Shared state handed to every handler.
#[derive(Debug)]
pub struct AppState {
    pub client: RedditClient,
    /// Subreddit used when a request does not name one.
    pub default_subreddit: String,
}

impl AppState {
    pub fn new(client: RedditClient, default_subreddit: impl Into<String>) -> Arc<Self> {
        Arc::new(AppState {
            client,
            default_subreddit: default_subreddit.into(),
        })
    }
}

/// Body accepted by `POST /post`.
#[derive(Debug, Default, Deserialize)]
pub struct PostPayload {
    pub title: Option<String>,
    pub text: Option<String>,
    pub url: Option<String>,
    pub media_url: Option<String>,
    pub subreddit: Option<String>,
    pub post_type: Option<String>,
    pub flair_id: Option<String>,
}

type ErrorResponse = (StatusCode, Json<Value>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ErrorResponse {
    (status, Json(json!({ "error": message.into() })))
}

impl PostPayload {
    /// Validates the payload and fills in the default subreddit.
    fn into_request(self, default_subreddit: &str) -> Result<PostRequest, ErrorResponse> {
        let title = match self.title {
            Some(title) if !title.is_empty() => title,
            _ => {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    "Missing required field: title",
                ))
            }
        };

        let subreddit = self
            .subreddit
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default_subreddit.to_string());

        Ok(PostRequest {
            subreddit,
            title,
            text: self.text,
            url: self.url,
            media_url: self.media_url,
            post_type: self.post_type,
            flair_id: self.flair_id,
        })
    }
}

/// Handles GET requests to the `/health` endpoint.
///
/// # Example Response
///
/// ```json
/// { "status": "ok" }
/// ```
pub async fn handle_health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Handles POST requests to the `/post` endpoint.
///
/// The body is a JSON object:
///
/// ```json
/// {
///   "title": "Post title",
///   "text": "Post text (for text posts)",
///   "url": "https://example.com (for link posts)",
///   "media_url": "https://example.com/image.jpg (for media posts)",
///   "subreddit": "test (optional, uses the configured default)",
///   "post_type": "self|link|media (optional, auto-detected)",
///   "flair_id": "optional_flair_id"
/// }
/// ```
///
/// # Returns
///
/// - `200`: `{"success": true, "post_id", "post_name", "url"}`
/// - `400`: `{"error": ...}` when the body is not a non-empty JSON object, a field
///   has the wrong type, or `title` is missing
/// - `500`: `{"error": ...}` when publishing fails
pub async fn handle_post(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ErrorResponse> {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(Value::Object(fields)) if !fields.is_empty() => Value::Object(fields),
        Ok(_) => {
            warn!("Rejected /post request with an empty or non-object body");
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "No JSON data provided",
            ));
        }
        Err(e) => {
            warn!("Rejected /post request without a JSON object: {}", e);
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "No JSON data provided",
            ));
        }
    };

    let payload: PostPayload = serde_json::from_value(value).map_err(|e| {
        warn!("Rejected /post request with invalid fields: {}", e);
        error_response(StatusCode::BAD_REQUEST, format!("Invalid request field: {}", e))
    })?;

    let request = payload.into_request(&state.default_subreddit)?;
    info!(
        "Publishing {:?} post to r/{}: '{}'",
        request.kind(),
        request.subreddit,
        request.title
    );

    let result = state.client.submit_post(&request).await;
    if result.success {
        Ok(Json(json!({
            "success": true,
            "post_id": result.post_id,
            "post_name": result.post_name,
            "url": result.post_url(),
        })))
    } else {
        let detail = result.error.unwrap_or_else(|| "unknown error".to_string());
        error!("Failed to publish post: {}", detail);
        Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to publish post: {}", detail),
        ))
    }
}
