//! # Redpost Library
//!
//! A small HTTP gateway that creates Reddit posts. Callers send one JSON
//! request to `POST /post`; the service authenticates with the OAuth 2.0
//! password grant, uploads media when needed, and submits a text, link,
//! image or video post.
//!
//! ## Configuration
//!
//! - `REDPOST_CONFIG`: Path of the JSON credentials file (defaults to `reddit_config.json`)
//! - `PORT`: Server port (defaults to 5000)
//! - `RUST_LOG`: Log level
//!
//! ## API Endpoints
//!
//! - `GET /health`: Returns service health status
//! - `POST /post`: Publishes a post, auto-detecting its type

pub mod config;
pub mod error;
pub mod handlers;
pub mod oauth;
pub mod reddit;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

// Re-export commonly used types and functions
pub use config::{get_config_path, get_server_port, AppConfig};
pub use error::GatewayError;
pub use handlers::{handle_health, handle_post, AppState};
pub use oauth::{build_authorization_header, build_basic_auth_header, Credentials, Token, TokenStore};
pub use reddit::{
    resolve_post_kind, PostKind, PostRequest, RedditClient, RedditEndpoints, SubmissionResult,
};

/// Builds the application router without middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/post", post(handle_post))
        .with_state(state)
}
