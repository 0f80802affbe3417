//! # Redpost
//!
//! A Rust web service that publishes posts to Reddit through a single local
//! endpoint, using OAuth 2.0 password-grant authentication.
//!
//! ## API Endpoints
//!
//! - `GET /health`: Health check
//! - `POST /post`: Post to Reddit

use log::{error, info};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use redpost::{build_router, get_config_path, get_server_port, AppConfig, AppState, RedditClient};

/// Main entry point for the redpost web service.
///
/// Loads the configuration (creating a placeholder file on first run),
/// authenticates with Reddit once, and serves requests until terminated.
/// Any startup failure is logged and the process exits with status 1.
///
/// # Example Usage
///
/// ```bash
/// # Run with default port 5000
/// cargo run
///
/// # Run with a custom config and debug logging
/// REDPOST_CONFIG=/etc/redpost.json RUST_LOG=debug cargo run
/// ```
#[tokio::main]
async fn main() {
    env_logger::init();

    info!("Initializing Reddit poster...");
    let config_path = get_config_path();
    let config = match AppConfig::load_or_create(&config_path).and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            error!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let client = RedditClient::new(config.credentials());
    if !client.authenticate().await {
        error!("Error: Failed to authenticate with Reddit");
        std::process::exit(1);
    }
    info!("Reddit poster initialized successfully");

    let state = AppState::new(client, config.default_subreddit);
    let app = build_router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let port = get_server_port();
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    info!("Starting redpost server on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("HTTP server error: {}", e);
    }
}

/// Resolves on Ctrl-C so in-flight requests can finish before exit.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping server");
}
