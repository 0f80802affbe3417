//! Configuration module for the redpost service.
//!
//! This module loads the Reddit application credentials from a JSON file,
//! creating a placeholder file on first run, and reads the server settings
//! from environment variables.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::GatewayError;
use crate::oauth::Credentials;

/// Config file used when `REDPOST_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "reddit_config.json";

/// Port used when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 5000;

const DEFAULT_SUBREDDIT: &str = "test";

/// Keys that must be replaced before the service can authenticate.
const REQUIRED_KEYS: [&str; 4] = ["client_id", "client_secret", "username", "password"];

fn default_subreddit() -> String {
    DEFAULT_SUBREDDIT.to_string()
}

/// Contents of the JSON configuration file.
///
/// `user_agent` is optional; when it is missing the credentials fall back to
/// `LivePosting/1.0 (by /u/<username>)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default = "default_subreddit")]
    pub default_subreddit: String,
}

impl AppConfig {
    /// Returns the example configuration written on first run.
    pub fn placeholder() -> Self {
        AppConfig {
            client_id: "YOUR_CLIENT_ID".to_string(),
            client_secret: "YOUR_CLIENT_SECRET".to_string(),
            username: "YOUR_USERNAME".to_string(),
            password: "YOUR_PASSWORD".to_string(),
            user_agent: Some("LivePosting/1.0 (by /u/YOUR_USERNAME)".to_string()),
            default_subreddit: default_subreddit(),
        }
    }

    /// Loads the configuration from `path`, creating it if it does not exist.
    ///
    /// When the file is absent a placeholder configuration is written to
    /// `path` and returned, so the caller's [`validate`](Self::validate)
    /// step will report which keys still need filling in.
    ///
    /// # Returns
    ///
    /// - `Ok(AppConfig)`: The parsed (or freshly created) configuration
    /// - `Err(GatewayError)`: If the file cannot be read, written or parsed
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let path = path.as_ref();

        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let contents = fs::read_to_string(path)?;
            let config: AppConfig = serde_json::from_str(&contents)?;
            debug!(
                "Configuration loaded: client_id {}, username {}, default subreddit r/{}",
                mask_secret(&config.client_id),
                config.username,
                config.default_subreddit
            );
            return Ok(config);
        }

        let config = Self::placeholder();
        fs::write(path, serde_json::to_string_pretty(&config)?)?;
        warn!(
            "Created configuration file {} - fill it with your data before using",
            path.display()
        );
        Ok(config)
    }

    /// Checks that no credential is still at its `YOUR_<KEY>` placeholder.
    ///
    /// The error lists every offending key, e.g.
    /// `Missing required configuration: client_id, password`.
    pub fn validate(&self) -> Result<(), GatewayError> {
        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| {
                let value = match *key {
                    "client_id" => &self.client_id,
                    "client_secret" => &self.client_secret,
                    "username" => &self.username,
                    _ => &self.password,
                };
                value.is_empty() || *value == format!("YOUR_{}", key.to_uppercase())
            })
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::Configuration(format!(
                "Missing required configuration: {}",
                missing.join(", ")
            )))
        }
    }

    /// Builds the immutable credentials used by the Reddit client.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            &self.client_id,
            &self.client_secret,
            &self.username,
            &self.password,
            self.user_agent.as_deref(),
        )
    }
}

/// Masks a secret for logging, keeping at most the first four characters.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    if secret.chars().count() > 4 {
        format!("{}...", prefix)
    } else {
        "****".to_string()
    }
}

/// Gets the config file path from `REDPOST_CONFIG`, or [`DEFAULT_CONFIG_PATH`].
pub fn get_config_path() -> String {
    env::var("REDPOST_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

/// Gets the server port from environment variables or returns the default.
///
/// This function reads the `PORT` environment variable and parses it as a u16.
/// If the variable is not set or cannot be parsed, it defaults to 5000.
///
/// # Example
///
/// ```rust
/// use redpost::get_server_port;
///
/// std::env::remove_var("PORT");
/// assert_eq!(get_server_port(), 5000);
/// ```
pub fn get_server_port() -> u16 {
    match env::var("PORT") {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!("PORT '{}' is not a valid port, using {}", value, DEFAULT_PORT);
            DEFAULT_PORT
        }),
        Err(_) => DEFAULT_PORT,
    }
}
