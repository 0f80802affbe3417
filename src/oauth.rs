//! OAuth module for Reddit API authentication.
//!
//! This module holds the application credentials and the current access
//! token, and builds the `Authorization` headers for both the password-grant
//! token exchange (HTTP Basic) and authorized API calls (bearer token).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use tokio::sync::RwLock;

use crate::error::GatewayError;

/// Reddit application credentials. Immutable once built.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl Credentials {
    /// Creates credentials, deriving the User-Agent from the username when
    /// none is given.
    pub fn new(
        client_id: &str,
        client_secret: &str,
        username: &str,
        password: &str,
        user_agent: Option<&str>,
    ) -> Self {
        let user_agent = match user_agent {
            Some(agent) if !agent.is_empty() => agent.to_string(),
            _ => format!("LivePosting/1.0 (by /u/{})", username),
        };

        Credentials {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            user_agent,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &crate::config::mask_secret(&self.client_id))
            .field("client_secret", &"[REDACTED]")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// An access token returned by the password-grant exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub obtained_at: DateTime<Utc>,
}

impl Token {
    pub fn new(access_token: impl Into<String>, token_type: impl Into<String>) -> Self {
        Token {
            access_token: access_token.into(),
            token_type: token_type.into(),
            obtained_at: Utc::now(),
        }
    }
}

/// Builds the Authorization header for the HTTP Basic token exchange.
///
/// # Example
///
/// ```rust
/// use redpost::build_basic_auth_header;
///
/// let header = build_basic_auth_header("id", "secret");
/// assert_eq!(header, "Basic aWQ6c2VjcmV0");
/// ```
pub fn build_basic_auth_header(client_id: &str, client_secret: &str) -> String {
    let encoded = STANDARD.encode(format!("{}:{}", client_id, client_secret));
    format!("Basic {}", encoded)
}

/// Builds the Authorization header for an authorized API call.
///
/// The token type is capitalized the way Reddit expects it, so a `bearer`
/// token yields `Bearer <token>`.
///
/// # Example
///
/// ```rust
/// use redpost::build_authorization_header;
///
/// assert_eq!(build_authorization_header("bearer", "abc"), "Bearer abc");
/// ```
pub fn build_authorization_header(token_type: &str, access_token: &str) -> String {
    format!("{} {}", capitalize(token_type), access_token)
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Holds the credentials and the current access token.
///
/// The token is absent until authentication succeeds and is replaced
/// wholesale on every new authentication.
#[derive(Debug)]
pub struct TokenStore {
    credentials: Credentials,
    token: RwLock<Option<Token>>,
}

impl TokenStore {
    pub fn new(credentials: Credentials) -> Self {
        TokenStore {
            credentials,
            token: RwLock::new(None),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn user_agent(&self) -> &str {
        &self.credentials.user_agent
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Returns a copy of the current token, if any.
    pub async fn current(&self) -> Option<Token> {
        self.token.read().await.clone()
    }

    pub async fn replace(&self, token: Token) {
        info!(
            "Storing new {} access token (length {})",
            token.token_type,
            token.access_token.len()
        );
        *self.token.write().await = Some(token);
    }

    pub async fn invalidate(&self) {
        if self.token.write().await.take().is_some() {
            info!("Access token invalidated");
        }
    }

    /// Headers for an authorized API call.
    ///
    /// # Returns
    ///
    /// - `Ok(HeaderMap)`: `Authorization`, `User-Agent` and form `Content-Type`
    /// - `Err(GatewayError::Unauthenticated)`: If no token is held
    pub async fn headers(&self) -> Result<HeaderMap, GatewayError> {
        let token = self.current().await.ok_or(GatewayError::Unauthenticated)?;
        let authorization = build_authorization_header(&token.token_type, &token.access_token);
        debug!(
            "Building request headers: Authorization: {} [REDACTED], User-Agent: {}",
            capitalize(&token.token_type),
            self.user_agent()
        );

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header_value(&authorization)?);
        headers.insert(USER_AGENT, header_value(self.user_agent())?);
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, GatewayError> {
    HeaderValue::from_str(value)
        .map_err(|e| GatewayError::AuthFailure(format!("invalid header value: {}", e)))
}
