//! Password-grant authentication against the Reddit token endpoint.

use log::{debug, error, info};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;

use super::api::sanitize_for_logging;
use super::{RedditClient, AUTH_TIMEOUT};
use crate::error::GatewayError;
use crate::oauth::{build_basic_auth_header, Token};

impl RedditClient {
    /// Obtains an access token with the OAuth2 password grant.
    ///
    /// On success the token replaces whatever the [`TokenStore`](crate::oauth::TokenStore)
    /// held. On failure the stored token is left untouched and the reason is
    /// logged; no error escapes this call.
    ///
    /// # Returns
    ///
    /// `true` if a token was obtained, `false` otherwise.
    pub async fn authenticate(&self) -> bool {
        match self.request_token().await {
            Ok(token) => {
                self.tokens.replace(token).await;
                info!(
                    "Successfully authenticated with Reddit as /u/{}",
                    self.tokens.credentials().username
                );
                true
            }
            Err(e) => {
                error!("Authentication failed: {}", e);
                false
            }
        }
    }

    async fn request_token(&self) -> Result<Token, GatewayError> {
        let credentials = self.tokens.credentials();
        info!("Requesting access token from {}", self.endpoints.token_url);

        let response = self
            .http
            .post(&self.endpoints.token_url)
            .header(
                AUTHORIZATION,
                build_basic_auth_header(&credentials.client_id, &credentials.client_secret),
            )
            .header(USER_AGENT, credentials.user_agent.as_str())
            .form(&[
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .timeout(AUTH_TIMEOUT)
            .send()
            .await
            .map_err(|e| GatewayError::AuthFailure(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::AuthFailure(format!("could not read response: {}", e)))?;

        if status != StatusCode::OK {
            error!("Authentication error: {}", status);
            error!("Response: {}", sanitize_for_logging(&body, 200));
            return Err(GatewayError::AuthFailure(format!(
                "token endpoint returned {}",
                status
            )));
        }

        let json: Value = serde_json::from_str(&body)
            .map_err(|e| GatewayError::AuthFailure(format!("invalid token response: {}", e)))?;

        let access_token = json
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                debug!("Token response: {}", sanitize_for_logging(&body, 200));
                GatewayError::AuthFailure("no access_token in response".to_string())
            })?;
        let token_type = json
            .get("token_type")
            .and_then(Value::as_str)
            .unwrap_or("bearer");

        Ok(Token::new(access_token, token_type))
    }

    /// Authenticates once if no token is held.
    ///
    /// Leaves an existing token alone, so a call that already authenticated
    /// never triggers a second exchange.
    pub(crate) async fn ensure_authenticated(&self) -> Result<(), GatewayError> {
        if self.tokens.is_authenticated().await {
            return Ok(());
        }

        info!("No access token held, authenticating first");
        if self.authenticate().await {
            Ok(())
        } else {
            Err(GatewayError::AuthFailure(
                "could not obtain an access token".to_string(),
            ))
        }
    }
}
