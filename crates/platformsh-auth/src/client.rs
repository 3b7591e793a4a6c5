//! OAuth2 token exchange.
//!
//! The Platform.sh token endpoint accepts the `api_token` grant: the API
//! token is posted as a form field, with HTTP Basic auth for a fixed client
//! name and an empty password.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::session::Session;
use crate::{AuthConfig, Credential};

const GRANT_TYPE: &str = "api_token";

/// Form body for the token exchange.
#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    api_token: &'a str,
}

/// Raw response from the token endpoint.
///
/// `access_token` is kept loosely typed so that a non-string value is
/// reported as a missing token rather than a decode failure.
#[derive(Debug, Deserialize)]
struct RawTokenResponse {
    #[serde(default)]
    access_token: Option<serde_json::Value>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    token_type: Option<String>,
}

/// OAuth2 error body.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client for the token endpoint.
#[derive(Debug, Clone)]
pub struct TokenClient {
    config: AuthConfig,
    client: reqwest::Client,
}

impl TokenClient {
    /// Create a token client sharing the given HTTP client.
    #[must_use]
    pub const fn new(config: AuthConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Exchange an API token for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The endpoint cannot be reached (`Transport`)
    /// - The endpoint answers with a non-success status (`Rejected`)
    /// - The body is not JSON (`InvalidResponse`)
    /// - The body has no string `access_token` (`MissingAccessToken`)
    pub async fn exchange(&self, credential: &Credential) -> Result<Session> {
        tracing::debug!(url = %self.config.token_url, "Exchanging API token");

        let request = TokenRequest {
            grant_type: GRANT_TYPE,
            api_token: credential.expose(),
        };

        let response = self
            .client
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(""))
            .form(&request)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<OAuthErrorResponse>()
                .await
                .map(|e| e.error_description.unwrap_or(e.error))
                .unwrap_or_else(|_| format!("token endpoint returned status {status}"));

            tracing::error!(status = %status, error = %message, "Token exchange rejected");

            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let raw: RawTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        let access_token = raw
            .access_token
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingAccessToken)?;

        // An absent or unrepresentable lifetime means the token is only
        // invalidated by a rejection.
        let expires_at = raw
            .expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(chrono::Duration::try_seconds)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));

        tracing::debug!(
            token_type = raw.token_type.as_deref().unwrap_or("bearer"),
            expires_at = ?expires_at,
            "Obtained access token"
        );

        Ok(Session::new(access_token, expires_at))
    }
}
