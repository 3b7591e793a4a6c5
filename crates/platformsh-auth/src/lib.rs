//! API token authentication for the Platform.sh API.
//!
//! This crate exchanges a long-lived API token for short-lived bearer
//! tokens and keeps the current session fresh:
//!
//! - [`TokenClient`] performs the OAuth2 `api_token` grant
//! - [`SessionManager`] caches the session, refreshes it on expiry and on
//!   rejection, and serializes refreshes so concurrent callers share one
//!   exchange
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   API client     │────▶│  SessionManager  │
//! │   (bearer calls) │     │  (session cache) │
//! └──────────────────┘     └────────┬─────────┘
//!                                   │
//!                          ┌────────▼─────────┐
//!                          │   TokenClient    │
//!                          └────────┬─────────┘
//!                                   │ HTTPS
//!                          ┌────────▼─────────┐
//!                          │  OAuth2 token    │
//!                          │  endpoint        │
//!                          └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use platformsh_auth::{AuthConfig, Credential, SessionManager, TokenClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tokens = TokenClient::new(AuthConfig::default(), reqwest::Client::new());
//! let sessions = SessionManager::new(tokens, Credential::new("my-api-token"));
//!
//! let bearer = sessions.bearer().await?;
//! println!("session generation: {}", bearer.generation());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::fmt;

use serde::Deserialize;

pub mod client;
pub mod error;
pub mod session;

pub use client::TokenClient;
pub use error::{AuthError, Result};
pub use session::{BearerToken, Session, SessionManager};

/// A long-lived Platform.sh API token.
///
/// The value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wrap an API token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Return the raw token for the exchange request.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true if no token was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Configuration for the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// OAuth2 token endpoint URL.
    #[serde(default = "AuthConfig::default_token_url")]
    pub token_url: String,
    /// Basic auth username sent with the exchange (the password is empty).
    #[serde(default = "AuthConfig::default_client_id")]
    pub client_id: String,
    /// Tokens are treated as expired this many seconds before their
    /// declared expiry.
    #[serde(default = "AuthConfig::default_expiry_skew")]
    pub expiry_skew_seconds: u64,
}

impl AuthConfig {
    fn default_token_url() -> String {
        "https://auth.api.platform.sh/oauth2/token".to_string()
    }

    fn default_client_id() -> String {
        "platform-api-user".to_string()
    }

    const fn default_expiry_skew() -> u64 {
        30
    }

    /// Create a configuration pointing at a custom token endpoint.
    #[must_use]
    pub fn with_token_url(token_url: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
            ..Self::default()
        }
    }

    /// Get the expiry skew as a `chrono::Duration`.
    #[must_use]
    pub fn expiry_skew(&self) -> chrono::Duration {
        i64::try_from(self.expiry_skew_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(chrono::Duration::zero)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_url: Self::default_token_url(),
            client_id: Self::default_client_id(),
            expiry_skew_seconds: Self::default_expiry_skew(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.token_url, "https://auth.api.platform.sh/oauth2/token");
        assert_eq!(config.client_id, "platform-api-user");
        assert_eq!(config.expiry_skew_seconds, 30);
        assert_eq!(config.expiry_skew(), chrono::Duration::seconds(30));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: AuthConfig =
            serde_json::from_str(r#"{"token_url":"http://localhost/token"}"#).unwrap();
        assert_eq!(config.token_url, "http://localhost/token");
        assert_eq!(config.client_id, "platform-api-user");
    }

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("super-secret");
        let debug = format!("{credential:?}");
        assert!(!debug.contains("super-secret"));
        assert_eq!(credential.expose(), "super-secret");
    }

    #[test]
    fn blank_credential_is_empty() {
        assert!(Credential::new("  ").is_empty());
        assert!(!Credential::new("tok").is_empty());
    }

    #[test]
    fn auth_error_retriable() {
        assert!(AuthError::Transport("refused".into()).is_retriable());
        assert!(AuthError::Rejected {
            status: 503,
            message: "unavailable".into()
        }
        .is_retriable());
        assert!(!AuthError::Rejected {
            status: 400,
            message: "invalid_grant".into()
        }
        .is_retriable());
        assert!(!AuthError::MissingAccessToken.is_retriable());
    }
}
