//! Provider configuration.

use std::time::Duration;

use platformsh_api::DEFAULT_PARENT_ENVIRONMENT;
use platformsh_auth::{AuthConfig, Credential};
use platformsh_core::EnvironmentId;
use reqwest::Url;
use serde::Deserialize;

use crate::error::{ProviderError, Result};

/// Environment variable holding the API token.
pub const API_TOKEN_ENV: &str = "PLATFORMSH_API_TOKEN";
/// Environment variable overriding the API root URL.
pub const API_URL_ENV: &str = "PLATFORMSH_API_URL";
/// Environment variable overriding the token endpoint URL.
pub const AUTH_URL_ENV: &str = "PLATFORMSH_AUTH_URL";

/// Configuration for the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Long-lived API token exchanged for bearer sessions.
    pub api_token: Credential,

    /// API root URL.
    #[serde(default = "ProviderConfig::default_api_url")]
    pub api_url: String,

    /// Token endpoint settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Whole-request timeout in seconds.
    #[serde(default = "ProviderConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Connection timeout in seconds.
    #[serde(default = "ProviderConfig::default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Environment that new environments are branched from.
    #[serde(default = "ProviderConfig::default_parent_environment")]
    pub parent_environment: String,
}

impl ProviderConfig {
    fn default_api_url() -> String {
        "https://api.platform.sh/api".to_string()
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    const fn default_connect_timeout() -> u64 {
        5
    }

    fn default_parent_environment() -> String {
        DEFAULT_PARENT_ENVIRONMENT.to_string()
    }

    /// Create a configuration with defaults for everything but the token.
    #[must_use]
    pub fn new(api_token: Credential) -> Self {
        Self {
            api_token,
            api_url: Self::default_api_url(),
            auth: AuthConfig::default(),
            request_timeout_seconds: Self::default_request_timeout(),
            connect_timeout_seconds: Self::default_connect_timeout(),
            parent_environment: Self::default_parent_environment(),
        }
    }

    /// Load configuration from `PLATFORMSH_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Config` if `PLATFORMSH_API_TOKEN` is unset
    /// or blank.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Config` if the API token is missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = lookup(API_TOKEN_ENV)
            .map(Credential::new)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ProviderError::Config(format!("{API_TOKEN_ENV} is not set")))?;

        let mut config = Self::new(api_token);
        if let Some(url) = lookup(API_URL_ENV) {
            config.api_url = url;
        }
        if let Some(url) = lookup(AUTH_URL_ENV) {
            config.auth.token_url = url;
        }
        Ok(config)
    }

    /// Check the configuration before any connection is attempted.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.api_token.is_empty() {
            return Err(ProviderError::Config("api_token is required".to_string()));
        }

        for (field, value) in [("api_url", &self.api_url), ("auth.token_url", &self.auth.token_url)] {
            let url = Url::parse(value)
                .map_err(|e| ProviderError::Config(format!("{field} {value:?}: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ProviderError::Config(format!(
                    "{field} must be an http(s) URL, got {value:?}"
                )));
            }
        }

        if self.request_timeout_seconds == 0 || self.connect_timeout_seconds == 0 {
            return Err(ProviderError::Config(
                "timeouts must be at least one second".to_string(),
            ));
        }

        EnvironmentId::new(self.parent_environment.as_str())
            .map_err(|e| ProviderError::Config(format!("parent_environment: {e}")))?;

        Ok(())
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Get the connect timeout as a `Duration`.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}
