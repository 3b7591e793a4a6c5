//! Lifecycle reconciliation of Platform.sh environments.
//!
//! This crate turns a desired [`EnvironmentPlan`] into a remote
//! environment and keeps the two in agreement. It is driven by an
//! orchestrator that decides which operation to run; the provider
//! performs it and reports an [`Outcome`] with ordered [`Diagnostics`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   Orchestrator   │
//! └────────┬─────────┘
//!          │ create / read / update / delete / import
//!          ▼
//! ┌──────────────────────┐     ┌──────────────────┐
//! │ EnvironmentReconciler│────▶│  HttpApiClient   │──── REST API
//! └──────────────────────┘     └────────┬─────────┘
//!                                       │
//!                              ┌────────▼─────────┐
//!                              │  SessionManager  │──── token endpoint
//!                              └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use platformsh_core::EnvironmentPlan;
//! use platformsh_provider::{Provider, ProviderConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Provider::configure(ProviderConfig::from_env()?).await?;
//!
//! let plan = EnvironmentPlan::new("abcdef123", "feature-login").with_title("Login");
//! let outcome = provider.environments().create(&plan).await;
//! for diagnostic in &outcome.diagnostics {
//!     eprintln!("{diagnostic}");
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::sync::Arc;

use platformsh_api::HttpApiClient;
use platformsh_auth::{SessionManager, TokenClient};

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod lifecycle;
pub mod lookup;
mod operation;
pub mod reconciler;
pub mod types;

pub use config::ProviderConfig;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{ErrorKind, ProviderError, Result};
pub use lifecycle::ResourceState;
pub use lookup::EnvironmentLookup;
pub use reconciler::EnvironmentReconciler;
pub use types::{ImportOutcome, Outcome};

pub use platformsh_core::{Environment, EnvironmentKey, EnvironmentPlan, Project};

/// A configured provider holding the one API client all operations share.
#[derive(Debug, Clone)]
pub struct Provider {
    client: Arc<HttpApiClient>,
    config: ProviderConfig,
}

impl Provider {
    /// Build the API client and authenticate.
    ///
    /// The first session is obtained here so that a bad credential fails
    /// configuration rather than the first operation.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Config` if the configuration is invalid,
    /// `ProviderError::Auth` if the token endpoint rejects the credential
    /// and `ProviderError::Transport` if it cannot be reached.
    pub async fn configure(config: ProviderConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))?;

        let sessions = SessionManager::new(
            TokenClient::new(config.auth.clone(), http.clone()),
            config.api_token.clone(),
        );
        let client = HttpApiClient::new(&config.api_url, http, sessions)?
            .with_parent_environment(config.parent_environment.as_str());

        client.authenticate().await?;

        tracing::info!(
            api_url = %config.api_url,
            parent_environment = %config.parent_environment,
            "Platform.sh provider configured"
        );

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// Get the reconciler for managed environments.
    #[must_use]
    pub fn environments(&self) -> EnvironmentReconciler<HttpApiClient> {
        EnvironmentReconciler::new(Arc::clone(&self.client))
    }

    /// Get the read-only lookup for existing environments and projects.
    #[must_use]
    pub fn lookup(&self) -> EnvironmentLookup<HttpApiClient> {
        EnvironmentLookup::new(Arc::clone(&self.client))
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ProviderConfig {
        &self.config
    }
}
