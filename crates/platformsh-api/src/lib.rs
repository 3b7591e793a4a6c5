//! Client for the Platform.sh REST API.
//!
//! This crate provides:
//!
//! - [`ApiClient`]: the resource operations the reconciler needs, as a trait
//!   so that tests and alternative transports can stand in for HTTP
//! - [`HttpApiClient`]: the `reqwest` implementation, which attaches a bearer
//!   token from a [`SessionManager`](platformsh_auth::SessionManager) to every
//!   call and translates HTTP failures into [`ApiError`]
//! - [`mapper`]: pure translation between domain records and wire payloads
//!
//! # Example
//!
//! ```no_run
//! use platformsh_api::{ApiClient, HttpApiClient};
//! use platformsh_auth::{AuthConfig, Credential, SessionManager, TokenClient};
//! use platformsh_core::EnvironmentKey;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let http = reqwest::Client::new();
//! let sessions = SessionManager::new(
//!     TokenClient::new(AuthConfig::default(), http.clone()),
//!     Credential::new("my-api-token"),
//! );
//! let client = HttpApiClient::new("https://api.platform.sh/api", http, sessions)?;
//!
//! let key: EnvironmentKey = "abcdef123/main".parse()?;
//! let environment = client.get_environment(&key).await?;
//! println!("{} is {}", environment.name, environment.status);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod error;
pub mod mapper;
pub mod types;

pub use client::{ApiClient, HttpApiClient, DEFAULT_PARENT_ENVIRONMENT};
pub use error::{ApiError, ApiErrorKind, Result};
pub use types::{CreateEnvironmentPayload, EnvironmentWire, ProjectWire, UpdateEnvironmentPayload};
