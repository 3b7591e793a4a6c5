//! Core types for the Platform.sh environment provider.
//!
//! This crate provides the foundational types shared by the API client and
//! the reconciler:
//!
//! - **Identifiers**: validated project and environment IDs, and the
//!   [`EnvironmentKey`] pair that durably addresses a managed environment
//! - **Records**: the desired-state [`EnvironmentPlan`] and the
//!   observed-state [`Environment`] and [`Project`]
//!
//! # Example
//!
//! ```
//! use platformsh_core::EnvironmentKey;
//!
//! let key: EnvironmentKey = "abcdef123/staging".parse().unwrap();
//! assert_eq!(key.project_id.as_str(), "abcdef123");
//! assert_eq!(key.environment_id.as_str(), "staging");
//! assert_eq!(key.to_string(), "abcdef123/staging");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;
pub mod model;

pub use ids::{EnvironmentId, EnvironmentKey, IdError, ProjectId};
pub use model::{Environment, EnvironmentPlan, Project};
