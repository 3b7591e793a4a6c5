//! Wire representations used by the Platform.sh API.
//!
//! Response types accept missing, `null` and unknown fields: an environment
//! that is still provisioning is reported with some fields absent.

use serde::{Deserialize, Serialize};

/// Environment type requested for every branch created by the provider.
pub const DEVELOPMENT_ENVIRONMENT_TYPE: &str = "development";

/// An environment as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentWire {
    /// Environment identifier (machine name).
    pub id: Option<String>,
    /// Owning project identifier.
    pub project: Option<String>,
    /// Environment name.
    pub name: Option<String>,
    /// Display title.
    pub title: Option<String>,
    /// Environment type.
    #[serde(rename = "type")]
    pub environment_type: Option<String>,
    /// Provisioning status.
    pub status: Option<String>,
    /// Default domain.
    pub default_domain: Option<String>,
    /// Outgoing email flag.
    pub enable_smtp: Option<bool>,
    /// Robots restriction flag.
    pub restrict_robots: Option<bool>,
    /// Creation timestamp.
    pub created_at: Option<String>,
}

/// A project as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectWire {
    /// Project identifier.
    pub id: Option<String>,
    /// Display title.
    pub title: Option<String>,
    /// Description.
    pub description: Option<String>,
}

/// Body of the branch call that creates an environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateEnvironmentPayload {
    /// Environment name.
    pub name: String,
    /// Display title.
    pub title: String,
    /// Always `true`: the new branch inherits the parent's data.
    pub clone_parent: bool,
    /// Always [`DEVELOPMENT_ENVIRONMENT_TYPE`].
    #[serde(rename = "type")]
    pub environment_type: String,
    /// Outgoing email flag.
    pub enable_smtp: bool,
    /// Robots restriction flag.
    pub restrict_robots: bool,
}

/// Body of the partial update of an environment. Mutable fields only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateEnvironmentPayload {
    /// Display title, left unchanged when `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Outgoing email flag.
    pub enable_smtp: bool,
    /// Robots restriction flag.
    pub restrict_robots: bool,
}

/// A list response. Accepts a bare array or an object envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Items(Vec<T>),
    Envelope {
        #[serde(alias = "projects", alias = "environments")]
        items: Vec<T>,
    },
}

impl<T> Listing<T> {
    pub(crate) fn into_items(self) -> Vec<T> {
        match self {
            Self::Items(items) | Self::Envelope { items } => items,
        }
    }
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}
