//! Desired-state and observed-state records.
//!
//! An [`EnvironmentPlan`] is what the caller asks for. An [`Environment`] is
//! what the remote API reports. Only the API ever fills the identifier and
//! the computed fields of an `Environment`; the plan type has no place to
//! put them.

use serde::{Deserialize, Serialize};

use crate::ids::{EnvironmentId, EnvironmentKey, IdError, ProjectId};

/// A Platform.sh project. Read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Free-form description.
    pub description: String,
}

/// The caller-declared target configuration of an environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentPlan {
    /// Project the environment belongs to. Required.
    pub project_id: String,
    /// Environment name. Required, immutable after creation.
    pub name: String,
    /// Display title. Defaults to the name on creation.
    #[serde(default)]
    pub title: Option<String>,
    /// Whether outgoing email is enabled.
    #[serde(default)]
    pub enable_smtp: bool,
    /// Whether search engine robots are blocked.
    #[serde(default)]
    pub restrict_robots: bool,
}

impl EnvironmentPlan {
    /// Create a plan for the given project and environment name.
    #[must_use]
    pub fn new(project_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the display title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the SMTP flag.
    #[must_use]
    pub const fn with_smtp(mut self, enabled: bool) -> Self {
        self.enable_smtp = enabled;
        self
    }

    /// Set the robots restriction flag.
    #[must_use]
    pub const fn with_restrict_robots(mut self, restricted: bool) -> Self {
        self.restrict_robots = restricted;
        self
    }
}

/// The last-known remote configuration of an environment.
///
/// Missing wire fields are represented by their zero value (`""` or
/// `false`): partially provisioned environments are valid observations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Environment identifier, assigned by the API.
    pub id: String,
    /// Owning project identifier.
    pub project_id: String,
    /// Environment name.
    pub name: String,
    /// Display title.
    pub title: String,
    /// Environment type (`development`, `staging`, `production`).
    pub environment_type: String,
    /// Provisioning status (`active`, `inactive`, `dirty`, ...).
    pub status: String,
    /// Default domain, assigned once routing is provisioned.
    pub default_domain: String,
    /// Whether outgoing email is enabled.
    pub enable_smtp: bool,
    /// Whether search engine robots are blocked.
    pub restrict_robots: bool,
    /// Creation timestamp as reported by the API.
    pub created_at: String,
}

impl Environment {
    /// Return the durable key of this environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the project or environment ID is not a valid
    /// identifier (e.g. empty).
    pub fn key(&self) -> Result<EnvironmentKey, IdError> {
        Ok(EnvironmentKey::new(
            ProjectId::new(self.project_id.as_str())?,
            EnvironmentId::new(self.id.as_str())?,
        ))
    }

    /// Returns true if the mutable fields match the given plan.
    ///
    /// An unset plan title matches any observed title.
    #[must_use]
    pub fn matches_plan(&self, plan: &EnvironmentPlan) -> bool {
        plan.title.as_ref().map_or(true, |title| *title == self.title)
            && self.enable_smtp == plan.enable_smtp
            && self.restrict_robots == plan.restrict_robots
    }
}
