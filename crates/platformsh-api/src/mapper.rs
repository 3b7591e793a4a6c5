//! Translation between domain records and wire payloads.
//!
//! All functions are pure. Reading is total: anything the API leaves out
//! becomes the zero value of the field, never an error.

use platformsh_core::{Environment, EnvironmentPlan, Project, ProjectId};

use crate::types::{
    CreateEnvironmentPayload, EnvironmentWire, ProjectWire, UpdateEnvironmentPayload,
    DEVELOPMENT_ENVIRONMENT_TYPE,
};

/// Build the branch payload for a new environment.
///
/// The title falls back to the name when the plan leaves it unset.
#[must_use]
pub fn to_create_payload(plan: &EnvironmentPlan) -> CreateEnvironmentPayload {
    CreateEnvironmentPayload {
        name: plan.name.clone(),
        title: plan.title.clone().unwrap_or_else(|| plan.name.clone()),
        clone_parent: true,
        environment_type: DEVELOPMENT_ENVIRONMENT_TYPE.to_string(),
        enable_smtp: plan.enable_smtp,
        restrict_robots: plan.restrict_robots,
    }
}

/// Build the partial update payload. Identifier and name are never sent.
#[must_use]
pub fn to_update_payload(plan: &EnvironmentPlan) -> UpdateEnvironmentPayload {
    UpdateEnvironmentPayload {
        title: plan.title.clone(),
        enable_smtp: plan.enable_smtp,
        restrict_robots: plan.restrict_robots,
    }
}

/// Build an observed record from an API response.
///
/// `project_id` is used when the response does not name its project.
#[must_use]
pub fn from_wire(wire: EnvironmentWire, project_id: &ProjectId) -> Environment {
    Environment {
        id: wire.id.unwrap_or_default(),
        project_id: wire
            .project
            .filter(|project| !project.is_empty())
            .unwrap_or_else(|| project_id.to_string()),
        name: wire.name.unwrap_or_default(),
        title: wire.title.unwrap_or_default(),
        environment_type: wire.environment_type.unwrap_or_default(),
        status: wire.status.unwrap_or_default(),
        default_domain: wire.default_domain.unwrap_or_default(),
        enable_smtp: wire.enable_smtp.unwrap_or_default(),
        restrict_robots: wire.restrict_robots.unwrap_or_default(),
        created_at: wire.created_at.unwrap_or_default(),
    }
}

/// Build a project record from an API response.
#[must_use]
pub fn project_from_wire(wire: ProjectWire) -> Project {
    Project {
        id: wire.id.unwrap_or_default(),
        title: wire.title.unwrap_or_default(),
        description: wire.description.unwrap_or_default(),
    }
}
