//! Read-only lookups of environments and projects.
//!
//! Unlike [`EnvironmentReconciler::read`](crate::EnvironmentReconciler::read),
//! a lookup requires its target to exist: a missing environment is an
//! error.

use std::sync::Arc;

use platformsh_api::{ApiClient, ApiErrorKind};
use platformsh_core::{Environment, EnvironmentKey, Project, ProjectId};

use crate::error::ProviderError;
use crate::lifecycle::ResourceState;
use crate::operation::Operation;
use crate::types::Outcome;

/// Looks up existing environments and projects.
pub struct EnvironmentLookup<C: ApiClient> {
    client: Arc<C>,
}

impl<C: ApiClient> EnvironmentLookup<C> {
    /// Create a lookup sharing the given client.
    #[must_use]
    pub const fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Fetch an environment by key.
    pub async fn by_id(&self, key: &EnvironmentKey) -> Outcome<Option<Environment>> {
        let mut op = Operation::new("lookup", ResourceState::Planned);

        let client = self.client.as_ref();
        match op.call(client, || client.get_environment(key)).await {
            Ok(environment) => {
                op.advance(ResourceState::Synced);
                op.finish(Some(environment))
            }
            Err(err) => {
                op.fail(&err.into());
                op.finish(None)
            }
        }
    }

    /// Find an environment of a project by its name.
    pub async fn by_name(&self, project_id: &str, name: &str) -> Outcome<Option<Environment>> {
        let mut op = Operation::new("lookup", ResourceState::Planned);

        let project_id = match ProjectId::new(project_id) {
            Ok(project_id) => project_id,
            Err(err) => {
                op.fail(&err.into());
                return op.finish(None);
            }
        };

        let client = self.client.as_ref();
        let environments = match op
            .call(client, || client.list_environments(&project_id))
            .await
        {
            Ok(environments) => environments,
            Err(err) => {
                op.fail(&err.into());
                return op.finish(None);
            }
        };

        tracing::debug!(
            project_id = %project_id,
            count = environments.len(),
            "Listed environments"
        );

        if let Some(environment) = environments.into_iter().find(|env| env.name == name) {
            op.advance(ResourceState::Synced);
            op.finish(Some(environment))
        } else {
            op.fail(&ProviderError::Api {
                kind: ApiErrorKind::NotFound,
                message: format!("project {project_id} has no environment named {name:?}"),
            });
            op.finish(None)
        }
    }

    /// List the projects visible to the configured credential.
    pub async fn projects(&self) -> Outcome<Vec<Project>> {
        let mut op = Operation::new("lookup", ResourceState::Planned);

        let client = self.client.as_ref();
        match op.call(client, || client.list_projects()).await {
            Ok(projects) => {
                op.advance(ResourceState::Synced);
                op.finish(projects)
            }
            Err(err) => {
                op.fail(&err.into());
                op.finish(Vec::new())
            }
        }
    }
}
