//! Lifecycle reconciliation of Platform.sh environments.
//!
//! [`EnvironmentReconciler`] implements the five operations the
//! orchestrator drives: create, read, update, delete and import. Each
//! operation issues at most one mutating call and at most one read, stops
//! at the first error, and reports everything through [`Diagnostics`]
//! rather than `Result`, so that a partially successful create still hands
//! back the record it managed to assemble.

use std::sync::Arc;

use platformsh_api::{mapper, ApiClient, ApiErrorKind};
use platformsh_core::{Environment, EnvironmentId, EnvironmentKey, EnvironmentPlan, ProjectId};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{ErrorKind, ProviderError, Result};
use crate::lifecycle::ResourceState;
use crate::operation::Operation;
use crate::types::{ImportOutcome, Outcome};

/// Drives environments through their lifecycle against an [`ApiClient`].
pub struct EnvironmentReconciler<C: ApiClient> {
    client: Arc<C>,
}

impl<C: ApiClient> Clone for EnvironmentReconciler<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<C: ApiClient> EnvironmentReconciler<C> {
    /// Create a reconciler sharing the given client.
    #[must_use]
    pub const fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Create an environment by branching it off the parent environment,
    /// then read it back.
    ///
    /// Returns `None` only when nothing was created. If the environment was
    /// created but could not be read back, the record assembled from the
    /// create response is returned together with the error.
    pub async fn create(&self, plan: &EnvironmentPlan) -> Outcome<Option<Environment>> {
        let mut op = Operation::new("create", ResourceState::Planned);

        let project_id = match validate_plan(plan) {
            Ok(project_id) => project_id,
            Err(err) => {
                op.fail(&err);
                return op.finish(None);
            }
        };

        if !op.advance(ResourceState::Creating) {
            return op.finish(None);
        }

        let client = self.client.as_ref();
        let payload = mapper::to_create_payload(plan);
        let created = match op
            .call(client, || client.create_environment(&project_id, &payload))
            .await
        {
            Ok(created) => merge_created(plan, created),
            Err(err) => {
                op.fail(&err.into());
                return op.finish(None);
            }
        };

        let key = match created.key() {
            Ok(key) => key,
            Err(err) => {
                op.fail(&ProviderError::Api {
                    kind: ApiErrorKind::Other,
                    message: format!("create response does not identify the environment: {err}"),
                });
                return op.finish(Some(created));
            }
        };

        if !op.advance(ResourceState::Created) {
            return op.finish(Some(created));
        }

        match op.call(client, || client.get_environment(&key)).await {
            Ok(observed) => {
                op.advance(ResourceState::Synced);
                if !observed.matches_plan(plan) {
                    op.warn(Diagnostic::warning(
                        "Environment differs from configuration",
                        format!(
                            "{key} was created but the API reports different settings; \
                             the next update will reconcile them"
                        ),
                    ));
                }
                op.finish(Some(observed))
            }
            Err(err) => {
                tracing::error!(
                    project_id = %key.project_id,
                    environment_id = %key.environment_id,
                    error = %err,
                    "Created environment could not be read back"
                );
                op.fail(&err.into());
                op.finish(Some(created))
            }
        }
    }

    /// Refresh an environment from the API.
    ///
    /// An environment that no longer exists is reported as `None` with a
    /// warning, never as an error, so the orchestrator can plan to
    /// recreate it.
    pub async fn read(&self, key: &EnvironmentKey) -> Outcome<Option<Environment>> {
        self.read_from("read", key, ResourceState::Synced).await
    }

    /// Apply the mutable fields of `desired` to the environment described
    /// by `prior`, then read it back.
    ///
    /// `prior` must be the record returned by the last successful create,
    /// read, update or import of this environment. Its key addresses the
    /// update, and its name and project are the values fixed at creation:
    /// a `desired` that changes either fails with `ImmutableFieldChanged`
    /// before any call is made.
    ///
    /// Any failure before the update lands returns `prior` unchanged. If
    /// the update lands but the read-back fails, the record with the
    /// requested fields applied is returned in state `Created`, so the
    /// next read refreshes its computed fields.
    pub async fn update(
        &self,
        prior: &Environment,
        desired: &EnvironmentPlan,
    ) -> Outcome<Option<Environment>> {
        let mut op = Operation::new("update", ResourceState::Synced);

        let key = match prior.key() {
            Ok(key) => key,
            Err(err) => {
                op.fail(&err.into());
                return op.finish(Some(prior.clone()));
            }
        };

        if let Err(err) = check_immutable(prior, desired) {
            op.fail(&err);
            return op.finish(Some(prior.clone()));
        }

        if !op.advance(ResourceState::Updating) {
            return op.finish(Some(prior.clone()));
        }

        let client = self.client.as_ref();
        let payload = mapper::to_update_payload(desired);
        match op
            .call(client, || client.update_environment(&key, &payload))
            .await
        {
            Ok(_) => {}
            Err(err) if err.is_not_found() => {
                tracing::warn!(
                    project_id = %key.project_id,
                    environment_id = %key.environment_id,
                    "Environment disappeared before update"
                );
                op.advance(ResourceState::Gone);
                op.fail(&err.into());
                return op.finish(None);
            }
            Err(err) => {
                op.fail(&err.into());
                return op.finish(Some(prior.clone()));
            }
        }

        match op.call(client, || client.get_environment(&key)).await {
            Ok(observed) => {
                op.advance(ResourceState::Synced);
                op.finish(Some(observed))
            }
            Err(err) => {
                op.advance(ResourceState::Created);
                op.fail(&err.into());
                op.finish(Some(apply_plan(prior, desired)))
            }
        }
    }

    /// Delete an environment. An environment that is already gone counts
    /// as deleted.
    pub async fn delete(&self, key: &EnvironmentKey) -> Diagnostics {
        let mut op = Operation::new("delete", ResourceState::Synced);
        if !op.advance(ResourceState::Deleting) {
            return op.finish(()).diagnostics;
        }

        let client = self.client.as_ref();
        match op.call(client, || client.delete_environment(key)).await {
            Ok(()) => {
                op.advance(ResourceState::Gone);
            }
            Err(err) if err.is_not_found() => {
                tracing::debug!(
                    project_id = %key.project_id,
                    environment_id = %key.environment_id,
                    "Environment already deleted"
                );
                op.advance(ResourceState::Gone);
            }
            Err(err) => op.fail(&err.into()),
        }

        op.finish(()).diagnostics
    }

    /// Bring an existing environment under management.
    ///
    /// `id` must be `project_id/environment_id`. After parsing, this
    /// behaves exactly like [`read`](Self::read).
    pub async fn import(&self, id: &str) -> ImportOutcome {
        let key = match EnvironmentKey::parse_import_id(id) {
            Ok(key) => key,
            Err(err) => {
                let mut diagnostics = Diagnostics::new();
                diagnostics.push_error(&err.into());
                return ImportOutcome {
                    key: None,
                    environment: None,
                    state: ResourceState::Planned,
                    diagnostics,
                };
            }
        };

        let outcome = self.read_from("import", &key, ResourceState::Planned).await;
        ImportOutcome {
            key: Some(key),
            environment: outcome.value,
            state: outcome.state,
            diagnostics: outcome.diagnostics,
        }
    }

    async fn read_from(
        &self,
        name: &'static str,
        key: &EnvironmentKey,
        initial: ResourceState,
    ) -> Outcome<Option<Environment>> {
        let mut op = Operation::new(name, initial);

        let client = self.client.as_ref();
        match op.call(client, || client.get_environment(key)).await {
            Ok(environment) => {
                op.advance(ResourceState::Synced);
                op.finish(Some(environment))
            }
            Err(err) if err.is_not_found() => {
                tracing::warn!(
                    project_id = %key.project_id,
                    environment_id = %key.environment_id,
                    "Environment not found, treating as absent"
                );
                // Only a managed environment can go missing; an import of
                // an unknown key never left Planned.
                if op.state() == ResourceState::Synced {
                    op.advance(ResourceState::Gone);
                }
                op.warn(
                    Diagnostic::warning(
                        "Environment not found",
                        format!("{key} does not exist and will be treated as absent"),
                    )
                    .with_kind(ErrorKind::NotFound),
                );
                op.finish(None)
            }
            Err(err) => {
                op.fail(&err.into());
                op.finish(None)
            }
        }
    }
}

/// Check that a plan names its project and environment.
fn validate_plan(plan: &EnvironmentPlan) -> Result<ProjectId> {
    if plan.project_id.is_empty() {
        return Err(ProviderError::Validation("project_id is required".to_string()));
    }
    if plan.name.is_empty() {
        return Err(ProviderError::Validation("name is required".to_string()));
    }
    let project_id = ProjectId::new(plan.project_id.as_str())?;
    // The name becomes the environment ID and a URL path segment.
    EnvironmentId::new(plan.name.as_str())
        .map_err(|e| ProviderError::Validation(format!("name: {e}")))?;
    Ok(project_id)
}

fn check_immutable(prior: &Environment, desired: &EnvironmentPlan) -> Result<()> {
    if desired.project_id != prior.project_id {
        return Err(ProviderError::ImmutableFieldChanged {
            field: "project_id",
            prior: prior.project_id.clone(),
            desired: desired.project_id.clone(),
        });
    }
    if desired.name != prior.name {
        return Err(ProviderError::ImmutableFieldChanged {
            field: "name",
            prior: prior.name.clone(),
            desired: desired.name.clone(),
        });
    }
    Ok(())
}

/// Combine the declared fields of `plan` with the identifier and computed
/// fields of the create response.
fn merge_created(plan: &EnvironmentPlan, created: Environment) -> Environment {
    Environment {
        project_id: plan.project_id.clone(),
        name: plan.name.clone(),
        title: plan.title.clone().unwrap_or_else(|| plan.name.clone()),
        enable_smtp: plan.enable_smtp,
        restrict_robots: plan.restrict_robots,
        ..created
    }
}

/// The record an update would have produced, for when the read-back fails.
fn apply_plan(prior: &Environment, desired: &EnvironmentPlan) -> Environment {
    Environment {
        title: desired.title.clone().unwrap_or_else(|| prior.title.clone()),
        enable_smtp: desired.enable_smtp,
        restrict_robots: desired.restrict_robots,
        ..prior.clone()
    }
}
