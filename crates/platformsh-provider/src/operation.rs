//! Per-operation bookkeeping shared by the reconciler and the lookup.

use std::future::Future;

use platformsh_api::{ApiClient, ApiError};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::ProviderError;
use crate::lifecycle::{self, ResourceState};
use crate::types::Outcome;

/// Tracks the state, diagnostics and re-authentication budget of one
/// operation.
#[derive(Debug)]
pub(crate) struct Operation {
    name: &'static str,
    state: ResourceState,
    diagnostics: Diagnostics,
    reauthenticated: bool,
}

impl Operation {
    pub(crate) const fn new(name: &'static str, state: ResourceState) -> Self {
        Self {
            name,
            state,
            diagnostics: Diagnostics::new(),
            reauthenticated: false,
        }
    }

    pub(crate) const fn state(&self) -> ResourceState {
        self.state
    }

    /// Move to `to`. An invalid transition is recorded as an error and
    /// leaves the state unchanged.
    pub(crate) fn advance(&mut self, to: ResourceState) -> bool {
        match lifecycle::validate_transition(self.state, to) {
            Ok(next) => {
                tracing::trace!(operation = self.name, from = ?self.state, to = ?next, "State transition");
                self.state = next;
                true
            }
            Err(err) => {
                self.fail(&err);
                false
            }
        }
    }

    pub(crate) fn fail(&mut self, err: &ProviderError) {
        tracing::debug!(operation = self.name, error = %err, "Operation failed");
        self.diagnostics.push_error(err);
    }

    pub(crate) fn warn(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn finish<T>(self, value: T) -> Outcome<T> {
        Outcome {
            value,
            state: self.state,
            diagnostics: self.diagnostics,
        }
    }

    /// Issue one API call. If the API rejects the session and this
    /// operation has not re-authenticated yet, obtain a new session and
    /// issue the same call once more. Rejected calls never reached the
    /// resource, so repeating them is safe for mutations too.
    pub(crate) async fn call<C, T, F, Fut>(&mut self, client: &C, request: F) -> Result<T, ApiError>
    where
        C: ApiClient + ?Sized,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match request().await {
            Err(ApiError::Unauthorized { status, generation }) if !self.reauthenticated => {
                self.reauthenticated = true;
                tracing::debug!(operation = self.name, status, "Session rejected, re-authenticating before retry");
                client.reauthenticate(generation).await?;
                request().await
            }
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_advance_records_error() {
        let mut op = Operation::new("test", ResourceState::Planned);
        assert!(!op.advance(ResourceState::Deleting));
        assert_eq!(op.state(), ResourceState::Planned);

        let outcome = op.finish(());
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.diagnostics.iter().next().and_then(|d| d.kind),
            Some(crate::error::ErrorKind::Internal)
        );
    }

    #[test]
    fn valid_advance() {
        let mut op = Operation::new("test", ResourceState::Synced);
        assert!(op.advance(ResourceState::Deleting));
        assert!(op.advance(ResourceState::Gone));

        let outcome = op.finish(());
        assert!(outcome.is_success());
        assert!(outcome.is_gone());
    }
}
