//! Operation results handed back to the orchestrator.

use platformsh_core::{Environment, EnvironmentKey};

use crate::diagnostics::Diagnostics;
use crate::lifecycle::{self, ResourceState};

/// Result of a lifecycle operation.
///
/// `value` is meaningful even when the operation failed: a create whose
/// read-back failed still carries the record assembled from the create
/// response, and an update rejected before any mutation carries the prior
/// record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    /// The observed record, if any.
    pub value: T,
    /// Lifecycle state reached by the operation.
    pub state: ResourceState,
    /// Diagnostics in the order they occurred.
    pub diagnostics: Diagnostics,
}

impl<T> Outcome<T> {
    /// Returns true if no error diagnostic was recorded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.diagnostics.has_error()
    }

    /// Returns true if the environment was found to no longer exist.
    #[must_use]
    pub const fn is_gone(&self) -> bool {
        lifecycle::is_terminal(self.state)
    }
}

/// Result of importing an environment by its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    /// The parsed key, absent when the identifier was malformed.
    pub key: Option<EnvironmentKey>,
    /// The observed record, absent when the environment does not exist.
    pub environment: Option<Environment>,
    /// Lifecycle state reached by the import.
    pub state: ResourceState,
    /// Diagnostics in the order they occurred.
    pub diagnostics: Diagnostics,
}

impl ImportOutcome {
    /// Returns true if no error diagnostic was recorded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.diagnostics.has_error()
    }
}
