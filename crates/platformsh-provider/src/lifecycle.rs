//! Environment lifecycle state machine.
//!
//! Each operation walks a managed environment through these states. A step
//! that fails leaves the state where it was, except that an update which
//! landed but could not be read back returns to `Created`: the environment
//! exists, but its computed fields are unknown until the next read.
//!
//! # State Machine
//!
//! ```text
//!     ┌─────────────┐
//!     │   Planned   │──────────────────────┐
//!     └──────┬──────┘                      │ (import)
//!            │ (create call)               │
//!            ▼                             │
//!     ┌─────────────┐                      │
//!     │  Creating   │                      │
//!     └──────┬──────┘                      │
//!            │ (id assigned)               │
//!            ▼                             │
//!     ┌─────────────┐   (read)             │
//!     │   Created   │──────────┐           │
//!     └─────────────┘          ▼           ▼
//!                        ┌────────────────────┐
//!            ┌──────────▶│       Synced       │◀─┐ (refresh)
//!            │  (read)   └───┬──────────┬─────┘──┘
//!            │               │          │
//!     ┌──────┴──────┐        │          │ (delete call)
//!     │  Updating   │◀───────┘          ▼
//!     └──────┬──────┘            ┌─────────────┐
//!            │ (missing)         │  Deleting   │
//!            ▼                   └──────┬──────┘
//!     ┌─────────────┐                   │
//!     │    Gone     │◀──────────────────┘
//!     └─────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};

/// Lifecycle state of a managed environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    /// Desired record only; no identifier yet.
    Planned,
    /// Create call in flight.
    Creating,
    /// Identifier assigned; computed fields not yet read back.
    Created,
    /// Fields refreshed from a read.
    Synced,
    /// Update call in flight.
    Updating,
    /// Delete call in flight.
    Deleting,
    /// The environment no longer exists remotely.
    Gone,
}

/// Validates a state transition and returns the target state if valid.
///
/// # Errors
///
/// Returns `ProviderError::InvalidTransition` if the transition is not allowed.
pub fn validate_transition(from: ResourceState, to: ResourceState) -> Result<ResourceState> {
    if is_valid_transition(from, to) {
        Ok(to)
    } else {
        Err(ProviderError::InvalidTransition { from, to })
    }
}

/// Check if a state transition is valid according to the state machine.
#[must_use]
pub const fn is_valid_transition(from: ResourceState, to: ResourceState) -> bool {
    use ResourceState::{Created, Creating, Deleting, Gone, Planned, Synced, Updating};

    matches!(
        (from, to),
        (Planned, Creating)
            | (Creating | Updating, Created)
            // Read-after-write, refresh and import all land in Synced
            | (Planned | Created | Synced | Updating, Synced)
            | (Synced, Updating | Deleting)
            // A read or update can discover that the environment is gone
            | (Synced | Updating | Deleting, Gone)
    )
}

/// Returns the list of valid target states from the given state.
#[must_use]
pub fn valid_transitions_from(state: ResourceState) -> Vec<ResourceState> {
    use ResourceState::{Created, Creating, Deleting, Gone, Planned, Synced, Updating};

    match state {
        Planned => vec![Creating, Synced],
        Creating => vec![Created],
        Created => vec![Synced],
        Synced => vec![Synced, Updating, Deleting, Gone],
        Updating => vec![Synced, Created, Gone],
        Deleting => vec![Gone],
        Gone => vec![],
    }
}

/// Returns true if no further transition is possible.
#[must_use]
pub const fn is_terminal(state: ResourceState) -> bool {
    matches!(state, ResourceState::Gone)
}
