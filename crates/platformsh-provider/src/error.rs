//! Error types for the provider.
//!
//! Every failure an operation can report is a `ProviderError`. The
//! [`ErrorKind`] of each variant is what the host uses to pick a policy:
//! validation and immutable-field errors are never retried, transport
//! errors may be retried with backoff, and `NotFound` means drift.

use platformsh_api::{ApiError, ApiErrorKind};
use platformsh_auth::AuthError;
use platformsh_core::IdError;
use thiserror::Error;

use crate::lifecycle::ResourceState;

/// A result type using `ProviderError`.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Classification attached to error diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Provider configuration is unusable.
    Config,
    /// The desired-state record is malformed or incomplete.
    Validation,
    /// A session could not be obtained or was rejected twice.
    Auth,
    /// The API could not be reached.
    Transport,
    /// The remote resource does not exist.
    NotFound,
    /// The API reported a conflicting operation.
    Conflict,
    /// The API failed internally.
    ServerError,
    /// Any other API failure.
    ApiOther,
    /// A field that is fixed after creation was changed.
    ImmutableFieldChanged,
    /// The reconciler attempted an invalid state transition.
    Internal,
}

/// Errors that can occur in provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The desired-state record is malformed or incomplete.
    #[error("invalid environment definition: {0}")]
    Validation(String),

    /// A session could not be obtained.
    #[error("authentication failed: {0}")]
    Auth(AuthError),

    /// The API could not be reached.
    #[error("Platform.sh API unreachable: {0}")]
    Transport(String),

    /// The API answered with a structured failure.
    #[error("{message}")]
    Api {
        /// Failure classification.
        kind: ApiErrorKind,
        /// Error message.
        message: String,
    },

    /// A field that is fixed after creation differs from the observed value.
    #[error("{field} cannot be changed after creation (current {prior:?}, requested {desired:?})")]
    ImmutableFieldChanged {
        /// The immutable field.
        field: &'static str,
        /// Observed value.
        prior: String,
        /// Requested value.
        desired: String,
    },

    /// The requested state transition is not valid.
    #[error("invalid state transition: cannot transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// The current state.
        from: ResourceState,
        /// The requested target state.
        to: ResourceState,
    },
}

impl ProviderError {
    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Api { kind, .. } => match kind {
                ApiErrorKind::NotFound => ErrorKind::NotFound,
                ApiErrorKind::Conflict => ErrorKind::Conflict,
                ApiErrorKind::ServerError => ErrorKind::ServerError,
                ApiErrorKind::Other => ErrorKind::ApiOther,
            },
            Self::ImmutableFieldChanged { .. } => ErrorKind::ImmutableFieldChanged,
            Self::InvalidTransition { .. } => ErrorKind::Internal,
        }
    }

    /// Short human-readable summary for diagnostics.
    #[must_use]
    pub const fn summary(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Config => "Invalid provider configuration",
            ErrorKind::Validation => "Invalid environment definition",
            ErrorKind::Auth => "Authentication failed",
            ErrorKind::Transport => "Platform.sh API unreachable",
            ErrorKind::NotFound => "Environment not found",
            ErrorKind::Conflict => "Conflicting operation in progress",
            ErrorKind::ServerError => "Platform.sh API error",
            ErrorKind::ApiOther => "Unexpected API response",
            ErrorKind::ImmutableFieldChanged => "Immutable attribute changed",
            ErrorKind::Internal => "Internal provider error",
        }
    }

    /// Returns true if the operation may succeed when retried with backoff.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Auth(err) => err.is_retriable(),
            Self::Api { kind, .. } => matches!(kind, ApiErrorKind::ServerError),
            _ => false,
        }
    }
}

impl From<ApiError> for ProviderError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport(message) => Self::Transport(message),
            ApiError::Auth(err) => err.into(),
            ApiError::Unauthorized { status, .. } => Self::Auth(AuthError::Rejected {
                status,
                message: "API rejected the session after re-authentication".to_string(),
            }),
            ApiError::InvalidUrl(message) => Self::Config(message),
            other => {
                let kind = other.kind().unwrap_or(ApiErrorKind::Other);
                Self::Api {
                    kind,
                    message: other.to_string(),
                }
            }
        }
    }
}

impl From<AuthError> for ProviderError {
    /// An unreachable token endpoint is a transport failure, not a rejected
    /// credential.
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Transport(message) => Self::Transport(format!("token endpoint: {message}")),
            other => Self::Auth(other),
        }
    }
}

impl From<IdError> for ProviderError {
    fn from(err: IdError) -> Self {
        Self::Validation(err.to_string())
    }
}
