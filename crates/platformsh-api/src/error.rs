//! API error types.
//!
//! Failures are split by who caused them: the network (`Transport`), the
//! session (`Auth`, `Unauthorized`) and the API itself (everything with an
//! [`ApiErrorKind`]). Callers apply different retry policy to each.

use platformsh_auth::AuthError;
use thiserror::Error;

/// A result type using `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Classification of structured failures returned by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// HTTP 404.
    NotFound,
    /// HTTP 409.
    Conflict,
    /// HTTP 5xx.
    ServerError,
    /// Any other failure status, or an undecodable body.
    Other,
}

/// Errors that can occur when calling the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (timeout, connection refused).
    #[error("request failed: {0}")]
    Transport(String),

    /// A session could not be obtained.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The API rejected the bearer token (HTTP 401 or 403).
    #[error("session rejected by API (HTTP {status})")]
    Unauthorized {
        /// HTTP status code.
        status: u16,
        /// Generation of the rejected session.
        generation: u64,
    },

    /// The resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request conflicts with the current remote state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The API failed internally.
    #[error("server error (HTTP {status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// Any other failure status.
    #[error("unexpected response (HTTP {status}): {message}")]
    Other {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// A success response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Build the error for a non-success, non-auth status.
    #[must_use]
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            500..=599 => Self::Server { status, message },
            _ => Self::Other { status, message },
        }
    }

    /// Returns the API-level kind, or `None` for transport, session and
    /// client-side failures.
    #[must_use]
    pub const fn kind(&self) -> Option<ApiErrorKind> {
        match self {
            Self::NotFound(_) => Some(ApiErrorKind::NotFound),
            Self::Conflict(_) => Some(ApiErrorKind::Conflict),
            Self::Server { .. } => Some(ApiErrorKind::ServerError),
            Self::Other { .. } | Self::Decode(_) => Some(ApiErrorKind::Other),
            Self::Transport(_) | Self::Auth(_) | Self::Unauthorized { .. } | Self::InvalidUrl(_) => {
                None
            }
        }
    }

    /// Returns true if the API reported that the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true if the call may succeed when retried with backoff.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Server { .. } => true,
            Self::Auth(err) => err.is_retriable(),
            _ => false,
        }
    }
}
