//! Authentication error types.

use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while exchanging an API token for a session.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token endpoint answered with a non-success status.
    #[error("token exchange rejected (HTTP {status}): {message}")]
    Rejected {
        /// HTTP status code returned by the token endpoint.
        status: u16,
        /// Error description from the response body, or the status line.
        message: String,
    },

    /// The token endpoint answered successfully but without a usable access token.
    #[error("access token not found in token response")]
    MissingAccessToken,

    /// The token response body could not be decoded.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    /// The token endpoint could not be reached.
    #[error("token request failed: {0}")]
    Transport(String),
}

impl AuthError {
    /// Returns `true` if the failure is a network condition worth retrying
    /// with backoff.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::MissingAccessToken | Self::InvalidResponse(_) => false,
        }
    }
}
