//! Session caching with single-flight refresh.
//!
//! The current session is held behind a `parking_lot::RwLock` so that
//! concurrent operations read it without contention. Refreshes go through a
//! `tokio::sync::Mutex`: whoever holds it re-checks the session before
//! exchanging, so callers that queued behind a refresh reuse its result
//! instead of triggering their own.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::client::TokenClient;
use crate::error::Result;
use crate::Credential;

/// A bearer token and its expiry.
#[derive(Clone)]
pub struct Session {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
    generation: u64,
}

impl Session {
    /// Create a session from a freshly issued token.
    #[must_use]
    pub fn new(access_token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
            generation: 0,
        }
    }

    /// When the token expires, if the endpoint declared a lifetime.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// The refresh counter of the manager that installed this session.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true if the token must not be used at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, skew: chrono::Duration) -> bool {
        self.expires_at
            .is_some_and(|expires_at| now + skew >= expires_at)
    }

    fn bearer(&self) -> BearerToken {
        BearerToken {
            token: self.access_token.clone(),
            generation: self.generation,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("generation", &self.generation)
            .finish()
    }
}

/// A token ready to be attached to a request.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    token: String,
    generation: u64,
}

impl BearerToken {
    /// The raw token for the `Authorization: Bearer` header.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The session generation this token belongs to.
    ///
    /// Pass it back to [`SessionManager::reauthenticate`] when the API
    /// rejects the token.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken(<redacted>, generation {})", self.generation)
    }
}

/// Owns the credential and the current session.
pub struct SessionManager {
    tokens: TokenClient,
    credential: Credential,
    current: RwLock<Option<Session>>,
    refresh: Mutex<()>,
    generations: AtomicU64,
}

impl SessionManager {
    /// Create a manager. No exchange happens until the first token is needed.
    #[must_use]
    pub fn new(tokens: TokenClient, credential: Credential) -> Self {
        Self {
            tokens,
            credential,
            current: RwLock::new(None),
            refresh: Mutex::new(()),
            generations: AtomicU64::new(0),
        }
    }

    /// Eagerly obtain a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    pub async fn authenticate(&self) -> Result<BearerToken> {
        self.bearer().await
    }

    /// Get a valid bearer token, refreshing the session if it is absent or
    /// expired.
    ///
    /// # Errors
    ///
    /// Returns an error if a required token exchange fails.
    pub async fn bearer(&self) -> Result<BearerToken> {
        if let Some(bearer) = self.valid_bearer() {
            return Ok(bearer);
        }

        let _guard = self.refresh.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(bearer) = self.valid_bearer() {
            return Ok(bearer);
        }

        self.refresh_locked().await
    }

    /// Replace a session the API rejected.
    ///
    /// If the rejected generation is no longer current, another caller has
    /// already re-authenticated and its session is returned as is.
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    pub async fn reauthenticate(&self, rejected_generation: u64) -> Result<BearerToken> {
        let _guard = self.refresh.lock().await;

        if let Some(bearer) = self.valid_bearer() {
            if bearer.generation != rejected_generation {
                return Ok(bearer);
            }
        }

        tracing::warn!(
            generation = rejected_generation,
            "Session rejected by API, re-authenticating"
        );

        self.current.write().take();
        self.refresh_locked().await
    }

    /// Returns the current session's generation, if a session is held.
    #[must_use]
    pub fn current_generation(&self) -> Option<u64> {
        self.current.read().as_ref().map(Session::generation)
    }

    fn valid_bearer(&self) -> Option<BearerToken> {
        let skew = self.tokens.config().expiry_skew();
        let current = self.current.read();
        current
            .as_ref()
            .filter(|session| !session.is_expired_at(Utc::now(), skew))
            .map(Session::bearer)
    }

    /// Must be called with the refresh lock held.
    async fn refresh_locked(&self) -> Result<BearerToken> {
        let mut session = self.tokens.exchange(&self.credential).await?;
        session.generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::debug!(
            generation = session.generation,
            expires_at = ?session.expires_at,
            "Installed new session"
        );

        let bearer = session.bearer();
        *self.current.write() = Some(session);
        Ok(bearer)
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("token_url", &self.tokens.config().token_url)
            .field("generation", &self.current_generation())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_without_expiry_never_expires() {
        let session = Session::new("tok", None);
        let far_future = Utc::now() + chrono::Duration::days(3650);
        assert!(!session.is_expired_at(far_future, chrono::Duration::zero()));
    }

    #[test]
    fn session_expiry_respects_skew() {
        let now = Utc::now();
        let session = Session::new("tok", Some(now + chrono::Duration::seconds(60)));

        assert!(!session.is_expired_at(now, chrono::Duration::seconds(30)));
        assert!(session.is_expired_at(now, chrono::Duration::seconds(60)));
        assert!(session.is_expired_at(now + chrono::Duration::seconds(61), chrono::Duration::zero()));
    }

    #[test]
    fn debug_output_is_redacted() {
        let session = Session::new("secret-token", None);
        assert!(!format!("{session:?}").contains("secret-token"));
        assert!(!format!("{:?}", session.bearer()).contains("secret-token"));
    }

    #[test]
    fn new_manager_holds_no_session() {
        let tokens = TokenClient::new(crate::AuthConfig::default(), reqwest::Client::new());
        let manager = SessionManager::new(tokens, Credential::new("tok"));
        assert_eq!(manager.current_generation(), None);
    }
}
