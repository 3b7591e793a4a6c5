//! HTTP client for the Platform.sh resource API.
//!
//! This module provides the `ApiClient` trait and its `reqwest`
//! implementation. Every call carries `Authorization: Bearer <token>` from
//! the session manager; 401 and 403 are reported as
//! [`ApiError::Unauthorized`] so the caller decides whether to
//! re-authenticate.

use async_trait::async_trait;
use platformsh_auth::SessionManager;
use platformsh_core::{Environment, EnvironmentKey, Project, ProjectId};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, Result};
use crate::mapper;
use crate::types::{
    CreateEnvironmentPayload, EnvironmentWire, ErrorResponse, Listing, ProjectWire,
    UpdateEnvironmentPayload,
};

/// Environment new branches are created from unless configured otherwise.
pub const DEFAULT_PARENT_ENVIRONMENT: &str = "main";

/// Resource operations against the Platform.sh API.
///
/// This trait abstracts the transport, allowing mock implementations in
/// tests.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// List the projects visible to the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    async fn list_projects(&self) -> Result<Vec<Project>>;

    /// List the environments of a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    async fn list_environments(&self, project_id: &ProjectId) -> Result<Vec<Environment>>;

    /// Get a single environment.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the environment does not exist.
    async fn get_environment(&self, key: &EnvironmentKey) -> Result<Environment>;

    /// Branch a new environment off the parent environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    async fn create_environment(
        &self,
        project_id: &ProjectId,
        payload: &CreateEnvironmentPayload,
    ) -> Result<Environment>;

    /// Apply a partial update to an environment.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the environment does not exist.
    async fn update_environment(
        &self,
        key: &EnvironmentKey,
        payload: &UpdateEnvironmentPayload,
    ) -> Result<Environment>;

    /// Delete an environment.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the environment does not exist.
    async fn delete_environment(&self, key: &EnvironmentKey) -> Result<()>;

    /// Replace the session after the API rejected the given generation.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` if the token exchange fails.
    async fn reauthenticate(&self, rejected_generation: u64) -> Result<()>;
}

/// `reqwest` implementation of [`ApiClient`].
#[derive(Debug)]
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: Url,
    sessions: SessionManager,
    parent_environment: String,
}

impl HttpApiClient {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root (e.g. `https://api.platform.sh/api`)
    /// * `client` - HTTP client, usually shared with the token client
    /// * `sessions` - Source of bearer tokens
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidUrl` if `base_url` is not an absolute
    /// HTTP(S) URL.
    pub fn new(base_url: &str, client: reqwest::Client, sessions: SessionManager) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            client,
            base_url,
            sessions,
            parent_environment: DEFAULT_PARENT_ENVIRONMENT.to_string(),
        })
    }

    /// Branch new environments from `parent` instead of `main`.
    #[must_use]
    pub fn with_parent_environment(mut self, parent: impl Into<String>) -> Self {
        self.parent_environment = parent.into();
        self
    }

    /// Get the API root URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the environment new branches are created from.
    #[must_use]
    pub fn parent_environment(&self) -> &str {
        &self.parent_environment
    }

    /// Obtain a session now rather than on the first call.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` if the token exchange fails.
    pub async fn authenticate(&self) -> Result<()> {
        self.sessions.authenticate().await?;
        Ok(())
    }

    /// Build a URL below the API root from percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn environment_url(&self, key: &EnvironmentKey) -> Result<Url> {
        self.endpoint(&[
            "projects",
            key.project_id.as_str(),
            "environments",
            key.environment_id.as_str(),
        ])
    }

    /// Send an authenticated request and translate failure statuses.
    async fn execute<B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<reqwest::Response>
    where
        B: Serialize + Sync + ?Sized,
    {
        let bearer = self.sessions.bearer().await?;

        tracing::debug!(method = %method, url = %url, "Sending API request");

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .bearer_auth(bearer.token());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(method = %method, url = %url, error = %e, "API request failed");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(method = %method, url = %url, status = %status, "API rejected session");
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
                generation: bearer.generation(),
            });
        }

        let message = response
            .json::<ErrorResponse>()
            .await
            .ok()
            .and_then(|e| e.message.or(e.title))
            .unwrap_or_else(|| format!("API returned status {status}"));

        if status == StatusCode::NOT_FOUND {
            tracing::debug!(method = %method, url = %url, "API resource not found");
        } else {
            tracing::error!(
                method = %method,
                url = %url,
                status = %status,
                error = %message,
                "API request returned an error"
            );
        }

        Err(ApiError::from_status(status.as_u16(), message))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        self.execute::<()>(Method::GET, url, None)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Read an environment body. An empty body yields an empty record.
    async fn read_wire(response: reqwest::Response) -> Result<EnvironmentWire> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(EnvironmentWire::default());
        }
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Decode the answer to a create or update.
    ///
    /// Mutations may answer with an activity envelope
    /// (`{"status": "ok", "code": 202, ...}`) instead of the environment.
    /// An envelope names no environment, so none of its fields are kept.
    async fn decode_mutation(
        response: reqwest::Response,
        project_id: &ProjectId,
        fallback_id: &str,
    ) -> Result<Environment> {
        let wire = Self::read_wire(response).await?;
        let wire = if wire.id.is_none() && wire.name.is_none() {
            EnvironmentWire::default()
        } else {
            wire
        };
        Ok(Self::environment_from_wire(wire, project_id, fallback_id))
    }

    fn environment_from_wire(wire: EnvironmentWire, project_id: &ProjectId, fallback_id: &str) -> Environment {
        let mut environment = mapper::from_wire(wire, project_id);
        if environment.id.is_empty() {
            environment.id = fallback_id.to_string();
        }
        environment
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let url = self.endpoint(&["projects"])?;
        let listing: Listing<ProjectWire> = self.get_json(url).await?;

        Ok(listing
            .into_items()
            .into_iter()
            .map(mapper::project_from_wire)
            .collect())
    }

    async fn list_environments(&self, project_id: &ProjectId) -> Result<Vec<Environment>> {
        let url = self.endpoint(&["projects", project_id.as_str(), "environments"])?;
        let listing: Listing<EnvironmentWire> = self.get_json(url).await?;

        Ok(listing
            .into_items()
            .into_iter()
            .map(|wire| mapper::from_wire(wire, project_id))
            .collect())
    }

    async fn get_environment(&self, key: &EnvironmentKey) -> Result<Environment> {
        let url = self.environment_url(key)?;
        let response = self.execute::<()>(Method::GET, url, None).await?;
        let wire = Self::read_wire(response).await?;
        Ok(Self::environment_from_wire(
            wire,
            &key.project_id,
            key.environment_id.as_str(),
        ))
    }

    async fn create_environment(
        &self,
        project_id: &ProjectId,
        payload: &CreateEnvironmentPayload,
    ) -> Result<Environment> {
        let url = self.endpoint(&[
            "projects",
            project_id.as_str(),
            "environments",
            &self.parent_environment,
            "branch",
        ])?;

        let response = self.execute(Method::POST, url, Some(payload)).await?;

        tracing::info!(
            project_id = %project_id,
            name = %payload.name,
            parent = %self.parent_environment,
            "Created environment"
        );

        // Branch ids are the environment's machine name.
        Self::decode_mutation(response, project_id, &payload.name).await
    }

    async fn update_environment(
        &self,
        key: &EnvironmentKey,
        payload: &UpdateEnvironmentPayload,
    ) -> Result<Environment> {
        let url = self.environment_url(key)?;
        let response = self.execute(Method::PATCH, url, Some(payload)).await?;

        tracing::info!(
            project_id = %key.project_id,
            environment_id = %key.environment_id,
            "Updated environment"
        );

        Self::decode_mutation(response, &key.project_id, key.environment_id.as_str()).await
    }

    async fn delete_environment(&self, key: &EnvironmentKey) -> Result<()> {
        let url = self.environment_url(key)?;
        self.execute::<()>(Method::DELETE, url, None).await?;

        tracing::info!(
            project_id = %key.project_id,
            environment_id = %key.environment_id,
            "Deleted environment"
        );

        Ok(())
    }

    async fn reauthenticate(&self, rejected_generation: u64) -> Result<()> {
        self.sessions.reauthenticate(rejected_generation).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platformsh_auth::{AuthConfig, Credential, TokenClient};

    fn client(base_url: &str) -> Result<HttpApiClient> {
        let http = reqwest::Client::new();
        let sessions = SessionManager::new(
            TokenClient::new(AuthConfig::default(), http.clone()),
            Credential::new("tok"),
        );
        HttpApiClient::new(base_url, http, sessions)
    }

    #[test]
    fn http_client_creation() {
        let client = client("http://localhost:8080/api").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/api");
        assert_eq!(client.parent_environment(), "main");
    }

    #[test]
    fn rejects_relative_base_url() {
        assert!(matches!(client("not a url"), Err(ApiError::InvalidUrl(_))));
        assert!(matches!(
            client("mailto:ops@example.com"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn endpoint_handles_trailing_slash() {
        let client = client("http://localhost/api/").unwrap();
        let url = client.endpoint(&["projects", "p1", "environments"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost/api/projects/p1/environments");
    }

    #[test]
    fn endpoint_percent_encodes_segments() {
        let client = client("http://localhost/api").unwrap();
        let url = client.endpoint(&["projects", "a b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost/api/projects/a%20b");
    }

    #[test]
    fn parent_environment_override() {
        let client = client("http://localhost/api")
            .unwrap()
            .with_parent_environment("master");
        assert_eq!(client.parent_environment(), "master");
    }
}
