//! `HttpApiClient` behaviour against a mock Platform.sh API.

use platformsh_api::{
    mapper, ApiClient, ApiError, ApiErrorKind, CreateEnvironmentPayload, HttpApiClient,
    UpdateEnvironmentPayload,
};
use platformsh_auth::{AuthConfig, Credential, SessionManager, TokenClient};
use platformsh_core::{EnvironmentKey, EnvironmentPlan, ProjectId};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_token(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

fn api_client(server: &MockServer) -> HttpApiClient {
    let http = reqwest::Client::new();
    let sessions = SessionManager::new(
        TokenClient::new(
            AuthConfig::with_token_url(format!("{}/oauth2/token", server.uri())),
            http.clone(),
        ),
        Credential::new("api-token"),
    );
    HttpApiClient::new(&format!("{}/api", server.uri()), http, sessions).unwrap()
}

fn key(project: &str, environment: &str) -> EnvironmentKey {
    format!("{project}/{environment}").parse().unwrap()
}

#[tokio::test]
async fn calls_carry_bearer_token() {
    let server = MockServer::start().await;
    mount_token(&server, "tok123").await;

    Mock::given(method("GET"))
        .and(path("/api/projects/proj1/environments/env1"))
        .and(header("authorization", "Bearer tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "env1",
            "name": "env1",
            "title": "Env 1",
            "status": "active"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let env = api_client(&server)
        .get_environment(&key("proj1", "env1"))
        .await
        .unwrap();

    assert_eq!(env.id, "env1");
    assert_eq!(env.project_id, "proj1");
    assert_eq!(env.title, "Env 1");
    assert_eq!(env.status, "active");
    assert_eq!(env.default_domain, "");
}

#[tokio::test]
async fn get_missing_environment_is_not_found() {
    let server = MockServer::start().await;
    mount_token(&server, "tok").await;

    Mock::given(method("GET"))
        .and(path("/api/projects/proj1/environments/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": "error",
            "message": "Environment not found",
            "code": 404,
            "title": "Not Found"
        })))
        .mount(&server)
        .await;

    let err = api_client(&server)
        .get_environment(&key("proj1", "gone"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ApiErrorKind::NotFound));
    assert!(matches!(err, ApiError::NotFound(ref message) if message == "Environment not found"));
}

#[tokio::test]
async fn rejected_token_is_unauthorized_not_api_error() {
    let server = MockServer::start().await;
    mount_token(&server, "tok").await;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = api_client(&server).list_projects().await.unwrap_err();
    match err {
        ApiError::Unauthorized { status, generation } => {
            assert_eq!(status, 403);
            assert_eq!(generation, 1);
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_token_exchange_surfaces_as_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let err = api_client(&server).list_projects().await.unwrap_err();
    assert!(matches!(err, ApiError::Auth(_)));
}

#[tokio::test]
async fn conflict_and_server_errors_are_classified() {
    let server = MockServer::start().await;
    mount_token(&server, "tok").await;

    Mock::given(method("DELETE"))
        .and(path("/api/projects/proj1/environments/busy"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "An activity is already running"
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/projects/proj1/environments/broken"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = api_client(&server);

    let conflict = client
        .delete_environment(&key("proj1", "busy"))
        .await
        .unwrap_err();
    assert_eq!(conflict.kind(), Some(ApiErrorKind::Conflict));
    assert!(!conflict.is_retriable());

    let server_error = client
        .delete_environment(&key("proj1", "broken"))
        .await
        .unwrap_err();
    assert_eq!(server_error.kind(), Some(ApiErrorKind::ServerError));
    assert!(server_error.is_retriable());
}

#[tokio::test]
async fn list_projects_accepts_envelope() {
    let server = MockServer::start().await;
    mount_token(&server, "tok").await;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "projects": [
                { "id": "p1", "title": "Shop", "description": "Storefront" },
                { "id": "p2", "title": "Blog" }
            ]
        })))
        .mount(&server)
        .await;

    let projects = api_client(&server).list_projects().await.unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].title, "Shop");
    assert_eq!(projects[0].description, "Storefront");
    assert_eq!(projects[1].description, "");
}

#[tokio::test]
async fn list_environments_accepts_array() {
    let server = MockServer::start().await;
    mount_token(&server, "tok").await;

    Mock::given(method("GET"))
        .and(path("/api/projects/proj1/environments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "main", "name": "main", "type": "production" },
            { "id": "staging", "name": "staging", "type": "staging" }
        ])))
        .mount(&server)
        .await;

    let envs = api_client(&server)
        .list_environments(&ProjectId::new("proj1").unwrap())
        .await
        .unwrap();

    assert_eq!(envs.len(), 2);
    assert_eq!(envs[0].environment_type, "production");
    assert_eq!(envs[1].project_id, "proj1");
}

#[tokio::test]
async fn create_branches_from_main() {
    let server = MockServer::start().await;
    mount_token(&server, "tok").await;

    let plan = EnvironmentPlan::new("proj1", "feature").with_title("Feature");
    let payload: CreateEnvironmentPayload = mapper::to_create_payload(&plan);

    Mock::given(method("POST"))
        .and(path("/api/projects/proj1/environments/main/branch"))
        .and(body_json(json!({
            "name": "feature",
            "title": "Feature",
            "clone_parent": true,
            "type": "development",
            "enable_smtp": false,
            "restrict_robots": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "feature",
            "name": "feature",
            "title": "Feature",
            "status": "inactive"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let env = api_client(&server)
        .create_environment(&ProjectId::new("proj1").unwrap(), &payload)
        .await
        .unwrap();

    assert_eq!(env.id, "feature");
    assert_eq!(env.status, "inactive");
}

#[tokio::test]
async fn create_acknowledgement_without_id_uses_name() {
    let server = MockServer::start().await;
    mount_token(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path("/api/projects/proj1/environments/master/branch"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "status": "ok",
            "code": 202
        })))
        .expect(1)
        .mount(&server)
        .await;

    let env = api_client(&server)
        .with_parent_environment("master")
        .create_environment(
            &ProjectId::new("proj1").unwrap(),
            &mapper::to_create_payload(&EnvironmentPlan::new("proj1", "feature")),
        )
        .await
        .unwrap();

    assert_eq!(env.id, "feature");
    assert_eq!(env.project_id, "proj1");
    // The envelope's own status is not the environment's status.
    assert_eq!(env.status, "");
}

#[tokio::test]
async fn get_keeps_status_of_environment_body() {
    let server = MockServer::start().await;
    mount_token(&server, "tok").await;

    Mock::given(method("GET"))
        .and(path("/api/projects/proj1/environments/feature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "feature",
            "status": "dirty"
        })))
        .mount(&server)
        .await;

    let env = api_client(&server)
        .get_environment(&key("proj1", "feature"))
        .await
        .unwrap();

    assert_eq!(env.id, "feature");
    assert_eq!(env.status, "dirty");
}

#[tokio::test]
async fn update_envelope_is_not_an_environment() {
    let server = MockServer::start().await;
    mount_token(&server, "tok").await;

    Mock::given(method("PATCH"))
        .and(path("/api/projects/proj1/environments/feature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "code": 200,
            "_embedded": { "activities": [] }
        })))
        .mount(&server)
        .await;

    let env = api_client(&server)
        .update_environment(
            &key("proj1", "feature"),
            &mapper::to_update_payload(&EnvironmentPlan::new("proj1", "feature")),
        )
        .await
        .unwrap();

    assert_eq!(env.id, "feature");
    assert_eq!(env.status, "");
}

#[tokio::test]
async fn update_sends_partial_body() {
    let server = MockServer::start().await;
    mount_token(&server, "tok").await;

    Mock::given(method("PATCH"))
        .and(path("/api/projects/proj1/environments/feature"))
        .and(body_json(json!({
            "title": "Renamed",
            "enable_smtp": true,
            "restrict_robots": false
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let payload = UpdateEnvironmentPayload {
        title: Some("Renamed".to_string()),
        enable_smtp: true,
        restrict_robots: false,
    };

    let env = api_client(&server)
        .update_environment(&key("proj1", "feature"), &payload)
        .await
        .unwrap();

    // An empty acknowledgement carries only the key.
    assert_eq!(env.id, "feature");
    assert_eq!(env.project_id, "proj1");
    assert_eq!(env.title, "");
}

#[tokio::test]
async fn undecodable_success_body_is_decode_error() {
    let server = MockServer::start().await;
    mount_token(&server, "tok").await;

    Mock::given(method("GET"))
        .and(path("/api/projects/proj1/environments/env1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = api_client(&server)
        .get_environment(&key("proj1", "env1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
    assert_eq!(err.kind(), Some(ApiErrorKind::Other));
}

#[tokio::test]
async fn reauthenticate_installs_new_session() {
    let server = MockServer::start().await;
    mount_token(&server, "fresh").await;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let client = api_client(&server);
    client.authenticate().await.unwrap();
    client.list_projects().await.unwrap();

    client.reauthenticate(1).await.unwrap();
    client.list_projects().await.unwrap();
}

#[tokio::test]
async fn unreachable_api_is_transport_error() {
    let server = MockServer::start().await;
    mount_token(&server, "tok").await;

    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let http = reqwest::Client::new();
    let sessions = SessionManager::new(
        TokenClient::new(
            AuthConfig::with_token_url(format!("{}/oauth2/token", server.uri())),
            http.clone(),
        ),
        Credential::new("api-token"),
    );
    let client = HttpApiClient::new(&format!("http://{addr}/api"), http, sessions).unwrap();

    let err = client.list_projects().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(err.is_retriable());
    assert_eq!(err.kind(), None);
}
