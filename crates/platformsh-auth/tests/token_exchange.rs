//! Token endpoint behaviour against a mock OAuth2 server.

use std::sync::Arc;

use platformsh_auth::{AuthConfig, AuthError, Credential, SessionManager, TokenClient};
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// `base64("platform-api-user:")`
const BASIC_AUTH: &str = "Basic cGxhdGZvcm0tYXBpLXVzZXI6";

fn token_client(server: &MockServer) -> TokenClient {
    TokenClient::new(
        AuthConfig::with_token_url(format!("{}/oauth2/token", server.uri())),
        reqwest::Client::new(),
    )
}

#[tokio::test]
async fn exchange_sends_api_token_grant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(header("authorization", BASIC_AUTH))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("grant_type=api_token&api_token=my-api-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok123",
            "expires_in": 3600,
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = token_client(&server)
        .exchange(&Credential::new("my-api-token"))
        .await
        .unwrap();

    let expires_at = session.expires_at().unwrap();
    let remaining = expires_at - chrono::Utc::now();
    assert!(remaining > chrono::Duration::seconds(3500));
    assert!(remaining <= chrono::Duration::seconds(3600));
}

#[tokio::test]
async fn exchange_without_expiry_is_accepted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok" })))
        .mount(&server)
        .await;

    let session = token_client(&server)
        .exchange(&Credential::new("key"))
        .await
        .unwrap();
    assert!(session.expires_at().is_none());
}

#[tokio::test]
async fn exchange_rejected_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "The API token is invalid."
        })))
        .mount(&server)
        .await;

    let err = token_client(&server)
        .exchange(&Credential::new("bad"))
        .await
        .unwrap_err();

    match err {
        AuthError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "The API token is invalid.");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn exchange_missing_access_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "expires_in": 60 })))
        .mount(&server)
        .await;

    let err = token_client(&server)
        .exchange(&Credential::new("key"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::MissingAccessToken));
}

#[tokio::test]
async fn exchange_non_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = token_client(&server)
        .exchange(&Credential::new("key"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidResponse(_)));
}

#[tokio::test]
async fn exchange_connection_refused_is_transport() {
    // Bind and drop a listener to obtain an address nothing listens on.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let client = TokenClient::new(
        AuthConfig::with_token_url(format!("http://{addr}/oauth2/token")),
        reqwest::Client::new(),
    );

    let err = client.exchange(&Credential::new("key")).await.unwrap_err();
    assert!(matches!(err, AuthError::Transport(_)));
    assert!(err.is_retriable());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_exchange() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "shared", "expires_in": 3600 }))
                .set_delay(std::time::Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let manager = Arc::new(SessionManager::new(
        token_client(&server),
        Credential::new("key"),
    ));

    let tasks = (0..10).map(|_| {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.bearer().await })
    });

    let results = futures::future::join_all(tasks).await;
    for result in results {
        let bearer = result.unwrap().unwrap();
        assert_eq!(bearer.token(), "shared");
        assert_eq!(bearer.generation(), 1);
    }
}

#[tokio::test]
async fn expired_session_is_refreshed_before_use() {
    let server = MockServer::start().await;

    // A zero lifetime is always inside the expiry skew.
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "short", "expires_in": 0 })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let manager = SessionManager::new(token_client(&server), Credential::new("key"));

    let first = manager.bearer().await.unwrap();
    let second = manager.bearer().await.unwrap();
    assert_eq!(first.generation(), 1);
    assert_eq!(second.generation(), 2);
}

#[tokio::test]
async fn reauthenticate_skips_exchange_when_already_replaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "tok", "expires_in": 3600 })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let manager = SessionManager::new(token_client(&server), Credential::new("key"));

    let first = manager.authenticate().await.unwrap();
    let replaced = manager.reauthenticate(first.generation()).await.unwrap();
    assert_eq!(replaced.generation(), 2);

    // A late rejection of generation 1 must not trigger a third exchange.
    let again = manager.reauthenticate(first.generation()).await.unwrap();
    assert_eq!(again.generation(), 2);
    assert_eq!(manager.current_generation(), Some(2));
}
