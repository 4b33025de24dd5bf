//! Integration tests for credential selection and the universal-auth token lifecycle

mod common;

use std::sync::Arc;

use common::*;
use infisical_gateway::{
    AuthStrategy, GatewayConfig, GatewayError, InfisicalGateway, SecretsGateway,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn workspace_path() -> String {
    format!("/api/v1/workspace/{}", WORKSPACE_ID)
}

async fn mount_workspace(server: &MockServer, bearer: &str) {
    Mock::given(method("GET"))
        .and(path(workspace_path()))
        .and(header("authorization", format!("Bearer {}", bearer).as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(workspace_response("Payments", &["dev", "prod"])),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_missing_credentials_fail_before_network() {
    let server = MockServer::start().await;
    let config = GatewayConfig { base_url: server.uri(), ..GatewayConfig::default() };

    let err = InfisicalGateway::new(config).unwrap_err();

    assert!(matches!(err, GatewayError::Configuration { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_static_token_used_without_login() {
    let server = MockServer::start().await;
    mount_login(&server, "unused", 7200, 0).await;
    mount_workspace(&server, "st.service-token").await;

    let gateway = InfisicalGateway::new(token_config(&server)).unwrap();
    assert_eq!(gateway.auth_strategy(), AuthStrategy::StaticToken);

    let listing = gateway.get_environments(WORKSPACE_ID).await.unwrap();
    assert_eq!(listing.workspace_name, "Payments");
}

#[tokio::test]
async fn test_login_once_and_reuse_token() {
    let server = MockServer::start().await;
    mount_login(&server, "access-1", 7200, 1).await;
    mount_workspace(&server, "access-1").await;

    let gateway = InfisicalGateway::new(client_credentials_config(&server)).unwrap();
    assert_eq!(gateway.auth_strategy(), AuthStrategy::ClientCredentials);

    gateway.get_environments(WORKSPACE_ID).await.unwrap();
    gateway.get_environments(WORKSPACE_ID).await.unwrap();

    let expires_at = gateway.credentials().token_expires_at().await.unwrap();
    let remaining = expires_at - chrono::Utc::now();
    assert!(remaining <= chrono::Duration::seconds(6900));
    assert!(remaining > chrono::Duration::seconds(6800));
}

#[tokio::test]
async fn test_token_shorter_than_margin_refreshes_every_call() {
    let server = MockServer::start().await;
    mount_login(&server, "short-lived", 60, 2).await;
    mount_workspace(&server, "short-lived").await;

    let gateway = InfisicalGateway::new(client_credentials_config(&server)).unwrap();

    // The freshly issued token is still used for the call that triggered the login
    gateway.get_environments(WORKSPACE_ID).await.unwrap();
    gateway.get_environments(WORKSPACE_ID).await.unwrap();
}

#[tokio::test]
async fn test_unauthorized_forces_refresh_and_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(login_response("revoked-token", 7200))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(login_response("fresh-token", 7200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(workspace_path()))
        .and(header("authorization", "Bearer revoked-token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "Token revoked"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_workspace(&server, "fresh-token").await;

    let gateway = InfisicalGateway::new(client_credentials_config(&server)).unwrap();
    let listing = gateway.get_environments(WORKSPACE_ID).await.unwrap();

    assert_eq!(listing.environments.len(), 2);
    assert_eq!(
        gateway.credentials().bearer_token().await.unwrap().expose_secret(),
        "fresh-token"
    );
}

#[tokio::test]
async fn test_persistent_unauthorized_surfaces_after_retries() {
    let server = MockServer::start().await;
    mount_login(&server, "never-accepted", 7200, 4).await;
    Mock::given(method("GET"))
        .and(path(workspace_path()))
        .respond_with(ResponseTemplate::new(401))
        .expect(4)
        .mount(&server)
        .await;

    let gateway = InfisicalGateway::new(client_credentials_config(&server)).unwrap();
    let err = gateway.get_environments(WORKSPACE_ID).await.unwrap_err();

    assert_eq!(err.status_code(), Some(401));
}

#[tokio::test]
async fn test_static_token_unauthorized_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(workspace_path()))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid service token"))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = InfisicalGateway::new(token_config(&server)).unwrap();
    let err = gateway.get_environments(WORKSPACE_ID).await.unwrap_err();

    assert!(matches!(err, GatewayError::UnclassifiedApi { status: 401, .. }));
    assert!(err.to_string().contains("Invalid service token"));
}

#[tokio::test]
async fn test_rejected_login_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "Invalid credentials"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = InfisicalGateway::new(client_credentials_config(&server)).unwrap();
    let err = gateway.get_environments(WORKSPACE_ID).await.unwrap_err();

    assert!(matches!(err, GatewayError::Authentication { .. }));
    assert!(err.to_string().contains("Invalid credentials"));
}

#[tokio::test]
async fn test_concurrent_operations_share_one_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(
            login_response("shared-token", 7200).set_delay(std::time::Duration::from_millis(150)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_workspace(&server, "shared-token").await;

    let gateway = Arc::new(InfisicalGateway::new(client_credentials_config(&server)).unwrap());

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move { gateway.get_environments(WORKSPACE_ID).await })
        })
        .collect();

    for handle in handles {
        let listing = handle.await.unwrap().unwrap();
        assert_eq!(listing.workspace_name, "Payments");
    }
}
