//! Shared helpers for integration tests against a mocked Infisical API

#![allow(dead_code)]

use infisical_gateway::GatewayConfig;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const WORKSPACE_ID: &str = "6512ab0e0d6d9a8f";
pub const LOGIN_PATH: &str = "/api/v1/auth/universal-auth/login";
pub const SECRETS_PATH: &str = "/api/v3/secrets/raw";
pub const FOLDERS_PATH: &str = "/api/v1/folders";

/// Retry delay used by tests so backoff stays fast
pub const TEST_RETRY_DELAY_MS: u64 = 10;

/// Static-token configuration pointing at the mock server
pub fn token_config(server: &MockServer) -> GatewayConfig {
    let mut config = GatewayConfig::with_token(server.uri(), "st.service-token");
    config.retry.initial_delay_ms = TEST_RETRY_DELAY_MS;
    config
}

/// Client-credentials configuration pointing at the mock server
pub fn client_credentials_config(server: &MockServer) -> GatewayConfig {
    let mut config =
        GatewayConfig::with_client_credentials(server.uri(), "machine-id", "machine-secret");
    config.retry.initial_delay_ms = TEST_RETRY_DELAY_MS;
    config
}

/// Successful universal-auth login response
pub fn login_response(access_token: &str, expires_in: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "accessToken": access_token,
        "expiresIn": expires_in,
        "accessTokenMaxTTL": 2_592_000,
        "tokenType": "Bearer"
    }))
}

/// Mount a login endpoint that must be hit exactly `times` times
pub async fn mount_login(server: &MockServer, access_token: &str, expires_in: u64, times: u64) {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(login_response(access_token, expires_in))
        .expect(times)
        .mount(server)
        .await;
}

/// Secret in upstream wire format
pub fn raw_secret(id: &str, key: &str, value: &str) -> Value {
    json!({
        "id": id,
        "secretKey": key,
        "secretValue": value,
        "secretComment": "",
        "type": "shared",
        "version": 1,
        "createdAt": "2024-05-01T12:00:00.000Z",
        "updatedAt": "2024-05-02T08:30:00.000Z"
    })
}

/// Workspace response with the given environment slugs
pub fn workspace_response(name: &str, slugs: &[&str]) -> Value {
    let environments: Vec<Value> = slugs
        .iter()
        .map(|slug| {
            json!({"id": format!("env-{}", slug), "name": slug.to_uppercase(), "slug": slug})
        })
        .collect();
    json!({
        "workspace": {
            "id": WORKSPACE_ID,
            "name": name,
            "slug": name.to_lowercase(),
            "environments": environments
        }
    })
}
