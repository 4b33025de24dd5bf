//! Public operations of the Infisical gateway.
//!
//! [`InfisicalGateway`] wires the credential store, authenticator and request
//! executor together and exposes them through the [`SecretsGateway`] trait.
//! Every operation runs in its own `gateway_operation` span.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, Instrument};
use url::Url;

use super::aggregator::{ResourceAggregator, SECRETS_PATH};
use super::models::{
    validate_request, CreateSecretBody, CreateSecretRequest, DeleteSecretBody,
    DeleteSecretRequest, EnvironmentListing, Secret, SecretEnvelope, SecretListing, SecretScope,
    UpdateSecretBody, UpdateSecretRequest, WorkspaceEnvelope,
};
use crate::client::{
    ApiRequest, AuthStrategy, CredentialStore, RequestExecutor, RetryPolicy, TokenAuthenticator,
};
use crate::config::GatewayConfig;
use crate::errors::{GatewayError, Result};

/// Workspace lookup route
pub const WORKSPACE_PATH: &str = "/api/v1/workspace";

/// Operations offered to collaborators.
///
/// Plain data goes in and plain data or a classified [`GatewayError`] comes
/// out. Nothing is cached between calls.
#[async_trait]
pub trait SecretsGateway: Send + Sync {
    /// Native and imported secrets plus folders at the scope's path
    async fn get_secrets(&self, scope: &SecretScope) -> Result<SecretListing>;

    /// A single secret addressed by id
    async fn get_secret_by_id(&self, scope: &SecretScope, secret_id: &str) -> Result<Secret>;

    /// A single secret addressed by key
    async fn get_secret_by_key(&self, scope: &SecretScope, key: &str) -> Result<Secret>;

    async fn create_secret(&self, request: &CreateSecretRequest) -> Result<Secret>;

    async fn update_secret(&self, request: &UpdateSecretRequest) -> Result<Secret>;

    /// Delete a secret, returning it when the upstream echoes it back
    async fn delete_secret(&self, request: &DeleteSecretRequest) -> Result<Option<Secret>>;

    /// All environments of a workspace, with the workspace name
    async fn get_environments(&self, workspace_id: &str) -> Result<EnvironmentListing>;
}

/// Gateway client for one Infisical instance and one set of credentials
#[derive(Debug)]
pub struct InfisicalGateway {
    base_url: Url,
    store: Arc<CredentialStore>,
    executor: RequestExecutor,
}

impl InfisicalGateway {
    /// Build a gateway from configuration.
    ///
    /// Fails with [`GatewayError::Configuration`] on invalid settings or
    /// missing credentials. No network call is made.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(CredentialStore::from_config(&config)?);

        let base_url = Url::parse(&config.base_url).map_err(|e| {
            GatewayError::configuration_with_source(
                format!("Invalid base URL '{}'", config.base_url),
                Box::new(e),
            )
        })?;

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                GatewayError::configuration_with_source("Failed to build HTTP client", Box::new(e))
            })?;

        let authenticator = Arc::new(TokenAuthenticator::new(
            http.clone(),
            base_url.clone(),
            Arc::clone(&store),
            config.token_safety_margin_seconds,
        ));
        let policy = RetryPolicy::from(&config.retry);
        let executor = RequestExecutor::new(http, base_url.clone(), authenticator, policy);

        info!(
            base_url = %base_url,
            auth_strategy = %store.current_strategy(),
            "Infisical gateway initialized"
        );

        Ok(Self { base_url, store, executor })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth_strategy(&self) -> AuthStrategy {
        self.store.current_strategy()
    }

    /// Shared credential state, e.g. to inspect token expiry
    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    async fn fetch_secret(&self, scope: &SecretScope, identifier: &str) -> Result<Secret> {
        validate_request(scope)?;
        if identifier.is_empty() {
            return Err(GatewayError::invalid_input("secret identifier cannot be empty"));
        }

        let request = ApiRequest::get(SECRETS_PATH)
            .segment(identifier)
            .query("workspaceId", &scope.workspace_id)
            .query_opt("environment", scope.environment.as_deref())
            .query("secretPath", scope.path_or_root())
            .query("include_imports", true);

        let envelope: SecretEnvelope = self.executor.execute_json(&request).await?;
        Ok(envelope.secret.into())
    }

    async fn list_secrets(&self, scope: &SecretScope) -> Result<SecretListing> {
        validate_request(scope)?;
        ResourceAggregator::new(&self.executor).get_secrets(scope).await
    }

    async fn send_create(&self, request: &CreateSecretRequest) -> Result<Secret> {
        validate_request(request)?;
        let api_request = ApiRequest::post(SECRETS_PATH)
            .segment(request.key.as_str())
            .json(&CreateSecretBody::from(request))?;

        let envelope: SecretEnvelope = self.executor.execute_json(&api_request).await?;
        info!("Secret created");
        Ok(envelope.secret.into())
    }

    /// Upstream addresses a secret by its key in the path, so a rename is sent
    /// under the current key with the new one in the body.
    async fn send_update(&self, request: &UpdateSecretRequest) -> Result<Secret> {
        validate_request(request)?;
        let api_request = ApiRequest::patch(SECRETS_PATH)
            .segment(request.current_key.as_str())
            .json(&UpdateSecretBody::from(request))?;

        let envelope: SecretEnvelope = self.executor.execute_json(&api_request).await?;
        info!("Secret updated");
        Ok(envelope.secret.into())
    }

    /// Addressed by secret key in the path, like updates.
    async fn send_delete(&self, request: &DeleteSecretRequest) -> Result<Option<Secret>> {
        validate_request(request)?;
        let api_request = ApiRequest::delete(SECRETS_PATH)
            .segment(request.key.as_str())
            .json(&DeleteSecretBody::from(request))?;

        // Some deployments answer 204 without echoing the secret
        let envelope: Option<SecretEnvelope> = self.executor.execute_json(&api_request).await?;
        info!("Secret deleted");
        Ok(envelope.map(|e| e.secret.into()))
    }

    async fn fetch_environments(&self, workspace_id: &str) -> Result<EnvironmentListing> {
        if workspace_id.is_empty() {
            return Err(GatewayError::invalid_input("workspace ID cannot be empty"));
        }
        let request = ApiRequest::get(WORKSPACE_PATH).segment(workspace_id);
        let envelope: WorkspaceEnvelope = self.executor.execute_json(&request).await?;
        Ok(envelope.workspace.into())
    }
}

#[async_trait]
impl SecretsGateway for InfisicalGateway {
    async fn get_secrets(&self, scope: &SecretScope) -> Result<SecretListing> {
        let path = scope.path_or_root();
        let span = crate::gateway_span!("get_secrets", scope.workspace_id, path = %path);
        self.list_secrets(scope).instrument(span).await
    }

    async fn get_secret_by_id(&self, scope: &SecretScope, secret_id: &str) -> Result<Secret> {
        let span = crate::gateway_span!("get_secret_by_id", scope.workspace_id, secret_id);
        self.fetch_secret(scope, secret_id).instrument(span).await
    }

    async fn get_secret_by_key(&self, scope: &SecretScope, key: &str) -> Result<Secret> {
        let span = crate::gateway_span!("get_secret_by_key", scope.workspace_id, key);
        self.fetch_secret(scope, key).instrument(span).await
    }

    async fn create_secret(&self, request: &CreateSecretRequest) -> Result<Secret> {
        let span = crate::gateway_span!(
            "create_secret",
            request.workspace_id,
            environment = %request.environment,
            key = %request.key
        );
        self.send_create(request).instrument(span).await
    }

    async fn update_secret(&self, request: &UpdateSecretRequest) -> Result<Secret> {
        let span = crate::gateway_span!(
            "update_secret",
            request.workspace_id,
            environment = %request.environment,
            key = %request.current_key,
            renamed = request.is_rename()
        );
        self.send_update(request).instrument(span).await
    }

    async fn delete_secret(&self, request: &DeleteSecretRequest) -> Result<Option<Secret>> {
        let span = crate::gateway_span!(
            "delete_secret",
            request.workspace_id,
            environment = %request.environment,
            key = %request.key
        );
        self.send_delete(request).instrument(span).await
    }

    async fn get_environments(&self, workspace_id: &str) -> Result<EnvironmentListing> {
        let span = crate::gateway_span!("get_environments", workspace_id);
        self.fetch_environments(workspace_id).instrument(span).await
    }
}
