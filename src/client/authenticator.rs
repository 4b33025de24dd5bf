//! Universal-auth login and single-flight access token refresh.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use super::classifier::classify_response;
use super::credentials::{expiry_for, CredentialStore};
use super::request::ApiRequest;
use crate::errors::{GatewayError, Result};
use crate::secrets::SecretString;

/// Universal-auth login route
pub const LOGIN_PATH: &str = "/api/v1/auth/universal-auth/login";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

/// Successful login payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
    #[serde(default, rename = "accessTokenMaxTTL")]
    pub access_token_max_ttl: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Keeps the access token of a [`CredentialStore`] fresh.
///
/// At most one login exchange is in flight per authenticator. Callers that
/// find the token stale while a refresh is running wait for it, then check
/// the token again before deciding to log in themselves.
pub struct TokenAuthenticator {
    http: Client,
    base_url: Url,
    store: Arc<CredentialStore>,
    safety_margin_seconds: u64,
    refresh_lock: Mutex<()>,
}

impl TokenAuthenticator {
    pub fn new(
        http: Client,
        base_url: Url,
        store: Arc<CredentialStore>,
        safety_margin_seconds: u64,
    ) -> Self {
        Self { http, base_url, store, safety_margin_seconds, refresh_lock: Mutex::new(()) }
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Make sure a usable token exists at `now`, logging in if needed.
    ///
    /// Returns immediately for the static strategy.
    pub async fn ensure_valid_token(&self, now: DateTime<Utc>) -> Result<()> {
        if !self.store.current_strategy().is_dynamic() || self.store.is_token_valid(now).await {
            return Ok(());
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have finished a refresh while we waited
        if self.store.is_token_valid(now).await {
            debug!("Access token refreshed by concurrent caller");
            return Ok(());
        }

        self.login().await
    }

    /// Perform the login exchange unconditionally
    pub async fn refresh(&self) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;
        self.login().await
    }

    async fn login(&self) -> Result<()> {
        let (client_id, client_secret) = self.store.login_credentials().ok_or_else(|| {
            GatewayError::authentication("static token strategy has no login exchange")
        })?;

        let url = ApiRequest::post(LOGIN_PATH).url(&self.base_url)?;
        let body = LoginRequest { client_id, client_secret: client_secret.expose_secret() };

        info!(client_id = %client_id, "Authenticating with universal auth");
        let issued_at = Utc::now();

        let response =
            self.http.post(url).json(&body).send().await.map_err(|e| {
                GatewayError::authentication(format!("login request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error = classify_response(response).await;
            warn!(
                status = status.as_u16(),
                client_id = %client_id,
                "Universal auth login rejected"
            );
            return Err(GatewayError::authentication(format!("login failed: {}", error)));
        }

        let login: LoginResponse = response.json().await.map_err(|e| {
            GatewayError::authentication(format!("invalid login response: {}", e))
        })?;

        let expires_at = expiry_for(issued_at, login.expires_in, self.safety_margin_seconds);
        self.store.store_access_token(SecretString::new(login.access_token), expires_at).await;

        info!(
            expires_in = login.expires_in,
            expires_at = %expires_at,
            "Obtained universal auth access token"
        );
        Ok(())
    }
}

impl std::fmt::Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("base_url", &self.base_url.as_str())
            .field("strategy", &self.store.current_strategy())
            .field("safety_margin_seconds", &self.safety_margin_seconds)
            .finish()
    }
}
