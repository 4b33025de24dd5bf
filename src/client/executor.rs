//! Authenticated request execution with bounded retries.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn, Instrument};
use url::Url;

use super::authenticator::TokenAuthenticator;
use super::classifier::classify_response;
use super::request::ApiRequest;
use crate::config::RetryConfig;
use crate::errors::{GatewayError, Result};

/// Retry schedule for upstream requests.
///
/// Retry `n` (zero based) waits `initial_delay * backoff_base^n`, so the
/// defaults give 1s, 2s and 4s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_base: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            backoff_base: config.backoff_base,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    /// Delay before retry number `retry` (zero based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.initial_delay.saturating_mul(self.backoff_base.saturating_pow(retry))
    }

    /// True if `retries_so_far` retries still leave room for another one
    pub fn allows_retry(&self, retries_so_far: u32) -> bool {
        retries_so_far < self.max_retries
    }
}

/// Executes [`ApiRequest`]s with authentication and the retry policy.
#[derive(Debug)]
pub struct RequestExecutor {
    http: Client,
    base_url: Url,
    authenticator: Arc<TokenAuthenticator>,
    policy: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(
        http: Client,
        base_url: Url,
        authenticator: Arc<TokenAuthenticator>,
        policy: RetryPolicy,
    ) -> Self {
        Self { http, base_url, authenticator, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn authenticator(&self) -> &Arc<TokenAuthenticator> {
        &self.authenticator
    }

    /// Execute a request and decode its JSON body.
    ///
    /// Returns `Ok(None)` for 204 and empty bodies.
    pub async fn execute(&self, request: &ApiRequest) -> Result<Option<Value>> {
        let span = crate::upstream_span!(request.method(), request.path());
        self.execute_with_retry(request).instrument(span).await
    }

    /// Execute a request and deserialize its body into `T`.
    ///
    /// An absent body is presented as JSON `null`, so `T = Option<_>` accepts it.
    pub async fn execute_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let value = self.execute(request).await?.unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| {
            GatewayError::serialization(
                e,
                format!("Unexpected response body from {} {}", request.method(), request.path()),
            )
        })
    }

    async fn execute_with_retry(&self, request: &ApiRequest) -> Result<Option<Value>> {
        let mut retries = 0u32;

        loop {
            tracing::Span::current().record("attempt", retries + 1);

            let error = match self.attempt(request).await {
                Ok(body) => return Ok(body),
                Err(error) => error,
            };

            let should_retry = match &error {
                AttemptError::Unauthorized(_) => true,
                AttemptError::Failed(e) => e.is_retryable(),
            };

            if !request.retry_enabled() || !should_retry || !self.policy.allows_retry(retries) {
                if retries > 0 {
                    warn!(retries, error = %error.as_gateway(), "Giving up on upstream request");
                }
                return Err(error.into_gateway());
            }

            if let AttemptError::Unauthorized(_) = error {
                info!("Access token rejected, forcing refresh before retry");
                self.authenticator.store().invalidate().await;
            }

            let delay = self.policy.delay_for(retries);
            warn!(
                error = %error.as_gateway(),
                retry = retries + 1,
                max_retries = self.policy.max_retries,
                delay_ms = delay.as_millis() as u64,
                "Retrying upstream request"
            );
            tokio::time::sleep(delay).await;

            retries += 1;
        }
    }

    async fn attempt(&self, request: &ApiRequest) -> AttemptResult {
        self.authenticator.ensure_valid_token(Utc::now()).await.map_err(AttemptError::Failed)?;

        let token = self.authenticator.store().bearer_token().await.ok_or_else(|| {
            AttemptError::Failed(GatewayError::authentication("no access token available"))
        })?;

        let url = request.url(&self.base_url).map_err(AttemptError::Failed)?;
        let mut builder =
            self.http.request(request.method().clone(), url).bearer_auth(token.expose_secret());
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        debug!("Sending upstream request");
        let response = builder
            .send()
            .await
            .map_err(|e| AttemptError::Failed(GatewayError::network(describe_send_error(&e))))?;

        let status = response.status();
        debug!(status = status.as_u16(), "Upstream responded");

        let dynamic = self.authenticator.store().current_strategy().is_dynamic();
        if status == StatusCode::UNAUTHORIZED && dynamic {
            return Err(AttemptError::Unauthorized(classify_response(response).await));
        }

        if !status.is_success() {
            return Err(AttemptError::Failed(classify_response(response).await));
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AttemptError::Failed(GatewayError::network(describe_send_error(&e))))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            AttemptError::Failed(GatewayError::serialization(
                e,
                format!("Invalid JSON from {} {}", request.method(), request.path()),
            ))
        })
    }
}

type AttemptResult = std::result::Result<Option<Value>, AttemptError>;

/// Outcome of one failed attempt
enum AttemptError {
    /// 401 under a refreshable strategy
    Unauthorized(GatewayError),
    Failed(GatewayError),
}

impl AttemptError {
    fn as_gateway(&self) -> &GatewayError {
        match self {
            AttemptError::Unauthorized(e) | AttemptError::Failed(e) => e,
        }
    }

    fn into_gateway(self) -> GatewayError {
        match self {
            AttemptError::Unauthorized(e) | AttemptError::Failed(e) => e,
        }
    }
}

fn describe_send_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        format!("request failed: {}", error)
    }
}
