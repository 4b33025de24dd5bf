//! # Configuration Settings
//!
//! Defines the configuration structure for the gateway client.

use crate::errors::{GatewayError, Result};
use crate::secrets::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Default Infisical cloud endpoint
pub const DEFAULT_BASE_URL: &str = "https://app.infisical.com";

/// Gateway client configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GatewayConfig {
    /// Base URL of the Infisical instance
    #[serde(default = "default_base_url")]
    #[validate(url(message = "Base URL must be a valid URL"))]
    pub base_url: String,

    /// Static service/API token
    #[serde(default)]
    pub token: Option<SecretString>,

    /// Universal-auth machine identity client ID
    #[serde(default)]
    pub client_id: Option<String>,

    /// Universal-auth machine identity client secret
    #[serde(default)]
    pub client_secret: Option<SecretString>,

    /// Environment slug to select by default when the caller pins none
    #[serde(default)]
    pub environment: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    #[validate(range(
        min = 1,
        max = 300,
        message = "Timeout must be between 1 and 300 seconds"
    ))]
    pub timeout_seconds: u64,

    /// Access tokens are renewed this many seconds before they expire
    #[serde(default = "default_safety_margin_seconds")]
    pub token_safety_margin_seconds: u64,

    /// Retry/backoff settings
    #[serde(default)]
    #[validate(nested)]
    pub retry: RetryConfig,

    /// Logging settings
    #[serde(default)]
    #[validate(nested)]
    pub logging: LoggingConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_safety_margin_seconds() -> u64 {
    300
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            client_id: None,
            client_secret: None,
            environment: None,
            timeout_seconds: default_timeout_seconds(),
            token_safety_margin_seconds: default_safety_margin_seconds(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Configuration using a static token
    pub fn with_token(base_url: impl Into<String>, token: impl Into<SecretString>) -> Self {
        Self { base_url: base_url.into(), token: Some(token.into()), ..Default::default() }
    }

    /// Configuration using universal-auth client credentials
    pub fn with_client_credentials(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<SecretString>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            ..Default::default()
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(GatewayError::from)?;
        Ok(())
    }

    /// Request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Token safety margin as Duration
    pub fn token_safety_margin(&self) -> Duration {
        Duration::from_secs(self.token_safety_margin_seconds)
    }
}

/// Retry/backoff configuration for upstream requests
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    #[validate(range(max = 10, message = "Max retries must be at most 10"))]
    pub max_retries: u32,

    /// Delay before the first retry, in milliseconds
    pub initial_delay_ms: u64,

    /// Multiplier applied to the delay for every further retry
    #[validate(range(min = 1, max = 10, message = "Backoff base must be between 1 and 10"))]
    pub backoff_base: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 3, initial_delay_ms: 1000, backoff_base: 2 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub level: String,

    /// Enable JSON structured logging
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}
