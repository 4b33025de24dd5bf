//! # Configuration Management
//!
//! Layered configuration for the gateway client: built-in defaults, an
//! optional TOML file, then `INFISICAL_*` environment variables. Nested keys
//! use a double underscore, e.g. `INFISICAL_RETRY__MAX_RETRIES=5`.

pub mod settings;

pub use settings::{GatewayConfig, LoggingConfig, RetryConfig, DEFAULT_BASE_URL};

use crate::errors::Result;
use std::path::Path;

/// Prefix for configuration environment variables
pub const ENV_PREFIX: &str = "INFISICAL";

impl GatewayConfig {
    /// Load configuration from an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(false));
        }

        let config: GatewayConfig = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;

        tracing::debug!(
            base_url = %config.base_url,
            static_token = config.token.is_some(),
            client_credentials = config.client_id.is_some(),
            "Loaded gateway configuration"
        );

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }
}
