//! # Observability
//!
//! Structured logging for the gateway client via the `tracing` ecosystem.

pub mod logging;

pub use logging::log_config_info;

use crate::config::LoggingConfig;
use crate::errors::{GatewayError, Result};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| {
            GatewayError::configuration(format!("Invalid log level '{}': {}", config.level, e))
        })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let result = if config.json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| {
        GatewayError::configuration_with_source("Failed to install tracing subscriber", e)
    })
}
