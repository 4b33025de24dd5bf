//! # Structured Logging
//!
//! Span macros for gateway operations and upstream requests.

/// Create a tracing span for one facade operation.
///
/// Every span carries a random `operation_id` so the attempts, retries and
/// token refreshes of one logical operation can be correlated.
///
/// ```rust,ignore
/// let span = gateway_span!("get_secrets", "workspace-1");
/// let span = gateway_span!("update_secret", "workspace-1", environment = "dev");
/// ```
#[macro_export]
macro_rules! gateway_span {
    ($operation:expr, $workspace_id:expr) => {
        tracing::info_span!(
            "gateway_operation",
            operation = %$operation,
            workspace_id = %$workspace_id,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $workspace_id:expr, $($field:tt)*) => {
        tracing::info_span!(
            "gateway_operation",
            operation = %$operation,
            workspace_id = %$workspace_id,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Create a tracing span for a single upstream HTTP request
#[macro_export]
macro_rules! upstream_span {
    ($method:expr, $path:expr) => {
        tracing::debug_span!(
            "upstream_request",
            method = %$method,
            path = %$path,
            attempt = tracing::field::Empty
        )
    };
}

/// Log configuration at startup
pub fn log_config_info(config: &crate::config::GatewayConfig) {
    tracing::info!(
        base_url = %config.base_url,
        auth_strategy = %auth_strategy_label(config),
        pinned_environment = ?config.environment,
        max_retries = config.retry.max_retries,
        timeout_seconds = config.timeout_seconds,
        "Infisical gateway configuration"
    );
}

/// Strategy the credential store would pick, or `none` when the credentials
/// are incomplete or conflicting
fn auth_strategy_label(config: &crate::config::GatewayConfig) -> String {
    crate::client::CredentialStore::from_config(config)
        .map(|store| store.current_strategy().to_string())
        .unwrap_or_else(|_| "none".to_string())
}
