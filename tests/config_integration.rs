//! Integration tests for layered configuration loading

use std::io::Write;
use std::sync::Mutex;

use infisical_gateway::{AuthStrategy, GatewayConfig, GatewayError, InfisicalGateway};

// Environment variables are process-wide
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const MANAGED_VARS: &[&str] = &[
    "INFISICAL_BASE_URL",
    "INFISICAL_TOKEN",
    "INFISICAL_CLIENT_ID",
    "INFISICAL_CLIENT_SECRET",
    "INFISICAL_ENVIRONMENT",
    "INFISICAL_TIMEOUT_SECONDS",
    "INFISICAL_RETRY__MAX_RETRIES",
    "INFISICAL_LOGGING__LEVEL",
];

/// Clears managed variables on creation and restores them on drop
struct EnvGuard {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    fn new() -> Self {
        let saved = MANAGED_VARS.iter().map(|name| (*name, std::env::var(name).ok())).collect();
        for name in MANAGED_VARS {
            std::env::remove_var(name);
        }
        Self { saved }
    }

    fn set(&self, name: &str, value: &str) {
        std::env::set_var(name, value);
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (name, value) in &self.saved {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
}

fn lock_env() -> std::sync::MutexGuard<'static, ()> {
    ENV_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[test]
fn test_environment_variables() {
    let _lock = lock_env();
    let env = EnvGuard::new();
    env.set("INFISICAL_BASE_URL", "https://secrets.internal.example.com");
    env.set("INFISICAL_CLIENT_ID", "machine-id");
    env.set("INFISICAL_CLIENT_SECRET", "machine-secret");
    env.set("INFISICAL_ENVIRONMENT", "staging");
    env.set("INFISICAL_RETRY__MAX_RETRIES", "5");

    let config = GatewayConfig::from_env().unwrap();

    assert_eq!(config.base_url, "https://secrets.internal.example.com");
    assert_eq!(config.client_id.as_deref(), Some("machine-id"));
    assert_eq!(config.client_secret.as_ref().unwrap().expose_secret(), "machine-secret");
    assert_eq!(config.environment.as_deref(), Some("staging"));
    assert_eq!(config.retry.max_retries, 5);
    assert_eq!(config.retry.backoff_base, 2);
    assert_eq!(config.timeout_seconds, 30);

    let gateway = InfisicalGateway::new(config).unwrap();
    assert_eq!(gateway.auth_strategy(), AuthStrategy::ClientCredentials);
}

#[test]
fn test_defaults_without_sources() {
    let _lock = lock_env();
    let _env = EnvGuard::new();

    let config = GatewayConfig::load(None).unwrap();

    assert_eq!(config.base_url, "https://app.infisical.com");
    assert!(config.token.is_none());
    assert_eq!(config.retry.initial_delay_ms, 1000);
    assert_eq!(config.logging.level, "info");

    // Loading succeeds; the missing credentials are reported by the gateway
    let err = InfisicalGateway::new(config).unwrap_err();
    assert!(matches!(err, GatewayError::Configuration { .. }));
}

#[test]
fn test_file_with_environment_override() {
    let _lock = lock_env();
    let env = EnvGuard::new();

    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
base_url = "https://file.example.com"
token = "st.from-file"
timeout_seconds = 10

[retry]
max_retries = 1
initial_delay_ms = 250

[logging]
level = "debug"
"#
    )
    .unwrap();
    file.flush().unwrap();

    env.set("INFISICAL_TIMEOUT_SECONDS", "45");

    let config = GatewayConfig::load(Some(file.path())).unwrap();

    assert_eq!(config.base_url, "https://file.example.com");
    assert_eq!(config.token.as_ref().unwrap().expose_secret(), "st.from-file");
    assert_eq!(config.timeout_seconds, 45);
    assert_eq!(config.retry.max_retries, 1);
    assert_eq!(config.retry.initial_delay_ms, 250);
    assert_eq!(config.retry.backoff_base, 2);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_missing_file_is_optional() {
    let _lock = lock_env();
    let env = EnvGuard::new();
    env.set("INFISICAL_TOKEN", "st.env-token");

    let dir = tempfile::tempdir().unwrap();
    let config = GatewayConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();

    assert_eq!(config.token.as_ref().unwrap().expose_secret(), "st.env-token");
}

#[test]
fn test_invalid_values_rejected() {
    let _lock = lock_env();
    let env = EnvGuard::new();
    env.set("INFISICAL_TOKEN", "st.env-token");
    env.set("INFISICAL_TIMEOUT_SECONDS", "0");

    let err = GatewayConfig::from_env().unwrap_err();
    assert!(matches!(err, GatewayError::Configuration { .. }));
    assert!(err.to_string().contains("timeout_seconds"));
}

#[test]
fn test_unparseable_value_rejected() {
    let _lock = lock_env();
    let env = EnvGuard::new();
    env.set("INFISICAL_RETRY__MAX_RETRIES", "many");

    let err = GatewayConfig::from_env().unwrap_err();
    assert!(matches!(err, GatewayError::Configuration { .. }));
}
