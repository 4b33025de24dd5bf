//! # Infisical Gateway
//!
//! Authenticated gateway client for the Infisical secrets-management REST API.
//!
//! ## Architecture
//!
//! ```text
//! SecretsGateway ──► RequestExecutor ──► TokenAuthenticator ──► Infisical API
//!       │                   │
//!       ▼                   ▼
//! ResourceAggregator   Error classifier
//! ```
//!
//! ## Core Components
//!
//! - **Credential store**: a static token or universal-auth client credentials,
//!   chosen once from configuration
//! - **Token authenticator**: logs in and refreshes access tokens, one login at a time
//! - **Request executor**: bearer auth, bounded retries with exponential backoff,
//!   forced re-authentication on 401
//! - **Error classifier**: maps failed responses onto [`GatewayError`]
//! - **Resource aggregator**: merges native secrets, imported secrets and folders
//! - **Gateway facade**: [`SecretsGateway`] implemented by [`InfisicalGateway`]
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use infisical_gateway::{GatewayConfig, InfisicalGateway, Result, SecretScope, SecretsGateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = GatewayConfig::from_env()?;
//!     let gateway = InfisicalGateway::new(config)?;
//!
//!     let environments = gateway.get_environments("workspace-id").await?;
//!     println!("{} environments", environments.environments.len());
//!
//!     let scope = SecretScope::new("workspace-id").with_environment("dev");
//!     let listing = gateway.get_secrets(&scope).await?;
//!     for secret in &listing.secrets {
//!         println!("{}{}", secret.key, if secret.readonly { " (imported)" } else { "" });
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod observability;
pub mod secrets;

// Re-export commonly used types and traits
pub use crate::client::{AuthStrategy, CredentialStore, RetryPolicy};
pub use crate::config::GatewayConfig;
pub use crate::errors::{GatewayError, Result};
pub use crate::observability::init_logging;
pub use crate::secrets::{
    CreateSecretRequest, DeleteSecretRequest, Environment, EnvironmentListing, Folder,
    InfisicalGateway, Secret, SecretListing, SecretScope, SecretString, SecretsGateway,
    UpdateSecretRequest,
};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
