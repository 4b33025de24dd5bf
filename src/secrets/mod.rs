//! # Secrets
//!
//! Secrets, folders and environments of Infisical workspaces.
//!
//! The [`SecretsGateway`] trait is the surface offered to collaborators;
//! [`InfisicalGateway`] implements it on top of [`crate::client`].
//!
//! ```rust,ignore
//! use infisical_gateway::{GatewayConfig, InfisicalGateway, SecretScope, SecretsGateway};
//!
//! let config = GatewayConfig::with_client_credentials(
//!     "https://app.infisical.com",
//!     "machine-identity-id",
//!     "machine-identity-secret",
//! );
//! let gateway = InfisicalGateway::new(config)?;
//!
//! let scope = SecretScope::new("workspace-id").with_environment("dev").with_path("/api");
//! let listing = gateway.get_secrets(&scope).await?;
//! for secret in listing.imported() {
//!     println!("{} (imported)", secret.key);
//! }
//! ```

pub mod aggregator;
pub mod gateway;
pub mod models;
pub mod types;

pub use aggregator::{merge_imports, ResourceAggregator};
pub use gateway::{InfisicalGateway, SecretsGateway};
pub use models::{
    CreateSecretRequest, DeleteSecretRequest, Environment, EnvironmentListing, Folder, Secret,
    SecretListing, SecretScope, UpdateSecretRequest, Workspace, ROOT_PATH,
};
pub use types::SecretString;
