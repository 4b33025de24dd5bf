//! # Infisical API Client
//!
//! Authenticated, retrying access to the Infisical REST API.
//!
//! - [`CredentialStore`] holds the static token or client credentials
//! - [`TokenAuthenticator`] keeps universal-auth access tokens fresh
//! - [`RequestExecutor`] sends requests with bearer auth and backoff
//! - [`classify_error`] maps failed responses onto [`GatewayError`](crate::errors::GatewayError)

pub mod authenticator;
pub mod classifier;
pub mod credentials;
pub mod executor;
pub mod request;

pub use authenticator::{LoginResponse, TokenAuthenticator, LOGIN_PATH};
pub use classifier::{classify_error, classify_response, UNPARSEABLE_ERROR_MESSAGE};
pub use credentials::{expiry_for, AuthStrategy, CredentialStore};
pub use executor::{RequestExecutor, RetryPolicy};
pub use request::ApiRequest;
