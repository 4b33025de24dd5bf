//! # Error Handling
//!
//! Error taxonomy for the gateway client. Every failure surfaced by the
//! facade is one of the [`GatewayError`] variants.

pub mod types;

pub use types::{is_retryable_status, GatewayError, Result, RETRYABLE_STATUSES};
