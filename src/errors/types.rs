//! # Error Types
//!
//! Typed error taxonomy for the gateway client using `thiserror`.

use reqwest::StatusCode;

/// Custom result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// HTTP statuses that are worth retrying with backoff.
pub const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Returns true if the upstream status is transient.
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Main error type for the gateway client
#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    /// Missing or contradictory configuration (raised at construction)
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The login exchange failed
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// The upstream service rejected the request as malformed (400)
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// The addressed resource does not exist (404)
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// The request conflicts with existing state (409)
    #[error("Resource conflict: {message}")]
    Conflict { message: String },

    /// Retryable upstream or network failure (5xx, 408, 429, no response)
    #[error("Transient service error: {message}{}", status_suffix(.status))]
    TransientService { status: Option<u16>, message: String },

    /// Any other non-success response
    #[error("API error: {message} (status: {status})")]
    UnclassifiedApi { status: u16, message: String },

    /// Request or response body could not be encoded/decoded
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status: {})", s)).unwrap_or_default()
}

impl GatewayError {
    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Configuration { message: message.into(), source: Some(source) }
    }

    /// Create an authentication error
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication { message: message.into() }
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput { message: message.into() }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound { message: message.into() }
    }

    /// Create a conflict error
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict { message: message.into() }
    }

    /// Create a transient error for a failure that produced no response
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::TransientService { status: None, message: message.into() }
    }

    /// Create the generic API error for a status and message.
    ///
    /// Statuses in [`RETRYABLE_STATUSES`] become [`GatewayError::TransientService`],
    /// everything else [`GatewayError::UnclassifiedApi`].
    pub fn api<S: Into<String>>(status: StatusCode, message: S) -> Self {
        let status = status.as_u16();
        if is_retryable_status(status) {
            Self::TransientService { status: Some(status), message: message.into() }
        } else {
            Self::UnclassifiedApi { status, message: message.into() }
        }
    }

    /// Create a serialization error with context
    pub fn serialization<S: Into<String>>(source: serde_json::Error, context: S) -> Self {
        Self::Serialization { source, context: context.into() }
    }

    /// HTTP status associated with this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GatewayError::Configuration { .. } => None,
            GatewayError::Authentication { .. } => Some(401),
            GatewayError::InvalidInput { .. } => Some(400),
            GatewayError::NotFound { .. } => Some(404),
            GatewayError::Conflict { .. } => Some(409),
            GatewayError::TransientService { status, .. } => *status,
            GatewayError::UnclassifiedApi { status, .. } => Some(*status),
            GatewayError::Serialization { .. } => None,
        }
    }

    /// Check if this error should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::TransientService { .. })
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error, "JSON serialization failed")
    }
}

impl From<config::ConfigError> for GatewayError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for GatewayError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::configuration(format!("Validation failed: {}", validation_message(&errors)))
    }
}

/// Flatten field errors into `field: message, message; field: message`
pub(crate) fn validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .map(|(field, field_errors)| {
            let error_messages: Vec<String> = field_errors
                .iter()
                .map(|e| e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string()))
                .collect();
            format!("{}: {}", field, error_messages.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}
