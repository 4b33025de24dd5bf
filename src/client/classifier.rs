//! Mapping of non-success upstream responses onto [`GatewayError`].

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::GatewayError;

/// Message used when the error body cannot be read or decoded
pub const UNPARSEABLE_ERROR_MESSAGE: &str = "failed to parse error response";

/// Error payload returned by the Infisical API
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<Value>,
}

/// Read the body of a failed response and classify it
pub async fn classify_response(response: Response) -> GatewayError {
    let status = response.status();
    match response.bytes().await {
        Ok(body) => classify_error(status, &body),
        Err(e) => {
            tracing::debug!(status = status.as_u16(), error = %e, "Failed to read error body");
            GatewayError::api(status, UNPARSEABLE_ERROR_MESSAGE)
        }
    }
}

/// Classify a non-success status and its raw body.
///
/// A JSON payload with a `message` field always yields the generic API error.
/// Plain text bodies are mapped by status, with the canonical reason phrase
/// standing in for an empty body.
pub fn classify_error(status: StatusCode, body: &[u8]) -> GatewayError {
    if let Ok(ErrorBody { message: Some(message) }) = serde_json::from_slice::<ErrorBody>(body) {
        let detail = match message {
            Value::String(text) if !text.trim().is_empty() => text,
            Value::String(_) => reason(status),
            other => other.to_string(),
        };
        return GatewayError::api(status, detail);
    }

    let detail = match std::str::from_utf8(body) {
        Ok(text) if text.trim().is_empty() => reason(status),
        Ok(text) => text.trim().to_string(),
        Err(_) => return GatewayError::api(status, UNPARSEABLE_ERROR_MESSAGE),
    };

    match status {
        StatusCode::BAD_REQUEST => GatewayError::invalid_input(detail),
        StatusCode::NOT_FOUND => GatewayError::not_found(detail),
        StatusCode::CONFLICT => GatewayError::conflict(detail),
        _ => GatewayError::api(status, detail),
    }
}

fn reason(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("unknown error").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_bodies_mapped_by_status() {
        assert!(matches!(
            classify_error(StatusCode::NOT_FOUND, b"Secret not found"),
            GatewayError::NotFound { message } if message == "Secret not found"
        ));
        assert!(matches!(
            classify_error(StatusCode::BAD_REQUEST, b"bad path"),
            GatewayError::InvalidInput { .. }
        ));
        assert!(matches!(
            classify_error(StatusCode::CONFLICT, b"exists"),
            GatewayError::Conflict { .. }
        ));
    }

    #[test]
    fn test_json_message_is_generic_api_error() {
        let err = classify_error(StatusCode::NOT_FOUND, br#"{"message": "Secret not found"}"#);
        assert!(matches!(
            &err,
            GatewayError::UnclassifiedApi { status: 404, message } if message == "Secret not found"
        ));
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn test_json_without_message_is_treated_as_text() {
        let err = classify_error(StatusCode::CONFLICT, br#"{"error": "duplicate"}"#);
        assert!(matches!(err, GatewayError::Conflict { message } if message.contains("duplicate")));
    }

    #[test]
    fn test_retryable_statuses_are_transient() {
        for status in [408, 429, 500, 502, 503, 504] {
            let status = StatusCode::from_u16(status).unwrap();
            let err = classify_error(status, b"");
            assert!(err.is_retryable(), "{} should be transient", status);
            assert_eq!(err.status_code(), Some(status.as_u16()));
        }
    }

    #[test]
    fn test_other_statuses_are_unclassified() {
        let err = classify_error(StatusCode::FORBIDDEN, br#"{"message": "Access denied"}"#);
        assert!(matches!(
            &err,
            GatewayError::UnclassifiedApi { status: 403, message } if message == "Access denied"
        ));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_plain_text_and_empty_bodies() {
        let err = classify_error(StatusCode::NOT_FOUND, b"  no such folder \n");
        assert_eq!(err.to_string(), "Resource not found: no such folder");

        let err = classify_error(StatusCode::CONFLICT, b"");
        assert_eq!(err.to_string(), "Resource conflict: Conflict");

        let err = classify_error(StatusCode::FORBIDDEN, br#"{"message": ""}"#);
        assert_eq!(err.to_string(), "API error: Forbidden (status: 403)");
    }

    #[test]
    fn test_structured_message_kept_as_json() {
        let body = br#"{"message": [{"path": "secretKey", "message": "Required"}]}"#;
        let err = classify_error(StatusCode::BAD_REQUEST, body);
        assert!(err.to_string().contains("secretKey"));
    }

    #[test]
    fn test_undecodable_body() {
        let err = classify_error(StatusCode::BAD_GATEWAY, &[0xff, 0xfe, 0x00]);
        assert!(matches!(
            err,
            GatewayError::TransientService { status: Some(502), message }
                if message == UNPARSEABLE_ERROR_MESSAGE
        ));
    }
}
