use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Errors that can occur when using the Grok API client
///
/// Every failure path ends in exactly one of these. [`GrokError::status`]
/// returns the upstream HTTP status, or `0` when no HTTP response exists.
#[derive(Debug, Error)]
pub enum GrokError {
    /// Transport failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// Non-success HTTP response from the upstream
    #[error("API error ({}): {}", .0.status, .0.message)]
    Api(ApiErrorObject),

    /// Configuration error (e.g., missing credentials)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Response body could not be decoded
    #[error("Serialization error: {0}")]
    Serde(String),

    /// A request or normalized response broke a structural rule
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),
}

/// API error object built from a non-success upstream response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorObject {
    /// HTTP status code
    pub status: u16,
    /// Human-readable error message
    pub message: String,
    /// Upstream error type (e.g., `invalid_request_error`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Upstream error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Raw error payload as returned by the upstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

/// Serializable `{message, status, response}` view of a [`GrokError`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable error message
    pub message: String,
    /// HTTP status, or 0 for non-HTTP failures
    pub status: u16,
    /// Raw upstream error payload, when one was received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<Value>,
}

impl GrokError {
    /// Determines if this error is retryable
    ///
    /// Retryable errors are rate limits (429), the gateway/server statuses
    /// 500, 502, 503 and 504, and every transport failure.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api(obj) => crate::retry::is_retryable_status(obj.status),
            Self::Reqwest(_) => true,
            Self::Config(_) | Self::Serde(_) | Self::Validation(_) => false,
        }
    }

    /// HTTP status of the failure, `0` when there was no HTTP response
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Api(obj) => obj.status,
            Self::Reqwest(e) => e.status().map_or(0, |s| s.as_u16()),
            Self::Config(_) | Self::Serde(_) | Self::Validation(_) => 0,
        }
    }

    /// Error message without the variant prefix
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Api(obj) => obj.message.clone(),
            Self::Reqwest(e) => e.to_string(),
            Self::Config(m) | Self::Serde(m) => m.clone(),
            Self::Validation(v) => v.to_string(),
        }
    }

    /// Raw upstream error payload, if one was received
    #[must_use]
    pub const fn response(&self) -> Option<&Value> {
        match self {
            Self::Api(obj) => obj.raw.as_ref(),
            _ => None,
        }
    }

    /// Returns true for 401/403 responses, which need a configuration fix rather than a retry
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self.status(), 401 | 403)
    }

    /// Builds the serializable payload handed to front ends
    #[must_use]
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            message: self.message(),
            status: self.status(),
            response: self.response().cloned(),
        }
    }
}

impl From<ValidationErrors> for GrokError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

fn snippet(body: &[u8]) -> String {
    String::from_utf8_lossy(&body[..body.len().min(400)]).into_owned()
}

/// Maps a serde deserialization error to a `GrokError` with context
#[must_use]
pub fn map_deser(e: &serde_json::Error, body: &[u8]) -> GrokError {
    GrokError::Serde(format!("{e}: {}", snippet(body)))
}

/// Deserializes an API error from the response body
///
/// Parses `{error:{message,type,code}}` when possible and keeps the raw JSON;
/// falls back to the (capped) plain-text body otherwise.
#[must_use]
pub fn deserialize_api_error(status: StatusCode, body: &[u8]) -> GrokError {
    let code = status.as_u16();
    let raw = serde_json::from_slice::<Value>(body).ok();

    if let Some(value) = &raw
        && let Ok(env) = serde_json::from_value::<ErrorEnvelope>(value.clone())
    {
        return GrokError::Api(ApiErrorObject {
            status: code,
            message: env
                .error
                .message
                .unwrap_or_else(|| format!("Grok API error: HTTP {code}")),
            error_type: env.error.kind,
            code: env.error.code.map(|c| match c {
                Value::String(s) => s,
                other => other.to_string(),
            }),
            raw,
        });
    }

    let text = snippet(body);
    GrokError::Api(ApiErrorObject {
        status: code,
        message: if text.trim().is_empty() {
            format!("Grok API error: HTTP {code}")
        } else {
            text
        },
        error_type: Some(format!("http_{code}")),
        code: None,
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_error_envelope() {
        let body = json!({
            "error": {"message": "Incorrect API key", "type": "invalid_request_error", "code": "invalid_api_key"},
            "request_id": "abc"
        });
        let err = deserialize_api_error(
            StatusCode::UNAUTHORIZED,
            serde_json::to_vec(&body).unwrap().as_slice(),
        );

        assert_eq!(err.status(), 401);
        assert_eq!(err.message(), "Incorrect API key");
        assert!(err.is_auth());
        assert!(!err.is_retryable());
        let GrokError::Api(obj) = &err else {
            panic!("expected Api error");
        };
        assert_eq!(obj.error_type.as_deref(), Some("invalid_request_error"));
        assert_eq!(obj.code.as_deref(), Some("invalid_api_key"));
        // Extra fields survive in the raw payload
        assert_eq!(err.response().unwrap()["request_id"], "abc");
    }

    #[test]
    fn numeric_error_code_is_stringified() {
        let body = br#"{"error":{"code":42}}"#;
        let err = deserialize_api_error(StatusCode::BAD_REQUEST, body);
        let GrokError::Api(obj) = &err else {
            panic!("expected Api error");
        };
        assert_eq!(obj.code.as_deref(), Some("42"));
        assert_eq!(obj.message, "Grok API error: HTTP 400");
    }

    #[test]
    fn plain_text_body_is_capped() {
        let body = "x".repeat(1000);
        let err = deserialize_api_error(StatusCode::BAD_GATEWAY, body.as_bytes());
        assert_eq!(err.status(), 502);
        assert_eq!(err.message().len(), 400);
        assert!(err.response().is_none());
        assert!(err.is_retryable());
    }

    #[test]
    fn non_http_errors_report_status_zero() {
        let err = GrokError::Config("missing key".into());
        assert_eq!(err.status(), 0);
        assert!(!err.is_retryable());

        let payload = err.to_payload();
        assert_eq!(payload.status, 0);
        assert_eq!(payload.message, "missing key");
        assert!(payload.response.is_none());
    }

    #[test]
    fn payload_serializes_without_empty_response() {
        let payload = GrokError::Serde("bad json".into()).to_payload();
        let v = serde_json::to_value(payload).unwrap();
        assert_eq!(v, json!({"message": "bad json", "status": 0}));
    }
}
