//! HTTP error classification for StarChat responses

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Classification of HTTP errors for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClassification {
    /// Client errors (4xx) - should not retry
    ClientError,
    /// Server errors (5xx) or a server still busy indexing - should retry
    ServerError,
    /// Network errors - should retry
    NetworkError,
    /// Rate limiting - should retry with backoff
    RateLimitError,
    /// Authentication errors - should not retry
    AuthenticationError,
    /// Unknown errors - default to no retry
    Unknown,
}

impl ErrorClassification {
    /// Check if this error type should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorClassification::ServerError
                | ErrorClassification::NetworkError
                | ErrorClassification::RateLimitError
        )
    }
}

/// Normalized HTTP error representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpError {
    /// HTTP status code if available
    pub status_code: Option<u16>,
    /// Error classification for retry logic
    pub classification: ErrorClassification,
    /// StarChat's numeric return code, when the body carried one
    pub server_code: Option<i64>,
    /// Human-readable error message
    pub message: String,
    /// Parsed response body
    pub details: Option<Value>,
    /// Retry-After header value if present
    pub retry_after: Option<u64>,
}

impl HttpError {
    /// Create from a reqwest Response
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();

        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());

        let body = response.text().await.unwrap_or_default();
        let details = serde_json::from_str::<Value>(&body).ok();
        let (server_code, message) = Self::extract_server_error(&details, &body);

        Self {
            status_code: Some(status.as_u16()),
            classification: Self::classify_status(status),
            server_code,
            message,
            details,
            retry_after,
        }
    }

    /// Create from a network/request error
    pub fn from_request_error(error: reqwest::Error) -> Self {
        let classification = if error.is_timeout() || error.is_connect() {
            ErrorClassification::NetworkError
        } else {
            ErrorClassification::Unknown
        };

        Self {
            status_code: None,
            classification,
            server_code: None,
            message: error.to_string(),
            details: None,
            retry_after: None,
        }
    }

    /// A retryable error for a server that answered but is not ready yet
    pub fn busy(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: Some(status.as_u16()),
            classification: ErrorClassification::ServerError,
            server_code: None,
            message: message.into(),
            details: None,
            retry_after: None,
        }
    }

    /// Classify HTTP status code
    pub fn classify_status(status: StatusCode) -> ErrorClassification {
        match status.as_u16() {
            401 | 403 => ErrorClassification::AuthenticationError,
            429 => ErrorClassification::RateLimitError,
            400..=499 => ErrorClassification::ClientError,
            500..=599 => ErrorClassification::ServerError,
            _ => ErrorClassification::Unknown,
        }
    }

    /// StarChat answers errors with `{"code": <int>, "message": <text>}`
    fn extract_server_error(details: &Option<Value>, body: &str) -> (Option<i64>, String) {
        if let Some(json) = details {
            let code = json.get("code").and_then(Value::as_i64);
            if let Some(message) = json.get("message").and_then(Value::as_str) {
                return (code, message.to_string());
            }
            return (code, body.to_string());
        }
        (None, body.to_string())
    }

    /// Check if this error should trigger a retry
    pub fn should_retry(&self) -> bool {
        self.classification.is_retryable()
    }

    /// Server-requested delay before retrying (in seconds)
    pub fn get_retry_delay(&self) -> Option<u64> {
        self.retry_after
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HTTP Error [{}]: {} (classification: {:?})",
            self.status_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            self.message,
            self.classification
        )
    }
}

impl std::error::Error for HttpError {}

impl From<HttpError> for crate::Error {
    fn from(http_error: HttpError) -> Self {
        crate::Error::Http {
            message: http_error.message.clone(),
            status_code: http_error.status_code,
            source: Some(anyhow::anyhow!("{:?}", http_error.details)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ErrorClassification::ServerError.is_retryable());
        assert!(ErrorClassification::NetworkError.is_retryable());
        assert!(ErrorClassification::RateLimitError.is_retryable());
        assert!(!ErrorClassification::ClientError.is_retryable());
        assert!(!ErrorClassification::AuthenticationError.is_retryable());
        assert!(!ErrorClassification::Unknown.is_retryable());
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            HttpError::classify_status(StatusCode::UNAUTHORIZED),
            ErrorClassification::AuthenticationError
        );
        assert_eq!(
            HttpError::classify_status(StatusCode::TOO_MANY_REQUESTS),
            ErrorClassification::RateLimitError
        );
        assert_eq!(
            HttpError::classify_status(StatusCode::BAD_REQUEST),
            ErrorClassification::ClientError
        );
        assert_eq!(
            HttpError::classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            ErrorClassification::ServerError
        );
    }

    #[test]
    fn test_server_error_extraction() {
        let json = serde_json::json!({"code": 100, "message": "index not found"});
        let (code, message) = HttpError::extract_server_error(&Some(json), "raw body");
        assert_eq!(code, Some(100));
        assert_eq!(message, "index not found");

        let (code, message) = HttpError::extract_server_error(&None, "plain text");
        assert_eq!(code, None);
        assert_eq!(message, "plain text");
    }

    #[test]
    fn test_busy_is_retryable() {
        let error = HttpError::busy(StatusCode::NOT_FOUND, "index not ready");
        assert!(error.should_retry());
        assert_eq!(error.status_code, Some(404));
        assert_eq!(error.get_retry_delay(), None);
    }

    #[test]
    fn test_conversion_to_crate_error() {
        let error = HttpError::busy(StatusCode::SERVICE_UNAVAILABLE, "busy");
        let converted: crate::Error = error.into();
        assert!(matches!(converted, crate::Error::Http { status_code: Some(503), .. }));
    }
}
