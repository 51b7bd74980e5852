//! Unified application error type.
//!
//! `AppError` covers the relay's failure modes. Each variant self-describes
//! how it should surface over HTTP via the `ErrorMetadata` trait, so handlers
//! can render a consistent envelope without per-call-site status mapping.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected errors like validation failures
    Debug,
    /// Recoverable issues like upstream rate limits
    Warn,
    /// Unexpected failures
    Error,
}

/// How an error should be presented over HTTP.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g. "RATE_LIMITED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Upstream rejected request with status {status}: {message}")]
    UpstreamRejected { status: u16, message: String },

    #[error("Upstream unreachable: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata per variant: (http_status, error_code, recoverable, log_level).
fn static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::InvalidInput(_) => (400, "INVALID_INPUT", false, LogLevel::Debug),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, LogLevel::Debug),
        AppError::PayloadTooLarge(_) => (413, "PAYLOAD_TOO_LARGE", false, LogLevel::Debug),
        AppError::RateLimited => (429, "RATE_LIMITED", true, LogLevel::Warn),
        AppError::UpstreamRejected { status, .. } => {
            (*status, "UPSTREAM_REJECTED", true, LogLevel::Warn)
        }
        AppError::Upstream(_) => (502, "UPSTREAM_UNAVAILABLE", true, LogLevel::Error),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
        AppError::InternalWithSource { .. } => (500, "INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::PayloadTooLarge(msg) => msg.clone(),
            AppError::RateLimited => "Rate limit exceeded".to_string(),
            AppError::UpstreamRejected { message, .. } => message.clone(),
            AppError::Upstream(_) => "Upload service unavailable".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_metadata() {
        let err = AppError::InvalidInput("No image provided".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "No image provided");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_rate_limited_metadata() {
        let err = AppError::RateLimited;
        assert_eq!(err.http_status_code(), 429);
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Rate limit exceeded");
    }

    #[test]
    fn test_upstream_rejected_reflects_status() {
        let err = AppError::UpstreamRejected {
            status: 503,
            message: "Failed to upload".to_string(),
        };
        assert_eq!(err.http_status_code(), 503);
        assert_eq!(err.error_code(), "UPSTREAM_REJECTED");
    }

    #[test]
    fn test_internal_hides_details() {
        let err = AppError::Internal("db exploded".to_string());
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(err.log_level(), LogLevel::Error);
    }
}
