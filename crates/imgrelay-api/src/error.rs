//! HTTP error response conversion.
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`; `AppError`
//! values convert with `?` and render as the relay's JSON envelope with a
//! status taken from the error's metadata.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use imgrelay_core::models::RelayEnvelope;
use imgrelay_core::{AppError, ErrorMetadata, LogLevel};

/// Wrapper type for AppError to implement IntoResponse. Needed because of
/// Rust's orphan rules: IntoResponse and AppError are both external here.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

fn log_error(error: &AppError) {
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(error = %error, code = error.error_code(), "Request failed"),
        LogLevel::Warn => tracing::warn!(error = %error, code = error.error_code(), "Request failed"),
        LogLevel::Error => tracing::error!(error = %error, code = error.error_code(), "Request failed"),
    }
}

/// Envelope body for an error. Upstream failures keep a stable `error` field
/// and explain themselves in `details`.
fn envelope(error: &AppError) -> RelayEnvelope {
    match error {
        AppError::RateLimited => {
            RelayEnvelope::err_with_details("Failed to upload image", "Rate limit exceeded")
        }
        AppError::UpstreamRejected { message, .. } => {
            RelayEnvelope::err_with_details("Failed to upload image", message.clone())
        }
        AppError::Upstream(_) => {
            RelayEnvelope::err_with_details("Failed to upload image", "Upload service unavailable")
        }
        other => RelayEnvelope::err(other.client_message()),
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let error = &self.0;
        log_error(error);

        let status = StatusCode::from_u16(error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(envelope(error))).into_response()
    }
}
