//! Image proxy for hosts that refuse cross-origin reads.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use imgrelay_core::models::RelayEnvelope;
use imgrelay_core::AppError;
use serde::Deserialize;

use crate::error::HttpAppError;
use crate::state::AppState;

const PROXY_USER_AGENT: &str = "Mozilla/5.0 (compatible; imgrelay/1.0)";
const CACHE_CONTROL: &str = "public, max-age=3600";

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    url: Option<String>,
}

/// GET /api/proxy-image?url=...
///
/// Fetches the URL server-side and streams the body back with its original
/// content type. Only `image/*` responses pass through; upstream fetch
/// failures mirror the upstream status.
#[tracing::instrument(skip(state), fields(operation = "proxy_image"))]
pub async fn proxy_image(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProxyQuery>,
) -> Result<Response, HttpAppError> {
    let url = query
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| HttpAppError(AppError::InvalidInput("No URL provided".to_string())))?;

    let parsed = reqwest::Url::parse(&url)
        .map_err(|_| AppError::InvalidInput("Invalid URL".to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(HttpAppError(AppError::InvalidInput(
            "Invalid URL".to_string(),
        )));
    }

    let response = state
        .fetch_client
        .get(parsed)
        .header(header::USER_AGENT, PROXY_USER_AGENT)
        .send()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let status = StatusCode::from_u16(status.as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return Ok((
            status,
            Json(RelayEnvelope::err(format!(
                "Failed to fetch image: {}",
                status.canonical_reason().unwrap_or("error")
            ))),
        )
            .into_response());
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.starts_with("image/") {
        return Err(HttpAppError(AppError::InvalidInput(
            "URL does not point to an image".to_string(),
        )));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    tracing::debug!(url = %url, bytes = body.len(), content_type = %content_type, "Image proxied");

    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL));
    Ok(response)
}
