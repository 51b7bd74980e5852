//! Upload forwarding handlers.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use imgrelay_core::models::RelayEnvelope;
use imgrelay_core::AppError;

use crate::error::HttpAppError;
use crate::state::AppState;

/// POST /api/upload
///
/// Accepts a multipart form with an `image` part and forwards it to the
/// remote host. Responds with the `{success, data}` envelope; a request
/// without an `image` part is a 400 with "No image provided".
#[tracing::instrument(skip(state, multipart), fields(operation = "upload"))]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<RelayEnvelope>, HttpAppError> {
    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().unwrap_or("image.jpg").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read image: {}", e)))?;
        image = Some((filename, data));
        break;
    }

    let (filename, data) = image.ok_or_else(|| {
        HttpAppError(AppError::InvalidInput("No image provided".to_string()))
    })?;

    if data.is_empty() {
        return Err(HttpAppError(AppError::InvalidInput(
            "No image provided".to_string(),
        )));
    }

    if data.len() > state.config.max_file_size_bytes {
        return Err(HttpAppError(AppError::PayloadTooLarge(format!(
            "File size exceeds {}MB limit",
            state.config.max_file_size_bytes / 1024 / 1024
        ))));
    }

    let result = state.upstream.upload(data, &filename).await?;
    Ok(Json(RelayEnvelope::ok(result)))
}

/// DELETE /api/upload/{delete_hash}
///
/// Forwards the deletion to the remote host, mirroring its status on
/// refusal.
#[tracing::instrument(skip(state), fields(operation = "delete"))]
pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    Path(delete_hash): Path<String>,
) -> Result<Response, HttpAppError> {
    match state.upstream.delete(&delete_hash).await {
        Ok(()) => Ok(Json(RelayEnvelope {
            success: true,
            data: None,
            error: None,
            details: None,
        })
        .into_response()),
        Err(AppError::UpstreamRejected { status, .. }) => {
            let status =
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            Ok((status, Json(RelayEnvelope::err("Failed to delete image"))).into_response())
        }
        Err(e) => Err(e.into()),
    }
}
