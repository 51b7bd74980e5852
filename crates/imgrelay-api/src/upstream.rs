//! Client for the remote image host.
//!
//! Uploads are forwarded as base64 form fields with the credential in an
//! `Authorization: Client-ID` header, which is the one secret the relay
//! exists to keep off the client side.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use imgrelay_core::models::UploadResult;
use imgrelay_core::{AppError, Config};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct HostResponse {
    success: bool,
    data: Option<HostData>,
}

#[derive(Debug, Deserialize)]
struct HostData {
    id: String,
    link: String,
    deletehash: Option<String>,
}

/// HTTP client bound to the remote host API.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    api_url: String,
    client_id: String,
    delete_page_url: String,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            api_url: config.remote_api_url.trim_end_matches('/').to_string(),
            client_id: config.remote_client_id.clone(),
            delete_page_url: config.remote_delete_page_url.trim_end_matches('/').to_string(),
        })
    }

    /// Forward one image to the remote host. `429` is singled out so the
    /// envelope can tell callers to back off; all other host failures are
    /// mirrored with their upstream status.
    pub async fn upload(
        &self,
        image: Bytes,
        filename: &str,
    ) -> Result<UploadResult, AppError> {
        let size = image.len() as u64;
        let form = reqwest::multipart::Form::new()
            .text("image", BASE64.encode(&image))
            .text("type", "base64");

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Client-ID {}", self.client_id))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "Remote host rejected upload");
            if status.as_u16() == 429 {
                return Err(AppError::RateLimited);
            }
            return Err(AppError::UpstreamRejected {
                status: status.as_u16(),
                message: "Upload service unavailable".to_string(),
            });
        }

        let host: HostResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid host response: {}", e)))?;

        let data = match (host.success, host.data) {
            (true, Some(data)) => data,
            _ => return Err(AppError::Upstream("Host reported failure".to_string())),
        };

        tracing::info!(id = %data.id, filename, size, "Image uploaded to remote host");

        Ok(UploadResult {
            delete_url: data
                .deletehash
                .as_ref()
                .map(|h| format!("{}/{}", self.delete_page_url, h)),
            delete_hash: data.deletehash,
            id: data.id,
            url: data.link,
            filename: filename.to_string(),
            size,
        })
    }

    /// Delete a previously uploaded image on the remote host.
    pub async fn delete(&self, delete_hash: &str) -> Result<(), AppError> {
        let response = self
            .client
            .delete(format!("{}/{}", self.api_url, delete_hash))
            .header("Authorization", format!("Client-ID {}", self.client_id))
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), delete_hash, "Remote host refused deletion");
            if status.as_u16() == 429 {
                return Err(AppError::RateLimited);
            }
            return Err(AppError::UpstreamRejected {
                status: status.as_u16(),
                message: "Failed to delete image".to_string(),
            });
        }

        Ok(())
    }
}
