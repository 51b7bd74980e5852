//! HTTP client for the relay server.
//!
//! Uploads go through the relay (which holds the remote host credential), so
//! this client only ever talks to our own endpoints: multipart upload with
//! streamed progress, deletion by delete-hash, and image fetching with a
//! proxy fallback for hosts that refuse cross-origin reads.

pub mod progress;

use bytes::Bytes;
use futures::stream;
use imgrelay_core::models::{RelayEnvelope, SourceFile, UploadResult};
use imgrelay_core::util::filename_from_url;
use reqwest::Body;
use std::time::Duration;

pub use progress::ProgressSink;

const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Client-side failures, separated by what the caller can do about them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure; retriable.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    /// The relay (or the remote host behind it) refused the request.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The relay answered with something we could not interpret.
    #[error("Unexpected response: {0}")]
    Protocol(String),

    #[error("URL does not point to an image: {0}")]
    NotAnImage(String),
}

/// HTTP client bound to one relay instance.
#[derive(Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload one file through the relay, reporting progress as the body is
    /// streamed out. The sink lands on 100 once the relay has accepted the
    /// upload.
    pub async fn upload(
        &self,
        file: &SourceFile,
        progress: &ProgressSink,
    ) -> Result<UploadResult, ClientError> {
        let total = file.size() as u64;
        let chunks: Vec<Bytes> = file
            .bytes
            .chunks(UPLOAD_CHUNK_BYTES)
            .map(Bytes::copy_from_slice)
            .collect();

        let sink = progress.clone();
        let mut sent: u64 = 0;
        let body_stream = stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            sink.report_bytes(sent, total);
            Ok::<Bytes, std::io::Error>(chunk)
        }));

        let part = reqwest::multipart::Part::stream_with_length(
            Body::wrap_stream(body_stream),
            total,
        )
        .file_name(file.filename.clone())
        .mime_str(&file.content_type)
        .map_err(|e| ClientError::Protocol(format!("Invalid content type: {}", e)))?;

        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self
            .client
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let result = parse_envelope(status, &body)?;
        progress.finish();

        tracing::debug!(
            filename = %file.filename,
            bytes = total,
            url = %result.url,
            "Upload accepted by relay"
        );
        Ok(result)
    }

    /// Delete a previously uploaded image via its delete-hash.
    pub async fn delete(&self, delete_hash: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(format!("{}/api/upload/{}", self.base_url, delete_hash))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status.as_u16() == 429 {
            return Err(ClientError::RateLimited);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    /// Fetch an image by URL for enqueueing. Tries the URL directly first,
    /// then falls back to the relay's proxy endpoint for hosts that refuse
    /// the direct read.
    pub async fn fetch_image(&self, url: &str) -> Result<SourceFile, ClientError> {
        match self.fetch_direct(url).await {
            Ok(file) => Ok(file),
            Err(e) => {
                tracing::debug!(url, error = %e, "Direct fetch failed, using proxy");
                self.fetch_via_proxy(url).await
            }
        }
    }

    async fn fetch_direct(&self, url: &str) -> Result<SourceFile, ClientError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::Rejected {
                status: response.status().as_u16(),
                message: format!("Fetch failed with status {}", response.status()),
            });
        }
        self.into_source_file(url, response).await
    }

    async fn fetch_via_proxy(&self, url: &str) -> Result<SourceFile, ClientError> {
        let response = self
            .client
            .get(format!("{}/api/proxy-image", self.base_url))
            .query(&[("url", url)])
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        self.into_source_file(url, response).await
    }

    async fn into_source_file(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> Result<SourceFile, ClientError> {
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.starts_with("image/") {
            return Err(ClientError::NotAnImage(url.to_string()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(SourceFile::new(filename_from_url(url), content_type, bytes))
    }
}

/// Interpret a relay response. `429` maps to `RateLimited` before the body is
/// consulted; everything else is decided by the JSON envelope.
fn parse_envelope(status: u16, body: &[u8]) -> Result<UploadResult, ClientError> {
    if status == 429 {
        return Err(ClientError::RateLimited);
    }

    let envelope: RelayEnvelope = serde_json::from_slice(body)
        .map_err(|e| ClientError::Protocol(format!("Invalid relay response: {}", e)))?;

    if envelope.success {
        return envelope
            .data
            .ok_or_else(|| ClientError::Protocol("Success response without data".to_string()));
    }

    let message = envelope
        .details
        .or(envelope.error)
        .unwrap_or_else(|| "Upload failed".to_string());
    Err(ClientError::Rejected { status, message })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_body() -> Vec<u8> {
        serde_json::to_vec(&RelayEnvelope::ok(UploadResult {
            id: "abc".to_string(),
            url: "https://i.example.com/abc.jpg".to_string(),
            delete_url: Some("https://example.com/delete/xyz".to_string()),
            delete_hash: Some("xyz".to_string()),
            filename: "photo.jpg".to_string(),
            size: 42,
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_envelope_success() {
        let result = parse_envelope(200, &ok_body()).unwrap();
        assert_eq!(result.id, "abc");
        assert_eq!(result.delete_hash.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_parse_envelope_429_is_rate_limited() {
        let err = parse_envelope(429, b"whatever").unwrap_err();
        assert!(matches!(err, ClientError::RateLimited));
    }

    #[test]
    fn test_parse_envelope_prefers_details_over_error() {
        let body = serde_json::to_vec(&RelayEnvelope::err_with_details(
            "Failed to upload image",
            "Upload service unavailable",
        ))
        .unwrap();
        let err = parse_envelope(502, &body).unwrap_err();
        match err {
            ClientError::Rejected { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Upload service unavailable");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_envelope_malformed_body() {
        let err = parse_envelope(200, b"<html>gateway error</html>").unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[test]
    fn test_parse_envelope_success_without_data() {
        let err = parse_envelope(200, br#"{"success":true}"#).unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }
}
