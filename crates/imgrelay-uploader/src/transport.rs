//! Transport seam between the queue and the relay.

use async_trait::async_trait;
use imgrelay_client::{ClientError, ProgressSink, RelayClient};
use imgrelay_core::models::{SourceFile, UploadResult};

/// What the queue needs from the network: upload, delete, and URL fetch.
/// `RelayClient` is the production implementation; tests substitute their
/// own.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn upload(
        &self,
        file: &SourceFile,
        progress: &ProgressSink,
    ) -> Result<UploadResult, ClientError>;

    async fn delete(&self, delete_hash: &str) -> Result<(), ClientError>;

    async fn fetch_image(&self, url: &str) -> Result<SourceFile, ClientError>;
}

#[async_trait]
impl UploadTransport for RelayClient {
    async fn upload(
        &self,
        file: &SourceFile,
        progress: &ProgressSink,
    ) -> Result<UploadResult, ClientError> {
        RelayClient::upload(self, file, progress).await
    }

    async fn delete(&self, delete_hash: &str) -> Result<(), ClientError> {
        RelayClient::delete(self, delete_hash).await
    }

    async fn fetch_image(&self, url: &str) -> Result<SourceFile, ClientError> {
        RelayClient::fetch_image(self, url).await
    }
}
