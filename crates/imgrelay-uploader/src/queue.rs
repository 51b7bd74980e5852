//! The upload queue.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures::future::join_all;
use imgrelay_client::ProgressSink;
use imgrelay_core::models::{
    BatchOutcome, HistoryEntry, SourceFile, UploadItem, UploadStatus,
};
use imgrelay_core::util::filename_from_url;
use imgrelay_processing::{FileValidator, ImageProcessor, ProcessingOptions};
use imgrelay_store::HistoryStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::transport::UploadTransport;

#[derive(Debug, Clone, thiserror::Error)]
pub enum QueueError {
    #[error("Upload item not found")]
    NotFound,

    #[error("Upload item is not in an uploadable state")]
    InvalidState,

    #[error("Queue is full ({max} files)")]
    QueueFull { max: usize },
}

/// Queue behavior knobs.
#[derive(Debug, Clone)]
pub struct QueueOptions {
    pub max_queue_files: usize,
    /// When set, images are resized/re-encoded before upload. Processing is
    /// best-effort: a failure falls back to uploading the original bytes.
    pub processing: Option<ProcessingOptions>,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            max_queue_files: 100,
            processing: Some(ProcessingOptions::default()),
        }
    }
}

/// In-memory upload queue backed by an injected transport and history store.
pub struct UploadQueue {
    transport: Arc<dyn UploadTransport>,
    history: Arc<HistoryStore>,
    validator: FileValidator,
    options: QueueOptions,
    items: Arc<Mutex<Vec<UploadItem>>>,
}

impl UploadQueue {
    pub fn new(
        transport: Arc<dyn UploadTransport>,
        history: Arc<HistoryStore>,
        validator: FileValidator,
        options: QueueOptions,
    ) -> Self {
        Self {
            transport,
            history,
            validator,
            options,
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a file to the queue. A file that fails validation still enters the
    /// queue, as a terminal `Error` item carrying the rejection message.
    pub async fn enqueue(&self, source: SourceFile) -> Result<Uuid, QueueError> {
        let mut items = self.items.lock().await;
        if items.len() >= self.options.max_queue_files {
            return Err(QueueError::QueueFull {
                max: self.options.max_queue_files,
            });
        }

        let item = match self.validator.validate(&source) {
            Ok(()) => {
                let preview = make_preview(&source);
                UploadItem::pending(source, preview)
            }
            Err(e) => {
                tracing::debug!(filename = %source.filename, error = %e, "File rejected");
                UploadItem::failed(source, e.to_string())
            }
        };

        let id = item.id;
        items.push(item);
        Ok(id)
    }

    /// Fetch an image by URL and enqueue it. A failed fetch still enters the
    /// queue as a terminal `Error` item, so the caller sees it alongside the
    /// rest of the batch.
    pub async fn enqueue_from_url(&self, url: &str) -> Result<Uuid, QueueError> {
        match self.transport.fetch_image(url).await {
            Ok(source) => self.enqueue(source).await,
            Err(e) => {
                tracing::debug!(url, error = %e, "URL fetch failed");
                let placeholder = SourceFile::new(
                    filename_from_url(url),
                    "application/octet-stream",
                    bytes::Bytes::new(),
                );
                let item = UploadItem::failed(placeholder, e.to_string());
                let id = item.id;
                let mut items = self.items.lock().await;
                if items.len() >= self.options.max_queue_files {
                    return Err(QueueError::QueueFull {
                        max: self.options.max_queue_files,
                    });
                }
                items.push(item);
                Ok(id)
            }
        }
    }

    /// Upload one pending item to its terminal state. Returns that state:
    /// a failed upload is `Ok(UploadStatus::Error)`, not an `Err`.
    pub async fn upload(&self, id: Uuid) -> Result<UploadStatus, QueueError> {
        let source = {
            let mut items = self.items.lock().await;
            let item = items
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or(QueueError::NotFound)?;
            if item.status != UploadStatus::Pending {
                return Err(QueueError::InvalidState);
            }
            item.status = UploadStatus::Uploading;
            item.progress = 0;
            item.source.clone()
        };

        let file = self.maybe_process(source).await;

        let (sink, mut rx) = ProgressSink::channel();
        let watcher_items = Arc::clone(&self.items);
        let watcher = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let percent = *rx.borrow();
                let mut items = watcher_items.lock().await;
                if let Some(item) = items.iter_mut().find(|i| i.id == id) {
                    if item.status == UploadStatus::Uploading {
                        item.progress = percent;
                    }
                }
            }
        });

        let outcome = self.transport.upload(&file, &sink).await;
        drop(sink);
        let _ = watcher.await;

        let mut items = self.items.lock().await;
        let item = match items.iter_mut().find(|i| i.id == id) {
            Some(item) => item,
            None => {
                // Removed while in flight; the completion is discarded.
                tracing::debug!(%id, "Upload completed for a removed item");
                return Err(QueueError::NotFound);
            }
        };

        match outcome {
            Ok(result) => {
                item.status = UploadStatus::Success;
                item.progress = 100;
                item.error = None;
                let entry = HistoryEntry::from_success(item, &result);
                item.result = Some(result);
                drop(items);
                self.history.add(entry).await;
                Ok(UploadStatus::Success)
            }
            Err(e) => {
                tracing::warn!(%id, filename = %item.source.filename, error = %e, "Upload failed");
                item.status = UploadStatus::Error;
                item.error = Some(e.to_string());
                Ok(UploadStatus::Error)
            }
        }
    }

    /// Upload every pending item concurrently. Each item settles on its own;
    /// the outcome counts how many ended in `Success` out of those started.
    pub async fn upload_all(&self) -> BatchOutcome {
        let ids: Vec<Uuid> = {
            let items = self.items.lock().await;
            items
                .iter()
                .filter(|i| i.status == UploadStatus::Pending)
                .map(|i| i.id)
                .collect()
        };

        let results = join_all(ids.iter().map(|&id| self.upload(id))).await;
        let successful = results
            .iter()
            .filter(|r| matches!(r, Ok(UploadStatus::Success)))
            .count();

        BatchOutcome {
            successful,
            total: ids.len(),
        }
    }

    /// Put a failed item back to `Pending` and upload it again. An item that
    /// fails validation stays terminal: retrying cannot make the file itself
    /// acceptable.
    pub async fn retry(&self, id: Uuid) -> Result<UploadStatus, QueueError> {
        {
            let mut items = self.items.lock().await;
            let item = items
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or(QueueError::NotFound)?;
            if item.status != UploadStatus::Error {
                return Err(QueueError::InvalidState);
            }
            if self.validator.validate(&item.source).is_err() {
                return Err(QueueError::InvalidState);
            }
            item.status = UploadStatus::Pending;
            item.error = None;
            item.progress = 0;
        }
        self.upload(id).await
    }

    /// Remove an item from the queue. History entries are unaffected, and a
    /// removal during an in-flight upload discards that upload's completion.
    pub async fn remove(&self, id: Uuid) {
        let mut items = self.items.lock().await;
        items.retain(|i| i.id != id);
    }

    /// Drop all successfully uploaded items, keeping pending and failed ones.
    pub async fn clear_completed(&self) {
        let mut items = self.items.lock().await;
        items.retain(|i| i.status != UploadStatus::Success);
    }

    pub async fn clear(&self) {
        let mut items = self.items.lock().await;
        items.clear();
    }

    /// Snapshot of the queue in insertion order.
    pub async fn items(&self) -> Vec<UploadItem> {
        self.items.lock().await.clone()
    }

    pub async fn item(&self, id: Uuid) -> Option<UploadItem> {
        self.items.lock().await.iter().find(|i| i.id == id).cloned()
    }

    /// Resize/re-encode if processing is configured, falling back to the
    /// original bytes on any failure.
    async fn maybe_process(&self, source: SourceFile) -> SourceFile {
        let options = match &self.options.processing {
            Some(options) => options.clone(),
            None => return source,
        };

        let bytes = source.bytes.clone();
        let processed = tokio::task::spawn_blocking(move || {
            ImageProcessor::process(&bytes, &options)
        })
        .await;

        match processed {
            Ok(Ok(image)) => SourceFile::new(source.filename, image.content_type, image.bytes),
            Ok(Err(e)) => {
                tracing::warn!(filename = %source.filename, error = %e, "Processing failed, uploading original");
                source
            }
            Err(e) => {
                tracing::warn!(filename = %source.filename, error = %e, "Processing task failed, uploading original");
                source
            }
        }
    }
}

/// Inline data-URL preview for display; not persisted to history.
fn make_preview(source: &SourceFile) -> Option<String> {
    if !source.content_type.to_lowercase().starts_with("image/") {
        return None;
    }
    Some(format!(
        "data:{};base64,{}",
        source.content_type,
        BASE64.encode(&source.bytes)
    ))
}
