//! Fixed-key persistent byte slot.
//!
//! The history store addresses exactly one slot; backends only need to read,
//! overwrite, and clear it.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;

/// Slot operation errors
#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Quota exceeded: {attempted} bytes (capacity: {capacity} bytes)")]
    QuotaExceeded { attempted: usize, capacity: usize },
}

/// A single named storage slot holding one opaque byte payload.
#[async_trait]
pub trait Slot: Send + Sync {
    /// Read the slot. `None` when it has never been written or was cleared.
    async fn read(&self) -> Result<Option<Bytes>, SlotError>;

    /// Overwrite the slot.
    async fn write(&self, data: Bytes) -> Result<(), SlotError>;

    /// Remove the slot's payload entirely.
    async fn clear(&self) -> Result<(), SlotError>;
}

/// File-backed slot: one JSON file named by the slot key under a base
/// directory.
#[derive(Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    /// Create a slot at `base_dir/<key>.json`, creating the directory if
    /// needed.
    pub async fn new(base_dir: impl Into<PathBuf>, key: &str) -> Result<Self, SlotError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).await.map_err(|e| {
            SlotError::WriteFailed(format!(
                "Failed to create storage directory {}: {}",
                base_dir.display(),
                e
            ))
        })?;
        Ok(Self {
            path: base_dir.join(format!("{}.json", key)),
        })
    }
}

#[async_trait]
impl Slot for FileSlot {
    async fn read(&self) -> Result<Option<Bytes>, SlotError> {
        match fs::read(&self.path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SlotError::ReadFailed(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write(&self, data: Bytes) -> Result<(), SlotError> {
        fs::write(&self.path, &data).await.map_err(|e| {
            SlotError::WriteFailed(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }

    async fn clear(&self) -> Result<(), SlotError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SlotError::WriteFailed(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// In-memory slot for tests. An optional byte capacity makes writes fail with
/// `QuotaExceeded`, which exercises the store's degrade path.
#[derive(Default)]
pub struct MemorySlot {
    data: tokio::sync::Mutex<Option<Bytes>>,
    capacity: Option<usize>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: tokio::sync::Mutex::new(None),
            capacity: Some(capacity),
        }
    }
}

#[async_trait]
impl Slot for MemorySlot {
    async fn read(&self) -> Result<Option<Bytes>, SlotError> {
        Ok(self.data.lock().await.clone())
    }

    async fn write(&self, data: Bytes) -> Result<(), SlotError> {
        if let Some(capacity) = self.capacity {
            if data.len() > capacity {
                return Err(SlotError::QuotaExceeded {
                    attempted: data.len(),
                    capacity,
                });
            }
        }
        *self.data.lock().await = Some(data);
        Ok(())
    }

    async fn clear(&self) -> Result<(), SlotError> {
        *self.data.lock().await = None;
        Ok(())
    }
}
