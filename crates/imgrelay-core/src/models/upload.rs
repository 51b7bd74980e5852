use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One file's position in the upload pipeline.
///
/// `Pending` and `Uploading` are transient; `Success` and `Error` are terminal
/// until the item is retried (`Error -> Pending`) or removed from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Success,
    Error,
}

impl UploadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Success | UploadStatus::Error)
    }
}

/// The original binary payload with its declared type and name.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl SourceFile {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Normalized result of a successful remote upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_hash: Option<String>,
    pub filename: String,
    pub size: u64,
}

/// An in-flight upload owned by the orchestrator's queue.
///
/// Exactly one of `error`/`result` is populated, and only when `status` is the
/// corresponding terminal state. `progress` is meaningful only while
/// `Uploading`.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub id: Uuid,
    pub source: SourceFile,
    /// Inline-encoded preview (data URL), kept in memory only.
    pub preview: Option<String>,
    pub status: UploadStatus,
    pub progress: u8,
    pub error: Option<String>,
    pub result: Option<UploadResult>,
}

impl UploadItem {
    /// New item in `Pending`, ready to upload.
    pub fn pending(source: SourceFile, preview: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            preview,
            status: UploadStatus::Pending,
            progress: 0,
            error: None,
            result: None,
        }
    }

    /// New item that failed before entering the pipeline (validation or fetch
    /// failure). Terminal.
    pub fn failed(source: SourceFile, error: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            preview: None,
            status: UploadStatus::Error,
            progress: 0,
            error: Some(error.into()),
            result: None,
        }
    }
}

/// Aggregate outcome of a batch upload: how many of the started items
/// settled successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub successful: usize,
    pub total: usize,
}

/// JSON envelope returned by the relay endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<UploadResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl RelayEnvelope {
    pub fn ok(data: UploadResult) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            details: None,
        }
    }

    pub fn err_with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            details: Some(details.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminal() {
        assert!(!UploadStatus::Pending.is_terminal());
        assert!(!UploadStatus::Uploading.is_terminal());
        assert!(UploadStatus::Success.is_terminal());
        assert!(UploadStatus::Error.is_terminal());
    }

    #[test]
    fn test_pending_item_has_no_outcome() {
        let source = SourceFile::new("a.png", "image/png", Bytes::from_static(b"x"));
        let item = UploadItem::pending(source, None);
        assert_eq!(item.status, UploadStatus::Pending);
        assert!(item.error.is_none());
        assert!(item.result.is_none());
        assert_eq!(item.progress, 0);
    }

    #[test]
    fn test_failed_item_is_terminal() {
        let source = SourceFile::new("a.txt", "text/plain", Bytes::from_static(b"x"));
        let item = UploadItem::failed(source, "File type text/plain is not supported");
        assert_eq!(item.status, UploadStatus::Error);
        assert!(item.error.is_some());
        assert!(item.result.is_none());
    }

    #[test]
    fn test_envelope_serialization_shape() {
        let env = RelayEnvelope::err_with_details("Failed to upload", "Rate limit exceeded");
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["details"], "Rate limit exceeded");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_upload_result_camel_case() {
        let result = UploadResult {
            id: "abc".to_string(),
            url: "https://i.example.com/abc.jpg".to_string(),
            delete_url: Some("https://example.com/delete/xyz".to_string()),
            delete_hash: Some("xyz".to_string()),
            filename: "photo.jpg".to_string(),
            size: 1234,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["deleteUrl"], "https://example.com/delete/xyz");
        assert_eq!(json["deleteHash"], "xyz");
    }
}
