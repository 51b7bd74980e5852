use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{UploadItem, UploadResult};

/// Durable record of a completed upload.
///
/// Created exactly once when an item transitions to `Success` and persisted by
/// the history store. Independent of the in-memory `UploadItem` that produced
/// it: removing the item from the queue does not remove the entry. Previews
/// are deliberately not carried over; persisted entries stay small so more of
/// them fit within the storage budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub filename: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_url: Option<String>,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
    /// Original file size in bytes.
    pub size: u64,
}

impl HistoryEntry {
    /// Build the entry for a successful upload.
    pub fn from_success(item: &UploadItem, result: &UploadResult) -> Self {
        Self {
            id: item.id.to_string(),
            filename: item.source.filename.clone(),
            url: result.url.clone(),
            delete_url: result.delete_url.clone(),
            timestamp: Utc::now().timestamp_millis(),
            size: item.source.size() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceFile;
    use bytes::Bytes;

    #[test]
    fn test_from_success_copies_result_url() {
        let source = SourceFile::new("cat.png", "image/png", Bytes::from(vec![0u8; 64]));
        let item = UploadItem::pending(source, Some("data:image/png;base64,...".to_string()));
        let result = UploadResult {
            id: "r1".to_string(),
            url: "https://i.example.com/r1.png".to_string(),
            delete_url: None,
            delete_hash: None,
            filename: "cat.png".to_string(),
            size: 64,
        };

        let entry = HistoryEntry::from_success(&item, &result);
        assert_eq!(entry.url, result.url);
        assert_eq!(entry.filename, "cat.png");
        assert_eq!(entry.size, 64);
        assert_eq!(entry.id, item.id.to_string());
    }

    #[test]
    fn test_serialized_entry_has_no_preview_field() {
        let entry = HistoryEntry {
            id: "e1".to_string(),
            filename: "a.jpg".to_string(),
            url: "https://i.example.com/a.jpg".to_string(),
            delete_url: Some("https://example.com/delete/h".to_string()),
            timestamp: 1_700_000_000_000,
            size: 10,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("preview").is_none());
        assert!(json.get("thumbnail").is_none());
        assert_eq!(json["deleteUrl"], "https://example.com/delete/h");
    }
}
