//! Domain models

mod history;
mod upload;

pub use history::HistoryEntry;
pub use upload::{
    BatchOutcome, RelayEnvelope, SourceFile, UploadItem, UploadResult, UploadStatus,
};
