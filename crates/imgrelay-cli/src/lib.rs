use chrono::{TimeZone, Utc};
use imgrelay_core::models::HistoryEntry;
use imgrelay_core::util::format_file_size;

/// Declared MIME type from a file extension; the validator does the rest.
pub fn content_type_from_path(path: &std::path::Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// One history entry as a display line: local time, size, name, URL.
pub fn format_entry(entry: &HistoryEntry) -> String {
    let when = Utc
        .timestamp_millis_opt(entry.timestamp)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}  {:>10}  {}  {}",
        when,
        format_file_size(entry.size),
        entry.filename,
        entry.url
    )
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}
