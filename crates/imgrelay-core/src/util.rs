//! Small shared helpers.

/// Human-readable file size, binary units.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let i = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let i = i.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(i as i32);

    // Two decimals, trailing zeros trimmed.
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", s, UNITS[i])
}

/// Extract a filename from a URL path, falling back to "image.jpg".
pub fn filename_from_url(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let after_scheme = without_query
        .split_once("://")
        .map_or(without_query, |(_, rest)| rest);
    let path = after_scheme.trim_end_matches('/');

    // The first segment is the host; a bare host has no filename.
    match path.split_once('/') {
        Some((_, segments)) => {
            let name = segments.rsplit('/').next().unwrap_or("");
            if name.is_empty() {
                "image.jpg".to_string()
            } else {
                name.to_string()
            }
        }
        None => "image.jpg".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10 MB");
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://example.com/pics/cat.png"),
            "cat.png"
        );
        assert_eq!(
            filename_from_url("https://example.com/pics/cat.png?w=100#frag"),
            "cat.png"
        );
        assert_eq!(filename_from_url("https://example.com/"), "image.jpg");
        assert_eq!(filename_from_url("https://example.com"), "image.jpg");
    }
}
