//! Runtime configuration.
//!
//! All knobs are environment-driven with sensible defaults, including the
//! history-store eviction thresholds, which are deliberately configuration
//! rather than constants.

use std::env;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_MAX_FILE_SIZE_MB: usize = 10;
const DEFAULT_MAX_QUEUE_FILES: usize = 100;
const DEFAULT_PROCESS_QUALITY: f32 = 0.8;
const DEFAULT_PROCESS_MAX_WIDTH: u32 = 1920;
const DEFAULT_PROCESS_MAX_HEIGHT: u32 = 1080;
const DEFAULT_HISTORY_MAX_ITEMS: usize = 100;
const DEFAULT_HISTORY_MAX_STORAGE_BYTES: usize = 2 * 1024 * 1024;
const DEFAULT_HISTORY_EVICTION_CHUNK: usize = 3;
const DEFAULT_REMOTE_API_URL: &str = "https://api.imgur.com/3/image";
const DEFAULT_REMOTE_DELETE_PAGE_URL: &str = "https://imgur.com/delete";
const DEFAULT_RELAY_URL: &str = "http://localhost:4000";

/// Application configuration (relay server and upload pipeline).
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,

    /// Remote image-host API endpoint the relay forwards uploads to.
    pub remote_api_url: String,
    /// Credential held server-side, sent as `Authorization: Client-ID <id>`.
    pub remote_client_id: String,
    /// Base of the human-facing deletion page, delete-hash appended.
    pub remote_delete_page_url: String,
    /// Base URL of the relay itself, used by the client side.
    pub relay_url: String,

    // Upload pipeline
    pub max_file_size_bytes: usize,
    pub accepted_content_types: Vec<String>,
    pub max_queue_files: usize,

    // Image processing
    pub enable_processing: bool,
    pub process_quality: f32,
    pub process_max_width: Option<u32>,
    pub process_max_height: Option<u32>,
    pub process_format: String,

    // History store
    pub history_max_items: usize,
    pub history_max_storage_bytes: usize,
    pub history_eviction_chunk: usize,
    pub history_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| DEFAULT_MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(DEFAULT_MAX_FILE_SIZE_MB);

        let accepted_content_types = env::var("ACCEPTED_CONTENT_TYPES")
            .unwrap_or_else(|_| {
                "image/jpeg,image/jpg,image/png,image/gif,image/webp".to_string()
            })
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment: env::var("ENVIRONMENT")
                .or_else(|_| env::var("APP_ENV"))
                .unwrap_or_else(|_| "development".to_string()),
            remote_api_url: env::var("REMOTE_API_URL")
                .unwrap_or_else(|_| DEFAULT_REMOTE_API_URL.to_string()),
            remote_client_id: env::var("REMOTE_CLIENT_ID").unwrap_or_default(),
            remote_delete_page_url: env::var("REMOTE_DELETE_PAGE_URL")
                .unwrap_or_else(|_| DEFAULT_REMOTE_DELETE_PAGE_URL.to_string()),
            relay_url: env::var("RELAY_URL").unwrap_or_else(|_| DEFAULT_RELAY_URL.to_string()),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            accepted_content_types,
            max_queue_files: parse_env("MAX_QUEUE_FILES", DEFAULT_MAX_QUEUE_FILES),
            enable_processing: env::var("ENABLE_PROCESSING")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            process_quality: parse_env("PROCESS_QUALITY", DEFAULT_PROCESS_QUALITY),
            process_max_width: Some(parse_env("PROCESS_MAX_WIDTH", DEFAULT_PROCESS_MAX_WIDTH)),
            process_max_height: Some(parse_env("PROCESS_MAX_HEIGHT", DEFAULT_PROCESS_MAX_HEIGHT)),
            process_format: env::var("PROCESS_FORMAT").unwrap_or_else(|_| "jpeg".to_string()),
            history_max_items: parse_env("HISTORY_MAX_ITEMS", DEFAULT_HISTORY_MAX_ITEMS),
            history_max_storage_bytes: parse_env(
                "HISTORY_MAX_STORAGE_BYTES",
                DEFAULT_HISTORY_MAX_STORAGE_BYTES,
            ),
            history_eviction_chunk: parse_env(
                "HISTORY_EVICTION_CHUNK",
                DEFAULT_HISTORY_EVICTION_CHUNK,
            ),
            history_path: env::var("HISTORY_PATH").unwrap_or_else(|_| ".imgrelay".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }
        if self.accepted_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ACCEPTED_CONTENT_TYPES must list at least one content type"
            ));
        }
        if !(0.0..=1.0).contains(&self.process_quality) {
            return Err(anyhow::anyhow!(
                "PROCESS_QUALITY must be between 0.0 and 1.0"
            ));
        }
        if self.history_eviction_chunk == 0 {
            return Err(anyhow::anyhow!(
                "HISTORY_EVICTION_CHUNK must be greater than 0"
            ));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_port: DEFAULT_PORT,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            remote_api_url: DEFAULT_REMOTE_API_URL.to_string(),
            remote_client_id: String::new(),
            remote_delete_page_url: DEFAULT_REMOTE_DELETE_PAGE_URL.to_string(),
            relay_url: DEFAULT_RELAY_URL.to_string(),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024,
            accepted_content_types: vec![
                "image/jpeg".to_string(),
                "image/jpg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
            ],
            max_queue_files: DEFAULT_MAX_QUEUE_FILES,
            enable_processing: true,
            process_quality: DEFAULT_PROCESS_QUALITY,
            process_max_width: Some(DEFAULT_PROCESS_MAX_WIDTH),
            process_max_height: Some(DEFAULT_PROCESS_MAX_HEIGHT),
            process_format: "jpeg".to_string(),
            history_max_items: DEFAULT_HISTORY_MAX_ITEMS,
            history_max_storage_bytes: DEFAULT_HISTORY_MAX_STORAGE_BYTES,
            history_eviction_chunk: DEFAULT_HISTORY_EVICTION_CHUNK,
            history_path: ".imgrelay".to_string(),
        }
    }
}

fn parse_env<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_file_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.history_max_items, 100);
        assert_eq!(config.history_max_storage_bytes, 2 * 1024 * 1024);
        assert_eq!(config.history_eviction_chunk, 3);
    }

    #[test]
    fn test_validate_rejects_bad_quality() {
        let config = Config {
            process_quality: 1.5,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_eviction_chunk() {
        let config = Config {
            history_eviction_chunk: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
