use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8082";
pub const DEFAULT_SESSION_FILE: &str = ".shopadmin/session.json";

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    pub poll_interval: Duration,
    pub max_upload_bytes: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    pub session_file: PathBuf,
    pub timeout: Duration,
    pub batch: BatchConfig,
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = std::env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let session_file = std::env::var("SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE));
        let timeout = std::env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));
        let batch = BatchConfig {
            poll_interval: std::env::var("BATCH_POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_millis(2000)),
            ..BatchConfig::default()
        };
        anyhow::ensure!(!base_url.trim().is_empty(), "API_BASE_URL must not be empty");
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session_file,
            timeout,
            batch,
        })
    }

    pub fn for_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            timeout: Duration::from_secs(30),
            batch: BatchConfig::default(),
        }
    }
}
