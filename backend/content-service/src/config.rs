use resilience::{presets, RetryConfig};
use serde::Deserialize;
use std::time::Duration;

/// Content service configuration, read from the environment.
///
/// Database pool settings (`DATABASE_URL`, `DB_*`) are read by
/// `db_pool::DbConfig` and object storage settings (`S3_*`) by
/// `s3_utils::S3Config`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub app_host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// `postgres` or `memory`
    #[serde(default = "default_storage_backend")]
    pub storage_backend: String,
    #[serde(default)]
    pub seed_handles: Option<String>,
    /// How many times a write that lost a version race is re-applied
    #[serde(default = "default_write_retry_limit")]
    pub write_retry_limit: u32,
    /// When false, inline uploads are accepted but never stored
    #[serde(default = "default_media_uploads_enabled")]
    pub media_uploads_enabled: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_store_timeout_ms() -> u64 {
    resilience::store_config().timeout.duration.as_millis() as u64
}

fn default_storage_backend() -> String {
    "postgres".to_string()
}

fn default_write_retry_limit() -> u32 {
    5
}

fn default_media_uploads_enabled() -> bool {
    true
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn uses_memory_backend(&self) -> bool {
        self.storage_backend.eq_ignore_ascii_case("memory")
    }

    pub fn seed_handles(&self) -> Vec<String> {
        self.seed_handles
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Backoff schedule for optimistic post writes.
    pub fn write_retry(&self) -> RetryConfig {
        let mut retry = presets::store_config().retry.unwrap_or_default();
        retry.max_retries = self.write_retry_limit;
        retry
    }
}
