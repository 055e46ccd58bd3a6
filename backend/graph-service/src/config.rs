use serde::Deserialize;

/// Graph service configuration, read from the environment.
///
/// Database pool settings (`DATABASE_URL`, `DB_*`) are read separately by
/// `db_pool::DbConfig`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub app_host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deadline for each follow-graph query and directory lookup
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// `postgres` or `memory`
    #[serde(default = "default_storage_backend")]
    pub storage_backend: String,
    /// Comma-separated handles registered at startup with the memory backend
    #[serde(default)]
    pub seed_handles: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_store_timeout_ms() -> u64 {
    resilience::store_config().timeout.duration.as_millis() as u64
}

fn default_storage_backend() -> String {
    "postgres".to_string()
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn store_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.store_timeout_ms)
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
}
