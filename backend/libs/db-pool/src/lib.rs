//! PostgreSQL pool shared by every service
//!
//! All three services point at the same database; each one builds its own
//! pool from `DATABASE_URL` and the `DB_*` tuning variables.

mod env_utils;
mod pagination;

pub use env_utils::{parse_env_required, parse_env_with_default};
pub use pagination::{PageQuery, Pagination, MAX_PAGE_SIZE};

use resilience::{presets, with_retry, with_timeout};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// Pool sizing and timeouts
#[derive(Clone)]
pub struct DbConfig {
    /// Used only to label log lines
    pub service_name: String,
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Deadline for the `SELECT 1` run after connecting
    pub connect_timeout_secs: u64,
    /// Deadline for checking a connection out of the pool
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("service_name", &self.service_name)
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish_non_exhaustive()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".to_string(),
            database_url: String::new(),
            max_connections: 20,
            min_connections: 5,
            connect_timeout_secs: 5,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl DbConfig {
    /// Read `DATABASE_URL` (required) and the optional `DB_*` overrides.
    pub fn from_env(service_name: &str) -> Result<Self, String> {
        let d = Self::default();
        Ok(Self {
            service_name: service_name.to_string(),
            database_url: parse_env_required("DATABASE_URL")?,
            max_connections: parse_env_with_default("DB_MAX_CONNECTIONS", d.max_connections),
            min_connections: parse_env_with_default("DB_MIN_CONNECTIONS", d.min_connections),
            connect_timeout_secs: parse_env_with_default(
                "DB_CONNECT_TIMEOUT_SECS",
                d.connect_timeout_secs,
            ),
            acquire_timeout_secs: parse_env_with_default(
                "DB_ACQUIRE_TIMEOUT_SECS",
                d.acquire_timeout_secs,
            ),
            idle_timeout_secs: parse_env_with_default("DB_IDLE_TIMEOUT_SECS", d.idle_timeout_secs),
            max_lifetime_secs: parse_env_with_default("DB_MAX_LIFETIME_SECS", d.max_lifetime_secs),
        })
    }

    pub fn log_config(&self) {
        info!(
            service = %self.service_name,
            max_connections = self.max_connections,
            min_connections = self.min_connections,
            acquire_timeout_secs = self.acquire_timeout_secs,
            idle_timeout_secs = self.idle_timeout_secs,
            max_lifetime_secs = self.max_lifetime_secs,
            "Database pool configuration"
        );
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(self.max_lifetime_secs))
            .test_before_acquire(true)
    }
}

/// Connect and verify with `SELECT 1`, retrying on the startup schedule so a
/// database that comes up after the service does not abort boot.
pub async fn create_pool(config: DbConfig) -> Result<PgPool, sqlx::Error> {
    let retry = presets::startup_config().retry.unwrap_or_default();

    with_retry(retry, || connect_and_verify(&config))
        .await
        .map_err(|e| e.into_last())
}

async fn connect_and_verify(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    let pool = config.pool_options().connect(&config.database_url).await?;

    let verify_timeout = Duration::from_secs(config.connect_timeout_secs);
    match with_timeout(verify_timeout, sqlx::query("SELECT 1").execute(&pool)).await {
        Ok(Ok(_)) => {
            info!(service = %config.service_name, "Database pool ready");
            Ok(pool)
        }
        Ok(Err(e)) => {
            warn!(service = %config.service_name, error = %e, "Database verification failed");
            Err(e)
        }
        Err(elapsed) => {
            warn!(service = %config.service_name, error = %elapsed, "Database verification timed out");
            Err(sqlx::Error::PoolTimedOut)
        }
    }
}
