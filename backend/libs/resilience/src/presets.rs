/// Preset configurations for the dependencies the services talk to
use crate::retry::RetryConfig;
use crate::timeout::TimeoutConfig;
use std::time::Duration;

/// Configuration bundle for a dependency type
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub timeout: TimeoutConfig,
    pub retry: Option<RetryConfig>,
}

/// Post, message and follow-graph queries
///
/// - Timeout: 5s per call
/// - Retry: short optimistic-write schedule (only version races are retried)
pub fn store_config() -> ServiceConfig {
    ServiceConfig {
        timeout: TimeoutConfig {
            duration: Duration::from_secs(5),
        },
        retry: Some(RetryConfig {
            max_retries: 5,
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            jitter: true,
        }),
    }
}

/// Connecting to PostgreSQL at process start
///
/// - Timeout: 10s per attempt
/// - Retry: 5 attempts, up to 10s apart
pub fn startup_config() -> ServiceConfig {
    ServiceConfig {
        timeout: TimeoutConfig {
            duration: Duration::from_secs(10),
        },
        retry: Some(RetryConfig {
            max_retries: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }),
    }
}
