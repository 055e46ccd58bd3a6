/// Resilience helpers shared by the social backend services
///
/// Every store and directory call goes through one of these wrappers so that a
/// slow dependency surfaces as a typed, retryable failure instead of a hung request.
///
/// - **Timeout**: Enforces a deadline on a single I/O call
/// - **Retry**: Exponential backoff with jitter for transient failures
/// - **Presets**: Tuned settings for store queries and startup
///
/// # Example: store query with a deadline
///
/// ```rust,no_run
/// use resilience::{presets, with_timeout};
///
/// #[tokio::main]
/// async fn main() {
///     let config = presets::store_config();
///
///     let result = with_timeout(config.timeout.duration, async {
///         // Your database query
///         Ok::<_, String>(())
///     })
///     .await;
/// }
/// ```
pub mod presets;
pub mod retry;
pub mod timeout;

pub use presets::{startup_config, store_config, ServiceConfig};
pub use retry::{with_retry, Backoff, RetryConfig, RetryError};
pub use timeout::{with_timeout, TimeoutConfig, TimeoutError};
