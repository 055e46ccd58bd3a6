/// Integration tests for resilience library
use resilience::{
    presets,
    retry::{with_retry, RetryConfig},
    timeout::{with_timeout, TimeoutError},
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ==================== Timeout + Retry ====================

#[tokio::test]
async fn test_retry_around_timed_out_calls() {
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    let config = RetryConfig {
        max_retries: 3,
        initial_backoff: Duration::from_millis(5),
        jitter: false,
        ..Default::default()
    };

    let result = with_retry(config, move || {
        let count = counter_clone.fetch_add(1, Ordering::SeqCst);
        async move {
            with_timeout(Duration::from_millis(20), async move {
                if count == 0 {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                }
                "connected"
            })
            .await
        }
    })
    .await;

    assert_eq!(result.unwrap(), "connected");
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_exhausted_retry_reports_timeout() {
    let config = RetryConfig {
        max_retries: 1,
        initial_backoff: Duration::from_millis(1),
        jitter: false,
        ..Default::default()
    };

    let result = with_retry(config, || async {
        with_timeout(Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
        })
        .await
    })
    .await;

    assert!(matches!(
        result.unwrap_err().into_last(),
        TimeoutError::Elapsed(_)
    ));
}

// ==================== Presets ====================

#[test]
fn test_presets_are_sane() {
    let store = presets::store_config();
    assert!(store.retry.is_some());
    assert_eq!(store.timeout.duration, Duration::from_secs(5));

    let startup = presets::startup_config();
    let retry = startup.retry.expect("startup retries connections");
    assert_eq!(retry.max_retries, 5);
}

#[test]
fn test_store_backoff_schedule_is_bounded() {
    let retry = presets::store_config().retry.unwrap();
    let delays: Vec<Duration> = retry.backoff().collect();

    assert_eq!(delays.len(), retry.max_retries as usize);
    // jitter is ±30% around a value capped at max_backoff
    for delay in delays {
        assert!(delay <= retry.max_backoff.mul_f64(1.3));
    }
}

#[test]
fn test_timeout_passes_fast_futures_through() {
    let value = tokio_test::block_on(with_timeout(Duration::from_millis(50), async { 7 }));
    assert_eq!(value.unwrap(), 7);
}
