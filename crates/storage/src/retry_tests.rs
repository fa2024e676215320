use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[tokio::test(start_paused = true)]
async fn succeeds_without_retry_on_first_try() {
    let cfg = RetryConfig::default();
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = calls.clone();

    let result: Result<u32, BackendError> = retry_transient(&cfg, &cancel, move || {
        let calls = calls_clone.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(42)
        }
    })
    .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn retries_transient_then_succeeds() {
    let cfg = RetryConfig { max_attempts: 3, base_delay: Duration::from_millis(10) };
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = calls.clone();

    let result: Result<u32, BackendError> = retry_transient(&cfg, &cancel, move || {
        let calls = calls_clone.clone();
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(BackendError::Transient("timeout".into()))
            } else {
                Ok(7)
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn permanent_error_propagates_on_first_try() {
    let cfg = RetryConfig::default();
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = calls.clone();

    let result: Result<u32, BackendError> = retry_transient(&cfg, &cancel, move || {
        let calls = calls_clone.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BackendError::Permanent("duplicate key".into()))
        }
    })
    .await;

    assert!(matches!(result, Err(BackendError::Permanent(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausts_max_attempts_and_returns_last_transient_error() {
    let cfg = RetryConfig { max_attempts: 3, base_delay: Duration::from_millis(5) };
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = calls.clone();

    let result: Result<u32, BackendError> = retry_transient(&cfg, &cancel, move || {
        let calls = calls_clone.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BackendError::Transient("connection reset".into()))
        }
    })
    .await;

    assert!(matches!(result, Err(BackendError::Transient(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn cancellation_aborts_between_retries() {
    let cfg = RetryConfig { max_attempts: 5, base_delay: Duration::from_secs(1) };
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    let result: Result<u32, BackendError> = retry_transient(&cfg, &cancel, move || {
        cancel_clone.cancel();
        async move { Err(BackendError::Transient("down".into())) }
    })
    .await;

    assert!(matches!(result, Err(BackendError::Cancelled)));
}

#[test]
fn backoff_grows_exponentially_with_bounded_jitter() {
    let cfg = RetryConfig { max_attempts: 10, base_delay: Duration::from_millis(200) };
    for attempt in 1..=6u32 {
        let base = cfg.base_delay.saturating_mul(1u32 << (attempt - 1));
        let jitter_ceiling = base.min(Duration::from_millis(1000));
        let delay = backoff_with_jitter(&cfg, attempt);
        assert!(delay >= base, "attempt {attempt}: delay {delay:?} below base {base:?}");
        assert!(
            delay <= base + jitter_ceiling,
            "attempt {attempt}: delay {delay:?} exceeds base+jitter {:?}",
            base + jitter_ceiling
        );
    }
}

proptest::proptest! {
    #[test]
    fn jitter_never_exceeds_one_second_ceiling(attempt in 1u32..30) {
        let cfg = RetryConfig { max_attempts: 30, base_delay: Duration::from_millis(200) };
        let base = cfg.base_delay.saturating_mul(1u32 << attempt.saturating_sub(1).min(20));
        let delay = backoff_with_jitter(&cfg, attempt);
        let max_jitter = base.min(Duration::from_millis(1000));
        proptest::prop_assert!(delay <= base + max_jitter);
        proptest::prop_assert!(delay >= base);
    }
}
