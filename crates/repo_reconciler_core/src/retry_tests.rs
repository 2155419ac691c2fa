use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
    }
}

#[tokio::test]
async fn test_succeeds_immediately() {
    let result = fast_policy(3).run("noop", || async { Ok::<_, Error>(42) }).await;

    assert_eq!(result, Ok(42));
}

#[tokio::test]
async fn test_retries_transient_failures() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();

    let result = fast_policy(3)
        .run("flaky", move || {
            let counter = counter.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if count < 3 {
                    Err(Error::RateLimitExceeded)
                } else {
                    Ok(count)
                }
            }
        })
        .await;

    assert_eq!(result, Ok(3));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();

    let result: Result<(), Error> = fast_policy(2)
        .run("down", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::ServerError {
                    status: 502,
                    message: "Bad Gateway".to_string(),
                })
            }
        })
        .await;

    assert!(matches!(result, Err(Error::ServerError { status: 502, .. })));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();

    let result: Result<(), Error> = fast_policy(5)
        .run("denied", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::PermissionDenied("Must have admin rights".to_string()))
            }
        })
        .await;

    assert!(matches!(result, Err(Error::PermissionDenied(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_policy_from_config() {
    let config = ReconcilerConfig {
        max_attempts: 0,
        initial_backoff_ms: 10,
        max_backoff_ms: 20,
    };

    let policy = RetryPolicy::from(&config);

    assert_eq!(policy.max_attempts, 1);
    assert_eq!(policy.initial_backoff, Duration::from_millis(10));
    assert_eq!(policy.max_backoff, Duration::from_millis(20));
}
