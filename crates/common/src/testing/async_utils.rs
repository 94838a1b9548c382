//! Async testing utilities
//!
//! Helpers for tests that observe background work (dispatcher workers,
//! polling loops) without sprinkling ad-hoc sleeps through the assertions.
//! Both helpers measure time with `tokio::time`, so they also behave under a
//! paused test clock.

#![allow(clippy::missing_errors_doc)]

use std::future::Future;
use std::time::Duration;

use tokio::time::{error::Elapsed, Instant};

/// Run `fut` to completion or give up after `duration`.
pub async fn timeout_ok<F, T>(duration: Duration, fut: F) -> Result<T, Elapsed>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, fut).await
}

/// Re-evaluate `condition` every `interval` until it holds.
///
/// Returns `false` if it still does not hold once `timeout` has passed.
pub async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn timeout_ok_distinguishes_fast_and_slow_futures() {
        let fast = timeout_ok(Duration::from_millis(100), async { 7 }).await;
        assert_eq!(fast.unwrap(), 7);

        let slow = timeout_ok(
            Duration::from_millis(10),
            tokio::time::sleep(Duration::from_secs(1)),
        )
        .await;
        assert!(slow.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn poll_until_sees_background_progress() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let writer = ticks.clone();
        tokio::spawn(async move {
            for _ in 0..3 {
                tokio::time::sleep(Duration::from_millis(20)).await;
                writer.fetch_add(1, Ordering::SeqCst);
            }
        });

        let reached = poll_until(Duration::from_secs(1), Duration::from_millis(5), || {
            let ticks = ticks.clone();
            async move { ticks.load(Ordering::SeqCst) == 3 }
        })
        .await;

        assert!(reached);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_until_gives_up_at_the_deadline() {
        let started = Instant::now();
        let reached =
            poll_until(Duration::from_millis(50), Duration::from_millis(10), || async { false })
                .await;

        assert!(!reached);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
