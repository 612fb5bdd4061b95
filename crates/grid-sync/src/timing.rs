//! Wall-clock measurement for repeated operations.

use std::future::Future;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};

/// Mean wall-clock duration of `repetitions` sequential runs of `op`.
///
/// Runs are strictly sequential: each one completes before the next
/// starts, since the operation may itself be a distributed barrier.
/// Pure measurement: no warm-up, no outlier trimming, no side channel.
/// Callers wanting float seconds use [`Duration::as_secs_f64`].
pub async fn mean_duration<F, Fut>(repetitions: NonZeroU32, mut op: F) -> Duration
where
    F: FnMut() -> Fut,
    Fut: Future,
{
    let mut total = Duration::ZERO;
    for _ in 0..repetitions.get() {
        let start = Instant::now();
        op().await;
        total += start.elapsed();
    }
    total / repetitions.get()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn reps(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[tokio::test]
    async fn mean_approximates_fixed_cost() {
        let cost = Duration::from_millis(20);
        let mean = mean_duration(reps(3), || tokio::time::sleep(cost)).await;

        assert!(mean >= cost, "mean {mean:?} below sleep cost");
        // Loose upper bound: scheduling noise, not the repetition count.
        assert!(mean < cost * 10, "mean {mean:?} implausibly large");
    }

    #[tokio::test]
    async fn runs_are_sequential_and_counted() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();

        mean_duration(reps(5), move || {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn single_repetition_is_a_single_timed_run() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();

        let mean = mean_duration(reps(1), move || {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(mean >= Duration::from_millis(10));
    }
}
