//! Helpers for deterministic timer tests under tokio's paused clock.

use std::time::Duration;

/// Advance the paused clock by `duration` and let every woken task run to
/// its next suspension point.
///
/// The clock is advanced in small steps so intervals shorter than
/// `duration` fire in order, and each step is followed by a handful of
/// yields so spawned timer tasks (and the mock-gateway futures they await)
/// settle before the test asserts anything.
pub async fn settle_after(duration: Duration) {
    const STEP: Duration = Duration::from_millis(500);

    let mut remaining = duration;
    loop {
        settle().await;
        if remaining.is_zero() {
            break;
        }
        let step = remaining.min(STEP);
        tokio::time::advance(step).await;
        remaining -= step;
    }
    settle().await;
}

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
