use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Cancellable, restartable fixed-interval scheduler.
///
/// At most one recurring task is alive per `PollTimer` value: `start` on a
/// running timer supersedes the previous schedule. The first callback fires
/// after one full interval, not immediately. Ticks missed while a callback's
/// async work is still settling are delivered in a burst rather than
/// silently skipped, so callbacks must be idempotent.
pub struct PollTimer {
    handle: Option<JoinHandle<()>>,
}

impl PollTimer {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Begin invoking `tick` every `interval`. Supersedes any schedule
    /// previously started on this timer.
    pub fn start<F, Fut>(&mut self, interval: Duration, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.stop();
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
            // The first tick of a tokio interval resolves immediately;
            // consume it so the first callback lands one interval from now.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                tick().await;
            }
        }));
    }

    /// Cancel future invocations. Idempotent; safe to call when never
    /// started.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// `stop` followed by `start`, kept as a named operation so call sites
    /// that re-arm a timer for a new purpose read as one action.
    pub fn restart<F, Fut>(&mut self, interval: Duration, tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.start(interval, tick);
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Default for PollTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::settle_after;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counting_tick(
        count: &Arc<AtomicU32>,
    ) -> impl FnMut() -> std::future::Ready<()> + Send + 'static {
        let count = count.clone();
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_fires_after_one_full_interval() {
        let count = Arc::new(AtomicU32::new(0));
        let mut timer = PollTimer::new();
        timer.start(Duration::from_secs(3), counting_tick(&count));

        settle_after(Duration::ZERO).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        settle_after(Duration::from_secs(3)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        settle_after(Duration::from_secs(3)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_future_invocations() {
        let count = Arc::new(AtomicU32::new(0));
        let mut timer = PollTimer::new();
        timer.start(Duration::from_secs(1), counting_tick(&count));

        settle_after(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        timer.stop();
        timer.stop(); // idempotent
        settle_after(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_start_is_a_no_op() {
        let mut timer = PollTimer::new();
        timer.stop();
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_supersedes_the_first() {
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));
        let mut timer = PollTimer::new();
        timer.start(Duration::from_secs(1), counting_tick(&first));
        timer.start(Duration::from_secs(1), counting_tick(&second));

        settle_after(Duration::from_secs(3)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_the_schedule() {
        let count = Arc::new(AtomicU32::new(0));
        let mut timer = PollTimer::new();
        timer.start(Duration::from_secs(10), counting_tick(&count));
        timer.restart(Duration::from_secs(1), counting_tick(&count));

        settle_after(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(timer.is_running());
    }
}
