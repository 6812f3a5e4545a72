//! Timer Set (C4): a per-operation bag of cancellable one-shot timers.
//!
//! The Python original arms a `threading.Timer` per role and cancels it by
//! clearing a field; firing posts a callback onto the pipeline thread via
//! `invoke_on_pipeline_thread_nowait`. Here, arming spawns a `tokio` task
//! that sleeps and then runs `fire` — itself nothing but "post an event
//! back onto the executor's channel" (spec.md §5: "timer OS threads merely
//! post wakeups onto the pipeline thread; they never touch operation state
//! directly"). Cancelling aborts the task. Because `JoinHandle::abort`
//! racing a just-fired task is a known subtlety, every event the fired
//! callback posts also carries the generation it was armed with, and the
//! executor discards stale-generation events unconditionally — that
//! generation check, not `abort()`, is what actually makes a fired-after-
//! cancel callback inert (spec.md §9's redesign guidance).

use tokio::task::JoinHandle;

/// A single armed-or-idle one-shot timer.
#[derive(Debug, Default)]
pub struct TimerHandle {
    join: Option<JoinHandle<()>>,
}

impl TimerHandle {
    /// No timer armed.
    pub fn idle() -> Self {
        Self { join: None }
    }

    /// Arm a new timer, cancelling (and replacing) whatever was
    /// previously held here.
    pub fn arm<F>(&mut self, interval: std::time::Duration, fire: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.join = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            fire.await;
        }));
    }

    /// Cancel this timer if armed. A no-op if already idle or already
    /// fired.
    pub fn cancel(&mut self) {
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.join.is_some()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn fires_after_interval() {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();
        let mut timer = TimerHandle::idle();
        timer.arm(Duration::from_millis(10), async move {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_prevents_fire() {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();
        let mut timer = TimerHandle::idle();
        timer.arm(Duration::from_millis(50), async move {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });
        timer.cancel();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rearming_cancels_previous() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = TimerHandle::idle();
        let f1 = fired.clone();
        timer.arm(Duration::from_millis(10), async move {
            f1.fetch_add(1, Ordering::SeqCst);
        });
        let f2 = fired.clone();
        timer.arm(Duration::from_millis(10), async move {
            f2.fetch_add(10, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 10);
    }
}
