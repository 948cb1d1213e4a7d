//! Interval polling bound to a view's lifetime.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::ViewScope;

/// Starts polling loops.
///
/// Every tick spawns its fetch as an independent task: a slow fetch never
/// delays or cancels the next one, and whichever response resolves last is
/// what the cache shows.
#[derive(Debug, Clone, Copy)]
pub struct Poller;

impl Poller {
    /// Fetch immediately, then once per `interval`, until `scope` unmounts or
    /// the returned handle is stopped or dropped.
    ///
    /// Stopping cancels future ticks only; fetches already in flight run to
    /// completion and their results are dropped by the scope-bound cache.
    #[must_use]
    pub fn start<F, Fut>(interval: Duration, scope: &ViewScope, mut tick: F) -> PollHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let scope = scope.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = scope.unmounted() => break,
                    _ = ticker.tick() => {
                        if !scope.is_mounted() {
                            break;
                        }
                        tokio::spawn(tick());
                    }
                }
            }
            tracing::debug!(interval_secs = interval.as_secs(), "Polling stopped");
        });

        PollHandle { task: Some(task) }
    }
}

/// Handle to a running polling loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct PollHandle {
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Cancel all future ticks.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_tick(counter: &Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<()> + Send + 'static {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    /// Let spawned tasks run without advancing the clock.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_immediately_then_every_interval() {
        let scope = ViewScope::new();
        let count = Arc::new(AtomicUsize::new(0));
        let _handle = Poller::start(Duration::from_secs(10), &scope, counting_tick(&count));

        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        tokio::time::advance(Duration::from_secs(25)).await;
        settle().await;
        assert!(count.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_cancels_future_ticks() {
        let scope = ViewScope::new();
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Poller::start(Duration::from_secs(15), &scope, counting_tick(&count));
        settle().await;

        scope.unmount();
        settle().await;
        let before = count.load(Ordering::SeqCst);

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), before);
        assert!(!handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_polling() {
        let scope = ViewScope::new();
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Poller::start(Duration::from_secs(30), &scope, counting_tick(&count));
        settle().await;
        drop(handle);

        tokio::time::advance(Duration::from_secs(120)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_does_not_block_next_tick() {
        let scope = ViewScope::new();
        let started = Arc::new(AtomicUsize::new(0));
        let tick = {
            let started = started.clone();
            move || {
                started.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(25))
            }
        };
        let _handle = Poller::start(Duration::from_secs(10), &scope, tick);
        settle().await;

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(started.load(Ordering::SeqCst), 3);
    }
}
