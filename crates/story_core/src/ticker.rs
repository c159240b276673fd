use std::{ops::ControlFlow, time::Duration};

use tokio::{runtime::Handle, task::JoinHandle, time::Instant};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Repeating tick task. Aborted when cancelled or dropped.
pub(crate) struct Ticker {
    task: JoinHandle<()>,
}

impl Ticker {
    /// Spawns onto `runtime`. The first tick fires one `period` after the
    /// call, and `on_tick` returning `Break` ends the task.
    pub(crate) fn spawn<F>(runtime: &Handle, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let task = runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if on_tick().is_break() {
                    break;
                }
            }
        });
        Self { task }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub(crate) fn cancel(self) {
        drop(self);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_every_period_until_cancelled() {
        let count = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&count);
        let ticker = Ticker::spawn(&Handle::current(), Duration::from_millis(10), move || {
            seen.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        });

        tokio::time::sleep(Duration::from_millis(55)).await;
        assert_eq!(count.load(Ordering::SeqCst), 5);

        ticker.cancel();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn break_finishes_the_task() {
        let ticker = Ticker::spawn(&Handle::current(), Duration::from_millis(10), || {
            ControlFlow::Break(())
        });
        tokio::time::sleep(Duration::from_millis(15)).await;
        tokio::task::yield_now().await;
        assert!(ticker.is_finished());
    }
}
