//! Single-slot delayed callback
//!
//! A [`TimerScheduler`] owns at most one pending callback. Scheduling a new
//! one cancels the previous; cancelling an empty slot is a no-op.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Default)]
struct Slot {
    /// Bumped on every schedule/cancel so a timer that already woke up can
    /// tell it was replaced
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

/// Cancellable delayed task with replace-on-schedule semantics
#[derive(Debug, Clone, Default)]
pub struct TimerScheduler {
    slot: Arc<Mutex<Slot>>,
}

impl TimerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` after `delay`, replacing any pending callback.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, delay: Duration, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        if let Some(previous) = slot.handle.take() {
            previous.abort();
            debug!("Replaced pending timer");
        }

        let generation = slot.generation;
        let shared = Arc::clone(&self.slot);
        slot.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut slot = lock(&shared);
                if slot.generation != generation {
                    return;
                }
                slot.handle = None;
            }
            callback();
        }));
    }

    /// Drop the pending callback, if any
    pub fn cancel(&self) {
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        if let Some(handle) = slot.handle.take() {
            handle.abort();
            debug!("Cancelled pending timer");
        }
    }

    /// Whether a callback is waiting to fire
    pub fn is_pending(&self) -> bool {
        lock(&self.slot).handle.is_some()
    }
}

fn lock(slot: &Mutex<Slot>) -> std::sync::MutexGuard<'_, Slot> {
    // The slot holds no invariant a panicking holder could break
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counter() -> (Arc<AtomicU32>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let make = move || {
            let c = c.clone();
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }) as Box<dyn FnOnce() + Send>
        };
        (count, make)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let timer = TimerScheduler::new();
        let (count, make) = counter();

        timer.schedule(Duration::from_millis(200), make());
        assert!(timer.is_pending());

        tokio::time::sleep(Duration::from_millis(199)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_replaces_pending() {
        let timer = TimerScheduler::new();
        let (count, make) = counter();

        timer.schedule(Duration::from_millis(100), make());
        timer.schedule(Duration::from_millis(300), make());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let timer = TimerScheduler::new();
        let (count, make) = counter();

        // Cancelling with nothing pending is fine
        timer.cancel();

        timer.schedule(Duration::ZERO, make());
        timer.cancel();
        assert!(!timer.is_pending());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_may_reschedule() {
        let timer = TimerScheduler::new();
        let count = Arc::new(AtomicU32::new(0));

        let inner_timer = timer.clone();
        let c = count.clone();
        timer.schedule(Duration::from_millis(10), move || {
            c.fetch_add(1, Ordering::SeqCst);
            let c = c.clone();
            inner_timer.schedule(Duration::from_millis(10), move || {
                c.fetch_add(1, Ordering::SeqCst);
            });
        });

        tokio::time::sleep(Duration::from_millis(15)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(timer.is_pending());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
