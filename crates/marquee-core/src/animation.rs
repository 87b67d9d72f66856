//! Offset animation driver
//!
//! Owns the horizontal offset of the marquee content and moves it linearly
//! between two values over a fixed duration. The offset is published on a
//! `watch` channel so the rendering layer always sees the latest value.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Outcome of one [`AnimationDriver::animate`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationResult {
    /// `true` when the target was reached, `false` when preempted
    pub finished: bool,
}

/// Progress (0.0 to 1.0) of an animation that began at `start`
#[inline]
pub fn progress(start: Instant, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    let ratio = start.elapsed().as_secs_f64() / duration.as_secs_f64();
    ratio.clamp(0.0, 1.0)
}

/// Linear interpolation between two values
#[inline]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

#[derive(Debug)]
pub struct AnimationDriver {
    offset: watch::Sender<f64>,
    /// Id of the current run; bumping it interrupts whatever is in flight
    run: watch::Sender<u64>,
    frame: Duration,
}

impl AnimationDriver {
    /// Create a driver that updates the offset every `frame`
    pub fn new(frame: Duration) -> Self {
        let frame = if frame.is_zero() {
            Duration::from_millis(16)
        } else {
            frame
        };
        Self {
            offset: watch::channel(0.0).0,
            run: watch::channel(0).0,
            frame,
        }
    }

    /// Latest offset value
    #[inline]
    pub fn offset(&self) -> f64 {
        *self.offset.borrow()
    }

    /// Receiver that observes every offset update
    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.offset.subscribe()
    }

    /// Jump to `value`, interrupting any running animation
    pub fn set_value(&self, value: f64) {
        self.interrupt();
        self.offset.send_replace(value);
    }

    /// Jump back to 0, interrupting any running animation
    pub fn stop(&self) {
        self.set_value(0.0);
    }

    fn interrupt(&self) {
        self.run.send_modify(|id| *id = id.wrapping_add(1));
    }

    /// Move the offset linearly from `from` to `to` over `duration`.
    ///
    /// Starting an animation interrupts the previous one. Resolves with
    /// `finished: false` as soon as a later `animate`, `set_value` or `stop`
    /// takes over.
    pub async fn animate(&self, from: f64, to: f64, duration: Duration) -> AnimationResult {
        let mut run = self.run.subscribe();
        self.interrupt();
        let run_id = *run.borrow_and_update();
        self.offset.send_replace(from);

        debug!(run_id, from, to, duration_ms = duration.as_millis() as u64, "Animation started");

        let start = Instant::now();
        let mut ticker = tokio::time::interval(self.frame);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick fires immediately
        ticker.tick().await;

        loop {
            let t = progress(start, duration);
            self.offset.send_replace(lerp(from, to, t));
            if t >= 1.0 {
                debug!(run_id, "Animation finished");
                return AnimationResult { finished: true };
            }

            // Never sleep past the end of the animation
            let remaining = duration.saturating_sub(start.elapsed());
            tokio::select! {
                biased;
                changed = run.changed() => {
                    if changed.is_err() || *run.borrow() != run_id {
                        debug!(run_id, "Animation interrupted");
                        return AnimationResult { finished: false };
                    }
                }
                _ = ticker.tick() => {}
                _ = tokio::time::sleep(remaining) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_lerp() {
        assert!((lerp(0.0, -150.0, 0.0) - 0.0).abs() < 0.001);
        assert!((lerp(0.0, -150.0, 0.5) + 75.0).abs() < 0.001);
        assert!((lerp(0.0, -150.0, 1.0) + 150.0).abs() < 0.001);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_zero_duration() {
        assert!((progress(Instant::now(), Duration::ZERO) - 1.0).abs() < 0.001);
    }

    #[tokio::test(start_paused = true)]
    async fn test_animate_reaches_target() {
        let driver = AnimationDriver::new(Duration::from_millis(16));
        let start = Instant::now();

        let result = driver.animate(0.0, -150.0, Duration::from_millis(1500)).await;

        assert!(result.finished);
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
        assert!((driver.offset() + 150.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_offset_moves_monotonically() {
        let driver = Arc::new(AnimationDriver::new(Duration::from_millis(16)));
        let mut rx = driver.subscribe();

        let task = {
            let driver = driver.clone();
            tokio::spawn(async move { driver.animate(0.0, -100.0, Duration::from_millis(500)).await })
        };

        let mut seen = vec![];
        while rx.changed().await.is_ok() {
            let value = *rx.borrow_and_update();
            seen.push(value);
            if value <= -100.0 {
                break;
            }
        }

        assert!(task.await.unwrap().finished);
        assert!(seen.len() > 10);
        assert!(seen.windows(2).all(|w| w[1] <= w[0]));
        assert!(seen.iter().all(|v| (-100.0..=0.0).contains(v)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts() {
        let driver = Arc::new(AnimationDriver::new(Duration::from_millis(16)));
        let task = {
            let driver = driver.clone();
            tokio::spawn(async move { driver.animate(0.0, -200.0, Duration::from_secs(2)).await })
        };

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(driver.offset() < 0.0);

        driver.stop();
        assert_eq!(driver.offset(), 0.0);

        let result = task.await.unwrap();
        assert!(!result.finished);
        assert_eq!(driver.offset(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_animation_preempts_old() {
        let driver = Arc::new(AnimationDriver::new(Duration::from_millis(16)));
        let first = {
            let driver = driver.clone();
            tokio::spawn(async move { driver.animate(0.0, -200.0, Duration::from_secs(2)).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let second = driver.animate(0.0, -50.0, Duration::from_millis(200)).await;

        assert!(!first.await.unwrap().finished);
        assert!(second.finished);
        assert!((driver.offset() + 50.0).abs() < 1e-9);
    }
}
