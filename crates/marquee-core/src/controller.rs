//! Marquee controller
//!
//! Ties measurement, the single-slot timer and the offset driver together:
//!
//! ```text
//! start(delay) --timer--> measure --overflow--> animate --finished--> loop ? reset : stop + notify
//!                            |                     |
//!                          fits/err              interrupted
//!                            v                     v
//!                          Idle                 (caller owns next state)
//! ```
//!
//! All state lives in one [`MarqueeState`] record that only changes through
//! its transition methods. Locks are never held across an await and host
//! callbacks always run with no lock held.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::animation::AnimationDriver;
use crate::config::MarqueeConfig;
use crate::events::MarqueeEvent;
use crate::metrics::{DistanceCalculator, Metrics, MetricsProvider};
use crate::timer::TimerScheduler;
use crate::Result;

/// Whether the offset is currently moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    #[default]
    Idle,
    Animating,
}

type CompleteCallback = Box<dyn Fn() + Send + Sync>;

#[derive(Debug)]
struct MarqueeState {
    content: String,
    /// `None` until measured, and again after every content change
    metrics: Option<Metrics>,
    phase: ControllerState,
    /// Bumped whenever the in-flight cycle must be abandoned
    epoch: u64,
    unmounted: bool,
}

impl MarqueeState {
    fn new(content: String) -> Self {
        Self {
            content,
            metrics: None,
            phase: ControllerState::Idle,
            epoch: 0,
            unmounted: false,
        }
    }

    /// Go idle and abandon the current cycle. Returns the previous phase.
    fn enter_idle(&mut self) -> ControllerState {
        self.epoch = self.epoch.wrapping_add(1);
        std::mem::replace(&mut self.phase, ControllerState::Idle)
    }

    /// Claim a new measure-and-decide cycle
    fn begin_cycle(&mut self) -> Option<(u64, String)> {
        if self.unmounted || self.phase == ControllerState::Animating {
            return None;
        }
        self.epoch = self.epoch.wrapping_add(1);
        Some((self.epoch, self.content.clone()))
    }

    /// Store metrics from cycle `epoch` and switch to `Animating` when the
    /// content overflows. Returns the distance to scroll.
    fn finish_measure(&mut self, epoch: u64, metrics: Metrics) -> Option<f64> {
        if self.unmounted || self.epoch != epoch {
            return None;
        }
        self.metrics = Some(metrics);
        if metrics.content_fits() || self.phase == ControllerState::Animating {
            return None;
        }
        self.phase = ControllerState::Animating;
        Some(metrics.distance())
    }

    /// Replace the content. Returns false when it did not change.
    fn change_content(&mut self, content: String) -> bool {
        if self.unmounted || self.content == content {
            return false;
        }
        self.content = content;
        self.metrics = None;
        true
    }

    fn is_current(&self, epoch: u64) -> bool {
        !self.unmounted && self.epoch == epoch
    }
}

struct Inner {
    config: MarqueeConfig,
    calculator: DistanceCalculator,
    timer: TimerScheduler,
    driver: AnimationDriver,
    state: Mutex<MarqueeState>,
    cycle: Mutex<Option<JoinHandle<()>>>,
    on_complete: Option<CompleteCallback>,
    event_tx: Option<mpsc::UnboundedSender<MarqueeEvent>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.timer.cancel();
    }
}

/// Builder for [`MarqueeController`]
pub struct MarqueeBuilder {
    config: MarqueeConfig,
    content: String,
    provider: Arc<dyn MetricsProvider>,
    on_complete: Option<CompleteCallback>,
    event_tx: Option<mpsc::UnboundedSender<MarqueeEvent>>,
}

impl MarqueeBuilder {
    /// Called once per finished non-looping cycle
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Set the event sender for host notifications
    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<MarqueeEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Validate the configuration and create the controller
    pub fn build(self) -> Result<MarqueeController> {
        self.config.validate()?;
        if !self.config.use_native_driver {
            debug!("Native driver disabled, offset updates run on the host loop");
        }

        let driver = AnimationDriver::new(self.config.frame_duration());
        Ok(MarqueeController {
            inner: Arc::new(Inner {
                calculator: DistanceCalculator::new(self.provider),
                timer: TimerScheduler::new(),
                driver,
                state: Mutex::new(MarqueeState::new(self.content)),
                cycle: Mutex::new(None),
                on_complete: self.on_complete,
                event_tx: self.event_tx,
                config: self.config,
            }),
        })
    }
}

/// Handle to one marquee instance. Clones share the same controller.
///
/// Call [`mount`](Self::mount) when the widget appears and
/// [`unmount`](Self::unmount) when it goes away; after `unmount` no timer,
/// offset update or callback fires.
#[derive(Clone)]
pub struct MarqueeController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MarqueeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarqueeController")
            .field("config", &self.inner.config)
            .field("state", &*self.lock_state())
            .field("offset", &self.offset())
            .finish()
    }
}

impl MarqueeController {
    pub fn builder(
        config: MarqueeConfig,
        content: impl Into<String>,
        provider: Arc<dyn MetricsProvider>,
    ) -> MarqueeBuilder {
        MarqueeBuilder {
            config,
            content: content.into(),
            provider,
            on_complete: None,
            event_tx: None,
        }
    }

    /// Shorthand for a controller without callback or event channel
    pub fn new(
        config: MarqueeConfig,
        content: impl Into<String>,
        provider: Arc<dyn MetricsProvider>,
    ) -> Result<Self> {
        Self::builder(config, content, provider).build()
    }

    pub fn config(&self) -> &MarqueeConfig {
        &self.inner.config
    }

    pub fn state(&self) -> ControllerState {
        self.lock_state().phase
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.state() == ControllerState::Animating
    }

    /// Current horizontal translation, in `[-distance, 0]`
    #[inline]
    pub fn offset(&self) -> f64 {
        self.inner.driver.offset()
    }

    /// Receiver the rendering layer can watch for offset updates
    pub fn subscribe_offset(&self) -> watch::Receiver<f64> {
        self.inner.driver.subscribe()
    }

    /// Last successful measurement for the current content
    pub fn metrics(&self) -> Option<Metrics> {
        self.lock_state().metrics
    }

    /// False until a measurement says otherwise
    pub fn content_fits(&self) -> bool {
        self.metrics().is_some_and(|m| m.content_fits())
    }

    pub fn content(&self) -> String {
        self.lock_state().content.clone()
    }

    /// Whether a delayed start is waiting to fire
    pub fn has_pending_start(&self) -> bool {
        self.inner.timer.is_pending()
    }

    /// Widget appeared: start right away when configured to
    pub fn mount(&self) {
        if self.inner.config.marquee_on_start {
            self.start(self.inner.config.marquee_delay());
        }
    }

    /// Measure and, if the content overflows, begin scrolling after `delay`.
    /// Does nothing while already animating.
    pub fn start(&self, delay: Duration) {
        {
            let state = self.lock_state();
            if state.unmounted || state.phase == ControllerState::Animating {
                debug!(phase = ?state.phase, "Start ignored");
                return;
            }
        }

        debug!(delay_ms = delay.as_millis() as u64, "Marquee start scheduled");
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.timer.schedule(delay, move || {
            if let Some(inner) = weak.upgrade() {
                MarqueeController { inner }.spawn_cycle();
            }
        });
    }

    /// Return to 0 and go idle, dropping any pending start
    pub fn stop(&self) {
        if self.lock_state().unmounted {
            return;
        }
        if self.go_idle() == ControllerState::Animating {
            debug!("Marquee stopped");
            self.send_event(MarqueeEvent::Stopped);
        }
    }

    /// Return to 0 and restart after the (floored) reset delay
    pub fn reset(&self) {
        {
            let mut state = self.lock_state();
            if state.unmounted {
                return;
            }
            state.enter_idle();
        }
        self.inner.driver.stop();
        self.start(self.inner.config.reset_delay());
        self.send_event(MarqueeEvent::Reset);
    }

    /// Swap the displayed text. A different string drops the cached metrics
    /// and resets, so a fresh measurement decides what happens next.
    pub fn set_content(&self, content: impl Into<String>) {
        let changed = self.lock_state().change_content(content.into());
        if changed {
            debug!("Marquee content changed");
            self.reset();
        }
    }

    /// Re-measure the current content without touching the animation
    pub async fn calculate_metrics(&self) -> Result<Metrics> {
        let content = self.content();
        let metrics = self.inner.calculator.measure(&content).await?;

        let mut state = self.lock_state();
        if !state.unmounted && state.content == content {
            state.metrics = Some(metrics);
        }
        Ok(metrics)
    }

    /// Rendering layer reports a size change: re-measure in the background
    pub fn content_size_changed(&self) {
        if self.lock_state().unmounted {
            return;
        }
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.calculate_metrics().await {
                warn!(error = %e, "Marquee re-measure failed");
                if !this.lock_state().unmounted {
                    this.send_event(MarqueeEvent::MeasurementFailed {
                        message: e.to_string(),
                    });
                }
            }
        });
    }

    /// Widget went away. Nothing fires after this returns.
    pub fn unmount(&self) {
        let was_animating = {
            let mut state = self.lock_state();
            state.unmounted = true;
            state.phase == ControllerState::Animating
        };
        if was_animating {
            self.go_idle();
            self.send_event(MarqueeEvent::Stopped);
        }
        self.inner.timer.cancel();
        if let Some(cycle) = self.lock_cycle().take() {
            cycle.abort();
        }
        debug!("Marquee unmounted");
    }

    fn spawn_cycle(&self) {
        let Some((epoch, content)) = self.lock_state().begin_cycle() else {
            return;
        };

        let this = self.clone();
        let handle = tokio::spawn(async move { this.run_cycle(epoch, content).await });
        if let Some(previous) = self.lock_cycle().replace(handle) {
            previous.abort();
        }
    }

    async fn run_cycle(&self, epoch: u64, content: String) {
        let metrics = match self.inner.calculator.measure(&content).await {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!(error = %e, "Marquee measurement failed, not animating");
                if self.lock_state().is_current(epoch) {
                    self.send_event(MarqueeEvent::MeasurementFailed {
                        message: e.to_string(),
                    });
                }
                return;
            }
        };

        let duration = match self.inner.config.duration_for(metrics.distance().max(0.0)) {
            Ok(duration) => duration,
            Err(e) => {
                warn!(error = %e, "Cannot compute marquee duration");
                return;
            }
        };

        let Some(distance) = self.lock_state().finish_measure(epoch, metrics) else {
            debug!(fits = metrics.content_fits(), "No marquee needed");
            return;
        };

        info!(
            distance,
            duration_ms = duration.as_millis() as u64,
            "Marquee animating"
        );
        self.send_event(MarqueeEvent::Started { distance, duration });

        let result = self.inner.driver.animate(0.0, -distance, duration).await;
        if !result.finished || !self.lock_state().is_current(epoch) {
            return;
        }

        if self.inner.config.looping {
            self.reset();
        } else {
            self.go_idle();
            debug!("Marquee cycle complete");
            self.send_event(MarqueeEvent::Completed);
            if let Some(callback) = &self.inner.on_complete {
                callback();
            }
        }
    }

    /// Back to offset 0 with no pending start; returns the phase left behind
    fn go_idle(&self) -> ControllerState {
        let previous = self.lock_state().enter_idle();
        self.inner.timer.cancel();
        self.inner.driver.stop();
        previous
    }

    /// Send an event to the host (if event channel is configured)
    fn send_event(&self, event: MarqueeEvent) {
        if let Some(ref tx) = self.inner.event_tx {
            if tx.send(event).is_err() {
                debug!("Failed to send marquee event: receiver dropped");
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, MarqueeState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_cycle(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .cycle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
