//! Width measurement and overflow distance
//!
//! The host supplies a [`MetricsProvider`]; [`DistanceCalculator`] asks it for
//! both widths at once and turns them into [`Metrics`].

use std::sync::Arc;

use tracing::debug;

use crate::{Error, Result};

/// Measured widths of the container and its content
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub container_width: f64,
    pub content_width: f64,
}

impl Metrics {
    /// Signed overflow: positive when the content is wider than the container
    #[inline]
    pub fn distance(&self) -> f64 {
        self.content_width - self.container_width
    }

    /// True when no horizontal scrolling is needed
    #[inline]
    pub fn content_fits(&self) -> bool {
        self.distance() <= 0.0
    }
}

/// Host layout facility that reports rendered widths
#[async_trait::async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Width of the fixed container
    async fn container_width(&self) -> Result<f64>;

    /// Width `content` occupies when rendered on a single line
    async fn content_width(&self, content: &str) -> Result<f64>;
}

/// Derives the overflow distance from a [`MetricsProvider`]
#[derive(Clone)]
pub struct DistanceCalculator {
    provider: Arc<dyn MetricsProvider>,
}

impl std::fmt::Debug for DistanceCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceCalculator").finish_non_exhaustive()
    }
}

impl DistanceCalculator {
    pub fn new(provider: Arc<dyn MetricsProvider>) -> Self {
        Self { provider }
    }

    /// Measure container and content concurrently.
    ///
    /// Fails if either request fails or reports a width that is negative or
    /// not finite. Safe to call any number of times.
    pub async fn measure(&self, content: &str) -> Result<Metrics> {
        let (container_width, content_width) = tokio::try_join!(
            self.provider.container_width(),
            self.provider.content_width(content),
        )?;

        let container_width = usable_width("container", container_width)?;
        let content_width = usable_width("content", content_width)?;

        let metrics = Metrics {
            container_width,
            content_width,
        };
        debug!(
            container_width,
            content_width,
            distance = metrics.distance(),
            "Measured marquee"
        );
        Ok(metrics)
    }
}

fn usable_width(which: &str, width: f64) -> Result<f64> {
    if width.is_finite() && width >= 0.0 {
        Ok(width)
    } else {
        Err(Error::Measurement(format!("{} width is unusable: {}", which, width)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Provider returning fixed widths after an optional latency
    pub(crate) struct FixedMetrics {
        pub container: Mutex<Result<f64>>,
        pub content: Mutex<Result<f64>>,
        pub latency: Duration,
        pub calls: AtomicUsize,
    }

    impl FixedMetrics {
        pub(crate) fn new(container: f64, content: f64) -> Self {
            Self {
                container: Mutex::new(Ok(container)),
                content: Mutex::new(Ok(content)),
                latency: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn set_content(&self, width: f64) {
            *self.content.lock().unwrap() = Ok(width);
        }

        pub(crate) fn fail_container(&self) {
            *self.container.lock().unwrap() = Err(Error::Measurement("layout not ready".into()));
        }

        fn read(slot: &Mutex<Result<f64>>) -> Result<f64> {
            match &*slot.lock().unwrap() {
                Ok(w) => Ok(*w),
                Err(e) => Err(Error::Measurement(e.to_string())),
            }
        }
    }

    #[async_trait::async_trait]
    impl MetricsProvider for FixedMetrics {
        async fn container_width(&self) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            Self::read(&self.container)
        }

        async fn content_width(&self, _content: &str) -> Result<f64> {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            Self::read(&self.content)
        }
    }

    #[test]
    fn test_distance_and_fit() {
        let m = Metrics {
            container_width: 100.0,
            content_width: 250.0,
        };
        assert!((m.distance() - 150.0).abs() < f64::EPSILON);
        assert!(!m.content_fits());

        let equal = Metrics {
            container_width: 100.0,
            content_width: 100.0,
        };
        assert!(equal.content_fits());

        let narrow = Metrics {
            container_width: 100.0,
            content_width: 20.0,
        };
        assert!(narrow.content_fits());
    }

    #[tokio::test]
    async fn test_measure_success() {
        let calc = DistanceCalculator::new(Arc::new(FixedMetrics::new(100.0, 250.0)));
        let metrics = calc.measure("hello").await.unwrap();
        assert_eq!(metrics.container_width, 100.0);
        assert_eq!(metrics.content_width, 250.0);
        assert!((metrics.distance() - 150.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_measure_is_repeatable() {
        let provider = Arc::new(FixedMetrics::new(80.0, 60.0));
        let calc = DistanceCalculator::new(provider.clone());
        let first = calc.measure("a").await.unwrap();
        let second = calc.measure("a").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_measure_failure_propagates() {
        let provider = Arc::new(FixedMetrics::new(100.0, 250.0));
        provider.fail_container();
        let calc = DistanceCalculator::new(provider);
        assert!(matches!(calc.measure("x").await, Err(Error::Measurement(_))));
    }

    #[tokio::test]
    async fn test_measure_rejects_unusable_width() {
        let calc = DistanceCalculator::new(Arc::new(FixedMetrics::new(100.0, f64::NAN)));
        assert!(matches!(calc.measure("x").await, Err(Error::Measurement(_))));

        let calc = DistanceCalculator::new(Arc::new(FixedMetrics::new(-1.0, 10.0)));
        assert!(matches!(calc.measure("x").await, Err(Error::Measurement(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_measurements_run_concurrently() {
        let mut provider = FixedMetrics::new(100.0, 250.0);
        provider.latency = Duration::from_millis(50);
        let calc = DistanceCalculator::new(Arc::new(provider));

        let start = tokio::time::Instant::now();
        calc.measure("x").await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(50));
    }
}
