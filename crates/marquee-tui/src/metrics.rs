//! Terminal-cell metrics provider
//!
//! Widths are measured in terminal columns: the container width comes from
//! the last layout pass, the content width from `unicode-width`.

use std::sync::atomic::{AtomicU16, Ordering};

use marquee_core::{Error, MetricsProvider, Result};
use tracing::debug;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Default)]
pub struct CellMetrics {
    container: AtomicU16,
}

impl CellMetrics {
    pub fn new(container_width: u16) -> Self {
        Self {
            container: AtomicU16::new(container_width),
        }
    }

    /// Record the container width from the latest layout.
    /// Returns true when it changed.
    pub fn set_container_width(&self, width: u16) -> bool {
        let previous = self.container.swap(width, Ordering::Relaxed);
        if previous == width {
            return false;
        }
        debug!(from = previous, to = width, "Marquee container width changed");
        true
    }

    pub fn container(&self) -> u16 {
        self.container.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl MetricsProvider for CellMetrics {
    async fn container_width(&self) -> Result<f64> {
        match self.container() {
            0 => Err(Error::Measurement("container has not been laid out".to_string())),
            width => Ok(width as f64),
        }
    }

    async fn content_width(&self, content: &str) -> Result<f64> {
        Ok(content.width() as f64)
    }
}
