use std::time::Duration;

/// Events emitted by a marquee controller to notify the host of changes
#[derive(Debug, Clone, PartialEq)]
pub enum MarqueeEvent {
    /// Content overflows and a scroll cycle began
    Started { distance: f64, duration: Duration },
    /// A non-looping cycle ran to the end
    Completed,
    /// Offset was returned to 0 and a restart was scheduled
    Reset,
    /// A running animation was stopped
    Stopped,
    /// Width measurement failed; no animation this cycle
    MeasurementFailed { message: String },
}
