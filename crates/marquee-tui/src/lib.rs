pub mod event;
pub mod metrics;
pub mod widget;

pub use event::{AppEvent, EventHandler};
pub use metrics::CellMetrics;
pub use widget::{truncate_to_width, MarqueeWidget};
