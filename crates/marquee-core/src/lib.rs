pub mod animation;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod metrics;
pub mod timer;

pub use animation::{AnimationDriver, AnimationResult};
pub use config::{AppConfig, MarqueeConfig};
pub use controller::{ControllerState, MarqueeBuilder, MarqueeController};
pub use error::{Error, Result};
pub use events::MarqueeEvent;
pub use metrics::{DistanceCalculator, Metrics, MetricsProvider};
pub use timer::TimerScheduler;
