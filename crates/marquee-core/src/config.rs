use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

/// Lower bound applied to the delay between a reset and the next cycle
pub const MIN_RESET_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub marquee: MarqueeConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path (log files live here)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Marquee behaviour. Immutable for the lifetime of a controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarqueeConfig {
    /// Scroll speed in pixels (or cells) per second, must be > 0
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Restart the marquee after each finished cycle
    #[serde(default, rename = "loop")]
    pub looping: bool,
    /// Start scrolling as soon as the widget mounts
    #[serde(default = "default_true")]
    pub marquee_on_start: bool,
    /// Delay before the first cycle starts (ms)
    #[serde(default)]
    pub marquee_delay_ms: u64,
    /// Delay before a looping marquee restarts (ms, floored to 100)
    #[serde(default)]
    pub marquee_reset_delay_ms: u64,
    /// Execution mode hint for hosts that can offload animation
    #[serde(default = "default_true")]
    pub use_native_driver: bool,
    /// Frame rate of the offset driver (0 = ~60fps fallback)
    #[serde(default = "default_animation_fps")]
    pub animation_fps: u32,
}

impl Default for MarqueeConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            looping: false,
            marquee_on_start: default_true(),
            marquee_delay_ms: 0,
            marquee_reset_delay_ms: 0,
            use_native_driver: default_true(),
            animation_fps: default_animation_fps(),
        }
    }
}

impl MarqueeConfig {
    /// Reject configurations that cannot produce a finite animation
    pub fn validate(&self) -> Result<()> {
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "speed must be a positive number, got {}",
                self.speed
            )));
        }
        Ok(())
    }

    /// Delay before the first cycle
    pub fn marquee_delay(&self) -> Duration {
        Duration::from_millis(self.marquee_delay_ms)
    }

    /// Delay before a restart, never shorter than [`MIN_RESET_DELAY`]
    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.marquee_reset_delay_ms).max(MIN_RESET_DELAY)
    }

    /// Time between two offset updates
    pub fn frame_duration(&self) -> Duration {
        if self.animation_fps == 0 {
            Duration::from_millis(16) // ~60fps fallback
        } else {
            Duration::from_secs_f64(1.0 / self.animation_fps as f64)
        }
    }

    /// Time needed to travel `distance` at the configured speed:
    /// `distance / speed * 1000` ms
    pub fn duration_for(&self, distance: f64) -> Result<Duration> {
        self.validate()?;
        if !distance.is_finite() || distance < 0.0 {
            return Err(Error::Other(format!("invalid scroll distance {}", distance)));
        }
        Duration::try_from_secs_f64(distance / self.speed).map_err(|e| {
            Error::InvalidConfiguration(format!(
                "speed {} cannot cover {} in a finite duration: {}",
                self.speed, distance, e
            ))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Tick rate in milliseconds
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
    /// Width of the marquee box in cells (0 = terminal width)
    #[serde(default)]
    pub width: u16,
    /// Draw a border around the marquee
    #[serde(default = "default_true")]
    pub show_border: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate(),
            width: 0,
            show_border: default_true(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("marquee")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_speed() -> f64 {
    30.0
}

fn default_animation_fps() -> u32 {
    60
}

fn default_tick_rate() -> u64 {
    16
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.marquee.validate()?;
        Ok(config)
    }

    /// Always uses ~/.config/marquee/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("marquee")
            .join("config.toml")
    }

    /// Get the log file path
    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join("marquee.log")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }
}
