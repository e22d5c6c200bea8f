use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

/// Static startup configuration. Every field may be omitted from the TOML file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default = "default_serial_port")]
    pub serial_port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Capacity of the sliding window shown on the chart.
    #[serde(default = "default_max_points")]
    pub max_points: usize,
    #[serde(default = "default_render_period_ms")]
    pub render_period_ms: u64,
    /// Padding added above and below the visible values on the y-axis.
    #[serde(default = "default_y_margin")]
    pub y_margin: f64,
    /// Upper bound on how long a single line read may wait for its newline.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Directory receiving both the CSV sample log and the diagnostic log.
    #[serde(default = "default_log_directory")]
    pub log_directory: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_idle_threshold_secs")]
    pub idle_threshold_seconds: u64,
}

fn default_serial_port() -> String {
    "/dev/tty.usbmodem1103".to_string()
}

fn default_baud_rate() -> u32 {
    115200
}

fn default_max_points() -> usize {
    200
}

fn default_render_period_ms() -> u64 {
    100
}

fn default_y_margin() -> f64 {
    10.0
}

fn default_read_timeout_ms() -> u64 {
    1000
}

fn default_log_directory() -> String {
    ".".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_idle_threshold_secs() -> u64 {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            serial_port: default_serial_port(),
            baud_rate: default_baud_rate(),
            max_points: default_max_points(),
            render_period_ms: default_render_period_ms(),
            y_margin: default_y_margin(),
            read_timeout_ms: default_read_timeout_ms(),
            log_directory: default_log_directory(),
            log_level: default_log_level(),
            idle_threshold_seconds: default_idle_threshold_secs(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> &'static str {
        "config/uartplot.toml"
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let raw = fs::read_to_string(path_ref)
            .with_context(|| format!("failed to read configuration from {}", path_ref.display()))?;
        let config: Self = toml::from_str(&raw).with_context(|| {
            format!("failed to parse configuration from {}", path_ref.display())
        })?;
        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", path_ref.display()))?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise falls back to the built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.serial_port.trim().is_empty() {
            bail!("serial_port must not be empty");
        }
        if self.max_points == 0 {
            bail!("max_points must be at least 1");
        }
        if self.render_period_ms == 0 {
            bail!("render_period_ms must be at least 1");
        }
        if !self.y_margin.is_finite() || self.y_margin < 0.0 {
            bail!("y_margin must be a non-negative number, got {}", self.y_margin);
        }
        Ok(())
    }

    pub fn render_period(&self) -> Duration {
        Duration::from_millis(self.render_period_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.idle_threshold_seconds)
    }
}
