//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub link: LinkConfig,

    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Link timing configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    /// How long one capture cycle may wait for bytes before the link is
    /// considered offline
    #[serde(default = "default_capture_timeout_ms")]
    pub capture_timeout_ms: u64,
}

/// Operator display configuration
#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    #[serde(default = "default_fast_refresh_ms")]
    pub fast_refresh_ms: u64,

    #[serde(default = "default_slow_refresh_ms")]
    pub slow_refresh_ms: u64,

    #[serde(default = "default_screen_width")]
    pub screen_width: u16,

    #[serde(default = "default_screen_height")]
    pub screen_height: u16,

    #[serde(default = "default_delete_queue")]
    pub delete_queue: usize,

    #[serde(default = "default_graphic_queue")]
    pub graphic_queue: usize,

    #[serde(default = "default_string_queue")]
    pub string_queue: usize,
}

/// Telemetry journal configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_interval_ms")]
    pub log_interval_ms: u64,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyACM0".to_string() }
fn default_baud_rate() -> u32 { 115200 }

fn default_capture_timeout_ms() -> u64 { 100 }

fn default_fast_refresh_ms() -> u64 { 100 }
fn default_slow_refresh_ms() -> u64 { 2000 }
fn default_screen_width() -> u16 { 1920 }
fn default_screen_height() -> u16 { 1080 }
fn default_delete_queue() -> usize { 4 }
fn default_graphic_queue() -> usize { 16 }
fn default_string_queue() -> usize { 8 }

fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_interval_ms() -> u64 { 1000 }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            capture_timeout_ms: default_capture_timeout_ms(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            fast_refresh_ms: default_fast_refresh_ms(),
            slow_refresh_ms: default_slow_refresh_ms(),
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            delete_queue: default_delete_queue(),
            graphic_queue: default_graphic_queue(),
            string_queue: default_string_queue(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            log_interval_ms: default_log_interval_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            link: LinkConfig::default(),
            ui: UiConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(crate::error::RefereeLinkError::Config(
                toml::de::Error::custom("serial port cannot be empty")
            ));
        }

        if ![115200, 230400, 460800, 921600].contains(&self.serial.baud_rate) {
            return Err(crate::error::RefereeLinkError::Config(
                toml::de::Error::custom("baud_rate must be one of: 115200, 230400, 460800, 921600")
            ));
        }

        if self.link.capture_timeout_ms == 0 || self.link.capture_timeout_ms > 10000 {
            return Err(crate::error::RefereeLinkError::Config(
                toml::de::Error::custom("capture_timeout_ms must be between 1 and 10000")
            ));
        }

        if self.ui.fast_refresh_ms == 0 || self.ui.fast_refresh_ms > 60000 {
            return Err(crate::error::RefereeLinkError::Config(
                toml::de::Error::custom("fast_refresh_ms must be between 1 and 60000")
            ));
        }

        if self.ui.slow_refresh_ms <= self.ui.fast_refresh_ms {
            return Err(crate::error::RefereeLinkError::Config(
                toml::de::Error::custom("slow_refresh_ms must be greater than fast_refresh_ms")
            ));
        }

        if self.ui.screen_width < 320 || self.ui.screen_height < 240 {
            return Err(crate::error::RefereeLinkError::Config(
                toml::de::Error::custom("screen dimensions must be at least 320x240")
            ));
        }

        for (name, value) in [
            ("delete_queue", self.ui.delete_queue),
            ("graphic_queue", self.ui.graphic_queue),
            ("string_queue", self.ui.string_queue),
        ] {
            if value == 0 || value > 256 {
                return Err(crate::error::RefereeLinkError::Config(
                    toml::de::Error::custom(format!("{} must be between 1 and 256", name))
                ));
            }
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(crate::error::RefereeLinkError::Config(
                toml::de::Error::custom("telemetry log_dir cannot be empty when enabled")
            ));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(crate::error::RefereeLinkError::Config(
                toml::de::Error::custom("max_records_per_file must be greater than 0")
            ));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(crate::error::RefereeLinkError::Config(
                toml::de::Error::custom("max_files_to_keep must be greater than 0")
            ));
        }

        if self.telemetry.log_interval_ms == 0 || self.telemetry.log_interval_ms > 60000 {
            return Err(crate::error::RefereeLinkError::Config(
                toml::de::Error::custom("log_interval_ms must be between 1 and 60000")
            ));
        }

        Ok(())
    }
}
