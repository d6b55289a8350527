//! Configuration management for pumpsync.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use psync_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/settings.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Final score gate: {}", config.settings().thresholds.final_min_score);
//!
//! config.settings_mut().thresholds.silence_threshold_db = -50.0;
//! config.update_section(ConfigSection::Thresholds).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, DownloadSettings, ExtractionSettings, PathSettings, Settings,
    ThresholdSettings, ToolSettings, DOWNLOAD_FORMATS,
};
