//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.
//! Every threshold here is calibrated against one correlation utility and is
//! expected to be retuned per deployment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::focus::DelimiterPair;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// External executables.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Source download constraints.
    #[serde(default)]
    pub download: DownloadSettings,

    /// Audio extraction parameters shared by background and foreground.
    #[serde(default)]
    pub extraction: ExtractionSettings,

    /// Acceptance thresholds and guard bands.
    #[serde(default)]
    pub thresholds: ThresholdSettings,

    /// Known intro/outro fingerprints, tried in order.
    #[serde(default = "default_delimiters")]
    pub delimiters: Vec<DelimiterPair>,
}

impl Settings {
    /// Check values that serde alone cannot reject.
    pub fn validate(&self) -> Result<(), String> {
        let t = &self.thresholds;
        for (name, value) in [
            ("thresholds.start_min_confidence", t.start_min_confidence),
            ("thresholds.end_min_confidence", t.end_min_confidence),
            ("thresholds.final_min_score", t.final_min_score),
            ("thresholds.fade_guard_secs", t.fade_guard_secs),
            ("thresholds.silence_threshold_db", t.silence_threshold_db),
        ] {
            if !value.is_finite() {
                return Err(format!("{} must be a finite number", name));
            }
        }

        if t.fade_guard_secs < 0.0 {
            return Err("thresholds.fade_guard_secs must not be negative".to_string());
        }

        if self.download.max_filesize_mb == 0 {
            return Err("download.max_filesize_mb must be greater than zero".to_string());
        }

        if !DOWNLOAD_FORMATS.contains(&self.download.format.as_str()) {
            return Err(format!(
                "download.format '{}' is not one of {}",
                self.download.format,
                DOWNLOAD_FORMATS.join(", ")
            ));
        }

        if self.extraction.sample_rate == 0 {
            return Err("extraction.sample_rate must be greater than zero".to_string());
        }

        if self.extraction.channels == 0 {
            return Err("extraction.channels must be at least 1".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for pair in &self.delimiters {
            if pair.key.trim().is_empty() {
                return Err("delimiter keys must not be empty".to_string());
            }
            if !seen.insert(pair.key.as_str()) {
                return Err(format!("duplicate delimiter key '{}'", pair.key));
            }
        }

        Ok(())
    }
}

/// Path configuration for temporary artifacts and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Root folder for temporary artifacts. Unset means the system temp dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_root: Option<PathBuf>,

    /// Folder for per-run log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Write a dedicated log file for every run.
    #[serde(default)]
    pub write_run_logs: bool,
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl PathSettings {
    /// The directory temporary artifacts are created in.
    pub fn resolved_temp_root(&self) -> PathBuf {
        self.temp_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            temp_root: None,
            logs_folder: default_logs_folder(),
            write_run_logs: false,
        }
    }
}

/// Executable names or paths for the external utilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,

    #[serde(default = "default_yt_dlp")]
    pub yt_dlp: String,

    /// The correlation utility (`locate_audio` from this workspace).
    #[serde(default = "default_locate_audio")]
    pub locate_audio: String,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_yt_dlp() -> String {
    "yt-dlp".to_string()
}

fn default_locate_audio() -> String {
    "./locate_audio".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            yt_dlp: default_yt_dlp(),
            locate_audio: default_locate_audio(),
        }
    }
}

/// Single-file containers the downloader may be asked for.
///
/// Merge selectors such as `bv+ba` make yt-dlp write intermediate files next
/// to the requested output, outside the download artifact.
pub const DOWNLOAD_FORMATS: [&str; 2] = ["mp4", "webm"];

/// Constraints applied to the downloaded source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadSettings {
    /// Container format requested from the downloader.
    #[serde(default = "default_format")]
    pub format: String,

    /// Upper bound on the downloaded file, in MiB.
    #[serde(default = "default_max_filesize_mb")]
    pub max_filesize_mb: u64,

    /// Refuse to expand playlist links.
    #[serde(default = "default_true")]
    pub no_playlist: bool,
}

fn default_format() -> String {
    "mp4".to_string()
}

fn default_max_filesize_mb() -> u64 {
    512
}

fn default_true() -> bool {
    true
}

impl DownloadSettings {
    /// The size cap in bytes.
    pub fn max_filesize_bytes(&self) -> u64 {
        self.max_filesize_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            format: default_format(),
            max_filesize_mb: default_max_filesize_mb(),
            no_playlist: true,
        }
    }
}

/// Audio extraction parameters.
///
/// Background, foreground and the delimiter signals are only comparable when
/// they share one configuration, so there is exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSettings {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_channels")]
    pub channels: u16,
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_channels() -> u16 {
    1
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
        }
    }
}

/// Confidence thresholds and cut adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSettings {
    /// Minimum score for a start-of-music signal match.
    #[serde(default = "default_start_min_confidence")]
    pub start_min_confidence: f64,

    /// Minimum score for an end-of-music signal match.
    #[serde(default = "default_end_min_confidence")]
    pub end_min_confidence: f64,

    /// Minimum score for the final placement inside the background (inclusive).
    #[serde(default = "default_final_min_score")]
    pub final_min_score: f64,

    /// Seconds trimmed inside each delimiter boundary.
    #[serde(default = "default_fade_guard_secs")]
    pub fade_guard_secs: f64,

    /// Amplitude below which leading/trailing audio counts as silence.
    #[serde(default = "default_silence_threshold_db")]
    pub silence_threshold_db: f64,
}

fn default_start_min_confidence() -> f64 {
    20.0
}

fn default_end_min_confidence() -> f64 {
    15.0
}

fn default_final_min_score() -> f64 {
    6.0
}

fn default_fade_guard_secs() -> f64 {
    crate::focus::DEFAULT_FADE_GUARD_SECS
}

fn default_silence_threshold_db() -> f64 {
    -30.0
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            start_min_confidence: default_start_min_confidence(),
            end_min_confidence: default_end_min_confidence(),
            final_min_score: default_final_min_score(),
            fade_guard_secs: default_fade_guard_secs(),
            silence_threshold_db: default_silence_threshold_db(),
        }
    }
}

fn default_delimiters() -> Vec<DelimiterPair> {
    vec![
        DelimiterPair::new(
            "XX",
            "./res/xx_start_of_music.wav",
            "./res/xx_end_of_music.wav",
        ),
        DelimiterPair::new(
            "Phoenix",
            "./res/phoenix_start_of_music.wav",
            "./res/phoenix_end_of_music.wav",
        ),
    ]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            paths: PathSettings::default(),
            tools: ToolSettings::default(),
            download: DownloadSettings::default(),
            extraction: ExtractionSettings::default(),
            thresholds: ThresholdSettings::default(),
            delimiters: default_delimiters(),
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Tools,
    Download,
    Extraction,
    Thresholds,
    Delimiters,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 6] = [
        ConfigSection::Paths,
        ConfigSection::Tools,
        ConfigSection::Download,
        ConfigSection::Extraction,
        ConfigSection::Thresholds,
        ConfigSection::Delimiters,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Tools => "tools",
            ConfigSection::Download => "download",
            ConfigSection::Extraction => "extraction",
            ConfigSection::Thresholds => "thresholds",
            ConfigSection::Delimiters => "delimiters",
        }
    }

    /// Comment written above the section in generated files.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Temporary artifacts and run logs",
            ConfigSection::Tools => "External executables",
            ConfigSection::Download => "Source download constraints",
            ConfigSection::Extraction => "Audio extraction (applies to every input)",
            ConfigSection::Thresholds => "Match acceptance thresholds",
            ConfigSection::Delimiters => "Known start/end-of-music signals, tried in order",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[thresholds]"));
        assert!(toml.contains("[[delimiters]]"));
        assert!(toml.contains("max_filesize_mb = 512"));
    }

    #[test]
    fn settings_round_trip() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[thresholds]\nfinal_min_score = 8.0";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        assert_eq!(parsed.thresholds.final_min_score, 8.0);
        assert_eq!(parsed.thresholds.start_min_confidence, 20.0);
        assert_eq!(parsed.thresholds.end_min_confidence, 15.0);
        assert_eq!(parsed.extraction.sample_rate, 44100);
        assert_eq!(parsed.delimiters.len(), 2);
    }

    #[test]
    fn delimiter_order_is_preserved() {
        let keys: Vec<_> = Settings::default()
            .delimiters
            .iter()
            .map(|d| d.key.clone())
            .collect();
        assert_eq!(keys, vec!["XX", "Phoenix"]);
    }

    #[test]
    fn validate_rejects_duplicate_delimiters() {
        let mut settings = Settings::default();
        settings
            .delimiters
            .push(DelimiterPair::new("Phoenix", "a.wav", "b.wav"));
        let err = settings.validate().unwrap_err();
        assert!(err.contains("Phoenix"));
    }

    #[test]
    fn validate_rejects_negative_guard_and_zero_cap() {
        let mut settings = Settings::default();
        settings.thresholds.fade_guard_secs = -0.1;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.download.max_filesize_mb = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_accepts_only_single_file_formats() {
        let mut settings = Settings::default();
        settings.download.format = "webm".to_string();
        assert!(settings.validate().is_ok());

        for format in ["", "bv+ba", "bestvideo*+bestaudio", " mp4", "mkv"] {
            settings.download.format = format.to_string();
            let err = settings.validate().unwrap_err();
            assert!(err.contains("download.format"), "{}: {}", format, err);
        }
    }

    #[test]
    fn temp_root_falls_back_to_system_temp() {
        let settings = PathSettings::default();
        assert_eq!(settings.resolved_temp_root(), std::env::temp_dir());
    }
}
