//! Logging types and configuration.

use serde::{Deserialize, Serialize};

/// Environment switch that echoes every captured tool stderr line.
pub const DEBUG_ENV_VAR: &str = "PUMPSYNC_DEBUG";

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Configuration for a run logger.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to output.
    pub level: LogLevel,
    /// Number of tool output lines kept for failure diagnosis.
    pub error_tail: usize,
    /// Show timestamps in log file / callback output.
    pub show_timestamps: bool,
    /// Echo tool stderr lines as they arrive instead of only buffering them.
    pub echo_tool_output: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            error_tail: 20,
            show_timestamps: true,
            echo_tool_output: false,
        }
    }
}

impl LogConfig {
    /// Default configuration, honouring `PUMPSYNC_DEBUG=1`.
    pub fn from_env() -> Self {
        let debug = std::env::var(DEBUG_ENV_VAR).is_ok_and(|v| v == "1");
        if debug {
            Self::debug()
        } else {
            Self::default()
        }
    }

    /// Verbose configuration with tool output echoed.
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
            error_tail: 50,
            show_timestamps: true,
            echo_tool_output: true,
        }
    }
}

/// Callback receiving every formatted log line, e.g. to stream status to a client.
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Message prefix types for consistent formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePrefix {
    /// Shell command: `$ command`
    Command,
    /// Phase marker: `=== Phase ===`
    Phase,
    /// Success: `[SUCCESS]`
    Success,
    /// Warning: `[WARNING]`
    Warning,
    /// Error: `[ERROR]`
    Error,
    /// Tool stderr: `[stderr]`
    Stderr,
}

impl MessagePrefix {
    /// Format a message with this prefix.
    pub fn format(&self, message: &str) -> String {
        match self {
            MessagePrefix::Command => format!("$ {}", message),
            MessagePrefix::Phase => format!("=== {} ===", message),
            MessagePrefix::Success => format!("[SUCCESS] {}", message),
            MessagePrefix::Warning => format!("[WARNING] {}", message),
            MessagePrefix::Error => format!("[ERROR] {}", message),
            MessagePrefix::Stderr => format!("[stderr] {}", message),
        }
    }
}
