//! Per-run logger with file and callback output.
//!
//! Each synchronization run gets its own logger that:
//! - Optionally writes to a dedicated log file
//! - Sends messages to a caller callback (if provided)
//! - Mirrors every message into `tracing` tagged with the run id
//! - Keeps a tail buffer of external tool output for failure diagnosis

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

/// Logger owned by a single synchronization run.
pub struct RunLogger {
    run_id: String,
    log_path: Option<PathBuf>,
    file_writer: Mutex<Option<BufWriter<File>>>,
    callback: Option<LogCallback>,
    config: LogConfig,
    /// Recent tool output lines, dumped when a stage fails.
    tail_buffer: Mutex<VecDeque<String>>,
}

impl RunLogger {
    /// Create a logger that writes `<log_dir>/<run_id>.log`.
    pub fn with_file(
        run_id: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let run_id = run_id.into();
        let log_dir = log_dir.as_ref();

        fs::create_dir_all(log_dir)?;

        let log_path = log_dir.join(format!("{}.log", sanitize_filename(&run_id)));
        let file = File::create(&log_path)?;

        let mut logger = Self::detached(run_id, config, callback);
        logger.log_path = Some(log_path);
        logger.file_writer = Mutex::new(Some(BufWriter::new(file)));
        Ok(logger)
    }

    /// Create a logger without a log file.
    pub fn detached(
        run_id: impl Into<String>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> Self {
        let tail_capacity = config.error_tail;
        Self {
            run_id: run_id.into(),
            log_path: None,
            file_writer: Mutex::new(None),
            callback,
            config,
            tail_buffer: Mutex::new(VecDeque::with_capacity(tail_capacity)),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Path of the log file, when one is written.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }

        self.emit_tracing(level, message);

        let formatted = self.format_message(message);
        self.output(&formatted);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        let msg = MessagePrefix::Warning.format(message);
        self.log(LogLevel::Warn, &msg);
    }

    pub fn error(&self, message: &str) {
        let msg = MessagePrefix::Error.format(message);
        self.log(LogLevel::Error, &msg);
    }

    /// Log an external command about to run.
    pub fn command(&self, command: &str) {
        let msg = MessagePrefix::Command.format(command);
        self.log(LogLevel::Info, &msg);
    }

    /// Log a state machine transition.
    pub fn phase(&self, phase_name: &str) {
        let msg = MessagePrefix::Phase.format(phase_name);
        self.log(LogLevel::Info, &msg);
    }

    pub fn success(&self, message: &str) {
        let msg = MessagePrefix::Success.format(message);
        self.log(LogLevel::Info, &msg);
    }

    /// Record a line of tool output.
    ///
    /// Lines always go to the tail buffer; they are only echoed when
    /// `echo_tool_output` is enabled.
    pub fn output_line(&self, line: &str) {
        {
            let mut buffer = self.tail_buffer.lock();
            if self.config.error_tail > 0 && buffer.len() >= self.config.error_tail {
                buffer.pop_front();
            }
            if self.config.error_tail > 0 {
                buffer.push_back(line.to_string());
            }
        }

        if !self.config.echo_tool_output {
            return;
        }

        let msg = MessagePrefix::Stderr.format(line);
        self.log(LogLevel::Debug, &msg);
    }

    /// Dump the tail buffer (typically after a tool failed).
    pub fn show_tail(&self, header: &str) {
        let lines = self.get_tail();
        if lines.is_empty() {
            return;
        }

        self.output(&self.format_message(&format!("[{}/tail]", header)));
        for line in &lines {
            self.output(&self.format_message(line));
        }
    }

    pub fn clear_tail(&self) {
        self.tail_buffer.lock().clear();
    }

    pub fn get_tail(&self) -> Vec<String> {
        self.tail_buffer.lock().iter().cloned().collect()
    }

    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    /// Flush and release the log file.
    pub fn close(&self) {
        self.flush();
        *self.file_writer.lock() = None;
    }

    fn emit_tracing(&self, level: LogLevel, message: &str) {
        let run = self.run_id.as_str();
        match level {
            LogLevel::Trace => tracing::trace!(run = %run, "{}", message),
            LogLevel::Debug => tracing::debug!(run = %run, "{}", message),
            LogLevel::Info => tracing::info!(run = %run, "{}", message),
            LogLevel::Warn => tracing::warn!(run = %run, "{}", message),
            LogLevel::Error => tracing::error!(run = %run, "{}", message),
        }
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S");
            format!("[{}] {}", timestamp, message)
        } else {
            message.to_string()
        }
    }

    /// Write a formatted line to the file and the callback.
    fn output(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }

        if let Some(ref callback) = self.callback {
            callback(formatted);
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Sanitize a string to be safe for use as a filename.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn quiet_config() -> LogConfig {
        LogConfig {
            show_timestamps: false,
            ..LogConfig::default()
        }
    }

    #[test]
    fn creates_log_file() {
        let dir = tempdir().unwrap();
        let logger = RunLogger::with_file("run-1", dir.path(), quiet_config(), None).unwrap();

        let path = logger.log_path().unwrap();
        assert!(path.exists());
        assert!(path.to_string_lossy().ends_with("run-1.log"));
    }

    #[test]
    fn writes_to_file() {
        let dir = tempdir().unwrap();
        let logger = RunLogger::with_file("run-1", dir.path(), quiet_config(), None).unwrap();

        logger.phase("Downloading");
        logger.command("yt-dlp https://example.com/v");
        logger.flush();

        let content = fs::read_to_string(logger.log_path().unwrap()).unwrap();
        assert!(content.contains("=== Downloading ==="));
        assert!(content.contains("$ yt-dlp https://example.com/v"));
    }

    #[test]
    fn detached_logger_has_no_file() {
        let logger = RunLogger::detached("run-2", quiet_config(), None);
        assert!(logger.log_path().is_none());
        logger.info("goes nowhere but tracing");
    }

    #[test]
    fn calls_callback_and_respects_level() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let callback: LogCallback = Box::new(move |_msg| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        let logger = RunLogger::detached("run-3", quiet_config(), Some(callback));
        logger.info("one");
        logger.debug("filtered at info level");
        logger.warn("two");

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn tool_output_only_buffered_unless_echoed() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let callback: LogCallback = Box::new(move |_msg| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        let logger = RunLogger::detached("run-4", quiet_config(), Some(callback));
        logger.output_line("ffmpeg version n6.1");

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(logger.get_tail(), vec!["ffmpeg version n6.1"]);

        logger.show_tail("ffmpeg");
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn tail_buffer_maintains_limit() {
        let config = LogConfig {
            error_tail: 5,
            ..quiet_config()
        };
        let logger = RunLogger::detached("run-5", config, None);

        for i in 0..10 {
            logger.output_line(&format!("Line {}", i));
        }

        let tail = logger.get_tail();
        assert_eq!(tail.len(), 5);
        assert_eq!(tail[0], "Line 5");
        assert_eq!(tail[4], "Line 9");

        logger.clear_tail();
        assert!(logger.get_tail().is_empty());
    }

    #[test]
    fn sanitizes_filename() {
        assert_eq!(sanitize_filename("normal_name"), "normal_name");
        assert_eq!(sanitize_filename("has/slash"), "has_slash");
        assert_eq!(sanitize_filename("a<b>c"), "a_b_c");
    }
}
