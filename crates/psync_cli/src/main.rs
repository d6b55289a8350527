//! pumpsync - command line entry point
//!
//! Replaces the music in a background video with a cleaner recording of the
//! same music fetched from a link.
//!
//! **Usage:**
//! ```bash
//! pumpsync --background gameplay.mp4 --link https://youtu.be/... --output synced.mp4
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::Parser;

use psync_core::config::{ConfigManager, Settings};
use psync_core::logging::{init_tracing, LogConfig, LogLevel};
use psync_core::{ErrorKind, SyncOrchestrator};

/// Overwrite the audio of a video with music from a link
#[derive(Parser, Debug)]
#[command(name = "pumpsync", version)]
#[command(about = "Overwrite the audio of a video with music from a link")]
struct Args {
    /// Path to the video containing the gameplay
    #[arg(short = 'b', long, visible_alias = "bg", value_name = "VIDEO")]
    background: PathBuf,

    /// Link to the video with the high-quality recording of the music
    #[arg(short, long, value_name = "URL")]
    link: String,

    /// Where to write the modified background video
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Settings file (default: <config dir>/pumpsync/settings.toml)
    #[arg(long, value_name = "FILE", env = "PUMPSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Log debug output, including external tool output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_tracing(if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    });

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("pumpsync: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    let settings = load_settings(args.config.as_deref())?;

    tracing::info!("pumpsync {} starting", psync_core::version());

    let log_config = if args.verbose {
        LogConfig::debug()
    } else {
        LogConfig::from_env()
    };
    let orchestrator = SyncOrchestrator::new(settings).with_log_config(log_config);

    let result = match orchestrator.synchronize(&args.background, &args.link) {
        Ok(path) => path,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("pumpsync: {}: {}", e.kind, e.message);
            return Ok(exit_code_for(e.kind));
        }
    };

    move_into_place(&result, &args.output).with_context(|| {
        format!(
            "failed to move result {} to {}",
            result.display(),
            args.output.display()
        )
    })?;

    tracing::info!("Wrote {}", args.output.display());
    Ok(ExitCode::SUCCESS)
}

/// Load settings from `explicit`, or from the default location.
///
/// A broken explicit file is an error; a broken default file falls back to
/// built-in defaults with a warning.
fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let (path, is_explicit) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (default_config_path(), false),
    };

    let mut manager = ConfigManager::new(&path);
    match manager.load_or_create() {
        Ok(()) => {
            tracing::debug!("Config: {}", path.display());
            if let Err(e) = manager.ensure_dirs_exist() {
                tracing::warn!("Failed to create configured directories: {}", e);
            }
            Ok(manager.into_settings())
        }
        Err(e) if is_explicit => {
            Err(e).with_context(|| format!("cannot load settings from {}", path.display()))
        }
        Err(e) => {
            tracing::warn!("Failed to load config {}: {}. Using defaults.", path.display(), e);
            Ok(Settings::default())
        }
    }
}

/// `<config dir>/pumpsync/settings.toml`, or `.config/settings.toml` when the
/// platform has no config directory.
fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("pumpsync"))
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("settings.toml")
}

/// Distinct exit status per failure kind.
fn exit_code_for(kind: ErrorKind) -> ExitCode {
    let code: u8 = match kind {
        ErrorKind::DownloadFailure => 2,
        ErrorKind::ExtractionFailure => 3,
        ErrorKind::LowConfidenceMatch => 4,
        ErrorKind::TranscodeFailure => 5,
        ErrorKind::CorrelationFailure => 6,
        ErrorKind::ArtifactIoFailure => 7,
    };
    ExitCode::from(code)
}

/// Move `from` to `to`, copying across filesystems.
///
/// `from` is gone afterwards whether or not the move succeeded.
fn move_into_place(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    let copied = fs::copy(from, to);
    let removed = fs::remove_file(from);
    match (copied, removed) {
        (Ok(_), Ok(())) => Ok(()),
        (Ok(_), Err(e)) => {
            tracing::warn!("Result copied but {} was not removed: {}", from.display(), e);
            Ok(())
        }
        (Err(e), _) => {
            let _ = fs::remove_file(to);
            Err(e)
        }
    }
}
