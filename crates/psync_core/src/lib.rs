//! psync core - audio synchronization pipeline for pumpsync
//!
//! Replaces the audio of a background video with a cleaner recording of the
//! same music fetched from a link. This crate contains the pipeline and its
//! adapters for yt-dlp, ffmpeg and `locate_audio`, with no CLI dependencies.

pub mod artifact;
pub mod config;
pub mod correlate;
pub mod download;
pub mod focus;
pub mod logging;
pub mod orchestrator;
pub mod tools;
pub mod transcode;

#[cfg(test)]
mod testing;

pub use orchestrator::{ClassifiedError, ErrorKind, SyncOrchestrator, SyncOutput, SyncReport};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
