//! Media transcoding.
//!
//! Five primitives, each producing exactly one new [`MediaArtifact`]:
//! extract audio, cut a range, trim silence, overwrite a window and
//! replace a video's audio stream. Callers describe the work with a
//! [`TranscodeOp`]; the [`Transcoder`] turns it into a tool invocation.

mod ffmpeg;
mod ops;

pub use ffmpeg::{build_args, FfmpegTranscoder};
pub use ops::TranscodeOp;

use std::path::Path;

use crate::artifact::MediaArtifact;
use crate::config::ExtractionSettings;
use crate::tools::{ToolResult, ToolScope};

/// Performs transcoding operations.
///
/// Implementors provide [`run`](Transcoder::run) and
/// [`probe_duration`](Transcoder::probe_duration); the named operations are
/// thin wrappers building the matching descriptor. A failed call must not
/// leave its output file behind.
pub trait Transcoder: Send + Sync {
    /// Execute one operation into a freshly allocated artifact.
    fn run(&self, scope: &ToolScope<'_>, op: &TranscodeOp<'_>) -> ToolResult<MediaArtifact>;

    /// Duration of a media file in seconds.
    fn probe_duration(&self, scope: &ToolScope<'_>, path: &Path) -> ToolResult<f64>;

    fn extract_audio(
        &self,
        scope: &ToolScope<'_>,
        video: &Path,
        extraction: ExtractionSettings,
    ) -> ToolResult<MediaArtifact> {
        self.run(scope, &TranscodeOp::ExtractAudio { video, extraction })
    }

    fn cut_range(
        &self,
        scope: &ToolScope<'_>,
        audio: &Path,
        start_secs: f64,
        end_secs: f64,
    ) -> ToolResult<MediaArtifact> {
        self.run(
            scope,
            &TranscodeOp::CutRange {
                audio,
                start_secs,
                end_secs,
            },
        )
    }

    fn trim_silence(
        &self,
        scope: &ToolScope<'_>,
        audio: &Path,
        threshold_db: f64,
    ) -> ToolResult<MediaArtifact> {
        self.run(
            scope,
            &TranscodeOp::TrimSilence {
                audio,
                threshold_db,
            },
        )
    }

    /// Splice `foreground` into `background` at `offset_secs`. The window
    /// length is the foreground's own duration.
    fn overwrite_window(
        &self,
        scope: &ToolScope<'_>,
        foreground: &Path,
        background: &Path,
        offset_secs: f64,
    ) -> ToolResult<MediaArtifact> {
        let foreground_duration_secs = self.probe_duration(scope, foreground)?;
        self.run(
            scope,
            &TranscodeOp::OverwriteWindow {
                foreground,
                background,
                offset_secs,
                foreground_duration_secs,
            },
        )
    }

    fn mux_replace_audio(
        &self,
        scope: &ToolScope<'_>,
        video: &Path,
        audio: &Path,
    ) -> ToolResult<MediaArtifact> {
        self.run(scope, &TranscodeOp::MuxReplaceAudio { video, audio })
    }
}
