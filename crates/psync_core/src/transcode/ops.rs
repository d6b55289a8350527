//! Transcoding operation descriptors.

use std::fmt;
use std::path::Path;

use crate::artifact::ArtifactStage;
use crate::config::ExtractionSettings;

/// One transcoder invocation, independent of the tool that performs it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TranscodeOp<'a> {
    /// Demux the audio stream of a video, resampled and downmixed.
    ExtractAudio {
        video: &'a Path,
        extraction: ExtractionSettings,
    },
    /// Keep only `[start_secs, end_secs)` of an audio file.
    CutRange {
        audio: &'a Path,
        start_secs: f64,
        end_secs: f64,
    },
    /// Strip leading and trailing audio quieter than `threshold_db`.
    TrimSilence { audio: &'a Path, threshold_db: f64 },
    /// Mute `background` over `[offset, offset + foreground_duration)` and
    /// mix in `foreground` delayed by `offset`.
    OverwriteWindow {
        foreground: &'a Path,
        background: &'a Path,
        offset_secs: f64,
        foreground_duration_secs: f64,
    },
    /// Replace the audio stream of a video, copying the video stream.
    MuxReplaceAudio { video: &'a Path, audio: &'a Path },
}

impl<'a> TranscodeOp<'a> {
    /// Stage tag of the artifact this operation produces.
    pub fn stage(&self) -> ArtifactStage {
        match self {
            TranscodeOp::ExtractAudio { .. } => ArtifactStage::ExtractAudio,
            TranscodeOp::CutRange { .. } => ArtifactStage::CutRange,
            TranscodeOp::TrimSilence { .. } => ArtifactStage::TrimSilence,
            TranscodeOp::OverwriteWindow { .. } => ArtifactStage::OverwriteWindow,
            TranscodeOp::MuxReplaceAudio { .. } => ArtifactStage::MuxReplaceAudio,
        }
    }

    /// Input files, in the order the tool reads them.
    pub fn inputs(&self) -> Vec<&'a Path> {
        match *self {
            TranscodeOp::ExtractAudio { video, .. } => vec![video],
            TranscodeOp::CutRange { audio, .. } => vec![audio],
            TranscodeOp::TrimSilence { audio, .. } => vec![audio],
            TranscodeOp::OverwriteWindow {
                foreground,
                background,
                ..
            } => vec![foreground, background],
            TranscodeOp::MuxReplaceAudio { video, audio } => vec![video, audio],
        }
    }

    /// Check numeric parameters before anything runs.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            TranscodeOp::ExtractAudio { extraction, .. } => {
                if extraction.sample_rate == 0 || extraction.channels == 0 {
                    return Err(format!(
                        "invalid extraction format {} Hz / {} channel(s)",
                        extraction.sample_rate, extraction.channels
                    ));
                }
            }
            TranscodeOp::CutRange {
                start_secs,
                end_secs,
                ..
            } => {
                if !start_secs.is_finite() || !end_secs.is_finite() || start_secs < 0.0 {
                    return Err(format!("invalid cut range {}..{}", start_secs, end_secs));
                }
                if end_secs <= start_secs {
                    return Err(format!(
                        "empty cut range {:.3}..{:.3}",
                        start_secs, end_secs
                    ));
                }
            }
            TranscodeOp::TrimSilence { threshold_db, .. } => {
                if !threshold_db.is_finite() {
                    return Err(format!("invalid silence threshold {}", threshold_db));
                }
            }
            TranscodeOp::OverwriteWindow {
                offset_secs,
                foreground_duration_secs,
                ..
            } => {
                if !offset_secs.is_finite() || offset_secs < 0.0 {
                    return Err(format!("invalid overwrite offset {}", offset_secs));
                }
                if !foreground_duration_secs.is_finite() || foreground_duration_secs < 0.0 {
                    return Err(format!(
                        "invalid foreground duration {}",
                        foreground_duration_secs
                    ));
                }
            }
            TranscodeOp::MuxReplaceAudio { .. } => {}
        }
        Ok(())
    }
}

impl fmt::Display for TranscodeOp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscodeOp::ExtractAudio { video, extraction } => write!(
                f,
                "extract audio from {} ({} Hz, {} ch)",
                video.display(),
                extraction.sample_rate,
                extraction.channels
            ),
            TranscodeOp::CutRange {
                audio,
                start_secs,
                end_secs,
            } => write!(
                f,
                "cut {} to {:.3}s..{:.3}s",
                audio.display(),
                start_secs,
                end_secs
            ),
            TranscodeOp::TrimSilence {
                audio,
                threshold_db,
            } => write!(f, "trim silence below {}dB from {}", threshold_db, audio.display()),
            TranscodeOp::OverwriteWindow {
                offset_secs,
                foreground_duration_secs,
                ..
            } => write!(
                f,
                "overwrite background at {:.3}s for {:.3}s",
                offset_secs, foreground_duration_secs
            ),
            TranscodeOp::MuxReplaceAudio { video, audio } => write!(
                f,
                "replace audio of {} with {}",
                video.display(),
                audio.display()
            ),
        }
    }
}
