//! Error types for the synchronization pipeline.
//!
//! Errors carry context that chains through layers:
//! Run → Phase → Tool → Detail
//!
//! Adapters return [`ToolError`]; steps wrap it in a [`StepError`] tagged with
//! the kind the step stands for; the pipeline turns that into the single
//! [`ClassifiedError`] the caller sees.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tools::ToolError;

use super::types::SyncPhase;

/// Fatal error kinds surfaced to the caller.
///
/// A missing delimiter match is not among them: it is a normal focus outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The source link could not be fetched within constraints.
    DownloadFailure,
    /// Audio could not be demuxed from a video input.
    ExtractionFailure,
    /// The final correlation score is below the acceptance threshold.
    LowConfidenceMatch,
    /// A transcoding primitive failed or produced unusable output.
    TranscodeFailure,
    /// The correlation utility failed or returned unparsable output.
    CorrelationFailure,
    /// A temporary file could not be created, moved or deleted.
    ArtifactIoFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::DownloadFailure => "DownloadFailure",
            ErrorKind::ExtractionFailure => "ExtractionFailure",
            ErrorKind::LowConfidenceMatch => "LowConfidenceMatch",
            ErrorKind::TranscodeFailure => "TranscodeFailure",
            ErrorKind::CorrelationFailure => "CorrelationFailure",
            ErrorKind::ArtifactIoFailure => "ArtifactIOFailure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error from a single pipeline step.
#[derive(Error, Debug)]
pub enum StepError {
    /// An external tool call failed.
    #[error("{source}")]
    Tool {
        kind: ErrorKind,
        #[source]
        source: ToolError,
    },

    /// The final match did not clear the acceptance gate.
    #[error("Final match score {score:.2} is below the minimum of {minimum:.2}")]
    LowConfidence { score: f64, minimum: f64 },

    /// A precondition was not met.
    #[error("{message}")]
    Precondition { kind: ErrorKind, message: String },
}

impl StepError {
    pub fn tool(kind: ErrorKind, source: ToolError) -> Self {
        Self::Tool { kind, source }
    }

    pub fn precondition(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Precondition {
            kind,
            message: message.into(),
        }
    }

    /// Create an artifact I/O error.
    pub fn artifact_io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::tool(
            ErrorKind::ArtifactIoFailure,
            ToolError::artifact(operation, source),
        )
    }

    /// Kind reported to the caller.
    ///
    /// Temporary-file failures are reported as such whichever step hit them.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StepError::Tool { source, .. } if source.is_artifact_io() => {
                ErrorKind::ArtifactIoFailure
            }
            StepError::Tool { kind, .. } => *kind,
            StepError::LowConfidence { .. } => ErrorKind::LowConfidenceMatch,
            StepError::Precondition { kind, .. } => *kind,
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// The one error a synchronization run returns.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{kind} during {phase}: {message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    /// Phase that was running when the run failed.
    pub phase: SyncPhase,
    /// Underlying failure, rendered.
    pub message: String,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, phase: SyncPhase, message: impl Into<String>) -> Self {
        Self {
            kind,
            phase,
            message: message.into(),
        }
    }

    /// Classify a step failure raised while `phase` was running.
    pub fn from_step(phase: SyncPhase, error: &StepError) -> Self {
        Self::new(error.kind(), phase, error.to_string())
    }
}

/// Result type for a whole run.
pub type SyncResult<T> = Result<T, ClassifiedError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn tool_errors_keep_step_kind() {
        let err = StepError::tool(
            ErrorKind::DownloadFailure,
            ToolError::command_failed("yt-dlp", 1, "HTTP Error 404"),
        );
        assert_eq!(err.kind(), ErrorKind::DownloadFailure);
        assert!(err.to_string().contains("HTTP Error 404"));
    }

    #[test]
    fn artifact_failures_override_step_kind() {
        let err = StepError::tool(
            ErrorKind::TranscodeFailure,
            ToolError::artifact("allocating ffmpeg_cut output", io::Error::other("disk full")),
        );
        assert_eq!(err.kind(), ErrorKind::ArtifactIoFailure);
    }

    #[test]
    fn classified_error_displays_context() {
        let step = StepError::LowConfidence {
            score: 3.0,
            minimum: 6.0,
        };
        let err = ClassifiedError::from_step(SyncPhase::LocatingFinal, &step);
        assert_eq!(err.kind, ErrorKind::LowConfidenceMatch);

        let msg = err.to_string();
        assert!(msg.starts_with("LowConfidenceMatch during LocatingFinal"));
        assert!(msg.contains("3.00"));
    }
}
