//! Core types for the synchronization pipeline.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::artifact::{ArtifactStore, MediaArtifact};
use crate::config::Settings;
use crate::correlate::{CorrelationResult, Correlator, LocateAudio};
use crate::download::{Downloader, YtDlp};
use crate::focus::{FocusDetector, FocusOutcome};
use crate::logging::RunLogger;
use crate::tools::ToolScope;
use crate::transcode::{FfmpegTranscoder, Transcoder};

use super::errors::{ErrorKind, StepError, StepResult};

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (phase, percent_complete, message)
pub type ProgressCallback = Arc<dyn Fn(SyncPhase, u32, &str) + Send + Sync>;

/// States of one synchronization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncPhase {
    Downloading,
    ExtractingBackground,
    ExtractingForeground,
    Focusing,
    LocatingFinal,
    Overwriting,
    Muxing,
    Done,
    /// Absorbing failure state.
    Failed(ErrorKind),
}

impl SyncPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SyncPhase::Downloading => "Downloading",
            SyncPhase::ExtractingBackground => "ExtractingBackground",
            SyncPhase::ExtractingForeground => "ExtractingForeground",
            SyncPhase::Focusing => "Focusing",
            SyncPhase::LocatingFinal => "LocatingFinal",
            SyncPhase::Overwriting => "Overwriting",
            SyncPhase::Muxing => "Muxing",
            SyncPhase::Done => "Done",
            SyncPhase::Failed(_) => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncPhase::Done | SyncPhase::Failed(_))
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::Failed(kind) => write!(f, "Failed({})", kind),
            other => f.write_str(other.name()),
        }
    }
}

/// The three external collaborators of a run.
#[derive(Clone)]
pub struct Toolset {
    pub downloader: Arc<dyn Downloader>,
    pub transcoder: Arc<dyn Transcoder>,
    pub correlator: Arc<dyn Correlator>,
}

impl Toolset {
    pub fn new(
        downloader: Arc<dyn Downloader>,
        transcoder: Arc<dyn Transcoder>,
        correlator: Arc<dyn Correlator>,
    ) -> Self {
        Self {
            downloader,
            transcoder,
            correlator,
        }
    }

    /// yt-dlp, ffmpeg/ffprobe and locate_audio as configured.
    pub fn from_settings(settings: &Settings) -> Self {
        let tools = &settings.tools;
        Self::new(
            Arc::new(YtDlp::new(&tools.yt_dlp, settings.download.clone())),
            Arc::new(FfmpegTranscoder::new(&tools.ffmpeg, &tools.ffprobe)),
            Arc::new(LocateAudio::new(&tools.locate_audio)),
        )
    }
}

/// Read-only context passed to pipeline steps.
///
/// Mutable state goes in [`RunState`].
pub struct Context<'a> {
    /// Local video whose audio gets replaced.
    pub background_video: &'a Path,
    /// Link to the source of the better audio.
    pub link: &'a str,
    pub settings: &'a Settings,
    pub tools: &'a Toolset,
    pub focus: &'a FocusDetector,
    /// Where this run's temporary files live.
    pub artifacts: ArtifactStore,
    /// Per-run logger.
    pub logger: Arc<RunLogger>,
    progress_callback: Option<ProgressCallback>,
}

impl<'a> Context<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        background_video: &'a Path,
        link: &'a str,
        settings: &'a Settings,
        tools: &'a Toolset,
        focus: &'a FocusDetector,
        artifacts: ArtifactStore,
        logger: Arc<RunLogger>,
    ) -> Self {
        Self {
            background_video,
            link,
            settings,
            tools,
            focus,
            artifacts,
            logger,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress_callback = callback;
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, phase: SyncPhase, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(phase, percent, message);
        }
    }

    /// Resources handed to every tool call.
    pub fn scope(&self) -> ToolScope<'_> {
        ToolScope::new(&self.artifacts, &self.logger)
    }
}

/// Mutable run state accumulated by the steps.
///
/// Every artifact slot owns its file. Steps take the inputs they consume and
/// release them once their own output exists; whatever is still held when the
/// run fails is deleted by [`RunState::discard_artifacts`].
#[derive(Debug, Default)]
pub struct RunState {
    pub run_id: String,
    pub started_at: String,
    /// Phases entered so far, in order.
    pub phases: Vec<SyncPhase>,

    pub foreground_video: Option<MediaArtifact>,
    pub background_audio: Option<MediaArtifact>,
    pub foreground_audio: Option<MediaArtifact>,
    pub focused_audio: Option<MediaArtifact>,
    pub mixed_audio: Option<MediaArtifact>,
    pub result_video: Option<MediaArtifact>,

    pub focus: Option<FocusOutcome>,
    pub final_match: Option<CorrelationResult>,
}

impl RunState {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: chrono::Local::now().to_rfc3339(),
            ..Default::default()
        }
    }

    pub fn enter(&mut self, phase: SyncPhase) {
        self.phases.push(phase);
    }

    pub fn current_phase(&self) -> Option<SyncPhase> {
        self.phases.last().copied()
    }

    /// Number of artifacts currently owned by the run.
    pub fn held_artifacts(&self) -> usize {
        self.slots().iter().filter(|slot| slot.is_some()).count()
    }

    /// Delete every artifact still held. Returns how many were removed.
    ///
    /// Deletion errors are logged, not returned: the run has already failed
    /// and its original error is the one reported.
    pub fn discard_artifacts(&mut self, logger: &RunLogger) -> usize {
        let mut removed = 0;
        for slot in self.slots_mut() {
            if let Some(artifact) = slot.take() {
                let path = artifact.path().to_path_buf();
                match artifact.release() {
                    Ok(()) => removed += 1,
                    Err(e) => logger.warn(&format!(
                        "Could not remove temporary file {}: {}",
                        path.display(),
                        e
                    )),
                }
            }
        }
        removed
    }

    fn slots(&self) -> [&Option<MediaArtifact>; 6] {
        [
            &self.foreground_video,
            &self.background_audio,
            &self.foreground_audio,
            &self.focused_audio,
            &self.mixed_audio,
            &self.result_video,
        ]
    }

    fn slots_mut(&mut self) -> [&mut Option<MediaArtifact>; 6] {
        [
            &mut self.foreground_video,
            &mut self.background_audio,
            &mut self.foreground_audio,
            &mut self.focused_audio,
            &mut self.mixed_audio,
            &mut self.result_video,
        ]
    }
}

/// Borrow a required artifact from an earlier phase.
pub fn required<'s>(
    slot: &'s Option<MediaArtifact>,
    what: &str,
    kind: ErrorKind,
) -> StepResult<&'s MediaArtifact> {
    slot.as_ref()
        .ok_or_else(|| StepError::precondition(kind, format!("{} is not available", what)))
}

/// Delete a consumed artifact, reporting failure.
pub fn release(slot: &mut Option<MediaArtifact>, what: &str) -> StepResult<()> {
    match slot.take() {
        Some(artifact) => artifact
            .release()
            .map_err(|e| StepError::artifact_io(format!("removing {}", what), e)),
        None => Ok(()),
    }
}

/// What a successful run decided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: String,
    pub focus: FocusOutcome,
    pub final_offset_secs: f64,
    pub final_score: f64,
    pub phases: Vec<SyncPhase>,
}

/// Output of a successful run. The caller owns the file at `path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOutput {
    pub path: std::path::PathBuf,
    pub report: SyncReport,
}
