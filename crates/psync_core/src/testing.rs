//! Scripted stand-ins for the external tools, shared by unit tests.

use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::artifact::{ArtifactStage, ArtifactStore, MediaArtifact};
use crate::correlate::{CorrelationResult, Correlator};
use crate::download::{enforce_download_limits, validate_link, Downloader};
use crate::logging::{LogConfig, RunLogger};
use crate::tools::{require_input, ToolError, ToolResult, ToolScope};
use crate::transcode::{TranscodeOp, Transcoder};

/// Which needle a scripted correlation answers for.
#[derive(Debug, Clone)]
pub enum Needle {
    /// A fixed file, such as a delimiter signal.
    Path(PathBuf),
    /// Any artifact produced by this stage.
    Stage(ArtifactStage),
}

impl Needle {
    fn matches(&self, path: &Path) -> bool {
        match self {
            Needle::Path(p) => p == path,
            Needle::Stage(stage) => path
                .file_name()
                .map(|n| {
                    n.to_string_lossy()
                        .ends_with(&format!("_{}.{}", stage.tag(), stage.extension()))
                })
                .unwrap_or(false),
        }
    }
}

/// Correlator answering from a fixed script.
#[derive(Default)]
pub struct ScriptedCorrelator {
    script: Vec<(Needle, CorrelationResult)>,
    failing: Option<Needle>,
    calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl ScriptedCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, needle: Needle, result: CorrelationResult) -> Self {
        self.script.push((needle, result));
        self
    }

    pub fn fail_on(mut self, needle: Needle) -> Self {
        self.failing = Some(needle);
        self
    }

    pub fn calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.calls.lock().clone()
    }

    pub fn needles(&self) -> Vec<PathBuf> {
        self.calls.lock().iter().map(|(_, n)| n.clone()).collect()
    }
}

impl Correlator for ScriptedCorrelator {
    fn locate(
        &self,
        _scope: &ToolScope<'_>,
        haystack: &Path,
        needle: &Path,
    ) -> ToolResult<CorrelationResult> {
        require_input(haystack)?;
        self.calls
            .lock()
            .push((haystack.to_path_buf(), needle.to_path_buf()));

        if self.failing.as_ref().is_some_and(|n| n.matches(needle)) {
            return Err(ToolError::command_failed("locate_audio", 1, "scripted failure"));
        }

        Ok(self
            .script
            .iter()
            .find(|(n, _)| n.matches(needle))
            .map(|(_, r)| *r)
            .unwrap_or_default())
    }
}

/// One recorded transcoder call.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Extract(PathBuf),
    Cut { input: PathBuf, start: f64, end: f64 },
    Trim(PathBuf),
    Overwrite { foreground: PathBuf, offset: f64 },
    Mux { video: PathBuf },
}

/// Transcoder that writes small placeholder files.
pub struct FakeTranscoder {
    duration_secs: f64,
    failing: Option<ArtifactStage>,
    failing_input: Option<Needle>,
    calls: Mutex<Vec<Recorded>>,
}

impl Default for FakeTranscoder {
    fn default() -> Self {
        Self {
            duration_secs: 40.0,
            failing: None,
            failing_input: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(mut self, stage: ArtifactStage) -> Self {
        self.failing = Some(stage);
        self
    }

    /// Fail any operation reading an input that matches `input`.
    pub fn fail_on_input(mut self, input: Needle) -> Self {
        self.failing_input = Some(input);
        self
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().clone()
    }
}

impl Transcoder for FakeTranscoder {
    fn run(&self, scope: &ToolScope<'_>, op: &TranscodeOp<'_>) -> ToolResult<MediaArtifact> {
        op.validate().map_err(ToolError::InvalidInput)?;
        for input in op.inputs() {
            require_input(input)?;
        }

        let recorded = match *op {
            TranscodeOp::ExtractAudio { video, .. } => Recorded::Extract(video.to_path_buf()),
            TranscodeOp::CutRange {
                audio,
                start_secs,
                end_secs,
            } => Recorded::Cut {
                input: audio.to_path_buf(),
                start: start_secs,
                end: end_secs,
            },
            TranscodeOp::TrimSilence { audio, .. } => Recorded::Trim(audio.to_path_buf()),
            TranscodeOp::OverwriteWindow {
                foreground,
                offset_secs,
                ..
            } => Recorded::Overwrite {
                foreground: foreground.to_path_buf(),
                offset: offset_secs,
            },
            TranscodeOp::MuxReplaceAudio { video, .. } => Recorded::Mux {
                video: video.to_path_buf(),
            },
        };
        self.calls.lock().push(recorded);

        let reads_failing_input = self
            .failing_input
            .as_ref()
            .is_some_and(|n| op.inputs().iter().any(|p| n.matches(p)));

        let artifact = scope.allocate(op.stage())?;
        if self.failing == Some(op.stage()) || reads_failing_input {
            return Err(ToolError::command_failed("ffmpeg", 1, "scripted failure"));
        }

        let mut file = std::fs::File::create(artifact.path())
            .map_err(|e| ToolError::artifact("writing fake output", e))?;
        writeln!(file, "{}", op).map_err(|e| ToolError::artifact("writing fake output", e))?;

        Ok(artifact)
    }

    fn probe_duration(&self, _scope: &ToolScope<'_>, path: &Path) -> ToolResult<f64> {
        require_input(path)?;
        Ok(self.duration_secs)
    }
}

/// Downloader producing a sparse file of a given size.
pub struct FakeDownloader {
    size_bytes: u64,
    max_bytes: u64,
    calls: Mutex<usize>,
}

impl FakeDownloader {
    pub fn new(size_bytes: u64, max_bytes: u64) -> Self {
        Self {
            size_bytes,
            max_bytes,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

impl Downloader for FakeDownloader {
    fn fetch(&self, scope: &ToolScope<'_>, link: &str) -> ToolResult<MediaArtifact> {
        validate_link(link)?;
        *self.calls.lock() += 1;

        let artifact = scope.allocate(ArtifactStage::Download)?;
        let file = std::fs::OpenOptions::new()
            .write(true)
            .open(artifact.path())
            .map_err(|e| ToolError::artifact("opening fake download", e))?;
        file.set_len(self.size_bytes)
            .map_err(|e| ToolError::artifact("sizing fake download", e))?;

        enforce_download_limits("yt-dlp", &artifact, self.max_bytes)?;
        Ok(artifact)
    }
}

/// Store and logger rooted in a temporary directory.
pub struct Workspace {
    pub dir: tempfile::TempDir,
    pub store: ArtifactStore,
    pub logger: RunLogger,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("tmp"), "test");
        let logger = RunLogger::detached("test", LogConfig::default(), None);
        Self { dir, store, logger }
    }

    pub fn scope(&self) -> ToolScope<'_> {
        ToolScope::new(&self.store, &self.logger)
    }

    /// Write a placeholder input file outside the artifact root.
    pub fn input(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, b"input").unwrap();
        path
    }

    /// Number of files currently under the artifact root.
    pub fn artifact_count(&self) -> usize {
        std::fs::read_dir(self.store.root())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
