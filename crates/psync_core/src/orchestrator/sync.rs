//! Entry point for synchronization runs.
//!
//! [`SyncOrchestrator`] holds everything that is shared between runs
//! (settings, tools, focus detector, pipeline) and builds a fresh
//! [`Context`]/[`RunState`] pair for every call. Runs share nothing else, so
//! several may execute concurrently from different threads.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::artifact::ArtifactStore;
use crate::config::Settings;
use crate::focus::FocusDetector;
use crate::logging::{LogCallback, LogConfig, RunLogger};

use super::errors::{ClassifiedError, ErrorKind, SyncResult};
use super::pipeline::SyncPipeline;
use super::types::{Context, ProgressCallback, RunState, SyncOutput, SyncPhase, SyncReport, Toolset};

/// Callback receiving every run log line.
pub type SharedLogCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Replaces a background video's audio with music from a linked source.
pub struct SyncOrchestrator {
    settings: Settings,
    tools: Toolset,
    focus: FocusDetector,
    pipeline: SyncPipeline,
    log_config: LogConfig,
    log_callback: Option<SharedLogCallback>,
    progress_callback: Option<ProgressCallback>,
}

impl SyncOrchestrator {
    /// Orchestrator using the external tools named in `settings`.
    pub fn new(settings: Settings) -> Self {
        let tools = Toolset::from_settings(&settings);
        Self::with_toolset(settings, tools)
    }

    /// Orchestrator using the given tool implementations.
    pub fn with_toolset(settings: Settings, tools: Toolset) -> Self {
        let focus = FocusDetector::from_settings(&settings);
        Self {
            settings,
            tools,
            focus,
            pipeline: SyncPipeline::standard(),
            log_config: LogConfig::from_env(),
            log_callback: None,
            progress_callback: None,
        }
    }

    pub fn with_log_config(mut self, config: LogConfig) -> Self {
        self.log_config = config;
        self
    }

    pub fn with_log_callback(mut self, callback: SharedLogCallback) -> Self {
        self.log_callback = Some(callback);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Produce a new video at a fresh temporary path.
    ///
    /// The caller owns the returned file and must delete it eventually.
    pub fn synchronize(&self, background_video: &Path, link: &str) -> SyncResult<PathBuf> {
        self.run(background_video, link).map(|output| output.path)
    }

    /// Like [`synchronize`](Self::synchronize), also returning what the run decided.
    pub fn run(&self, background_video: &Path, link: &str) -> SyncResult<SyncOutput> {
        let run_id = Uuid::new_v4().simple().to_string();
        let run_tag = &run_id[..12];

        let logger = Arc::new(self.create_logger(&run_id));
        logger.info(&format!(
            "Synchronizing {} with {}",
            background_video.display(),
            link
        ));

        let artifacts = ArtifactStore::new(self.settings.paths.resolved_temp_root(), run_tag);
        let ctx = Context::new(
            background_video,
            link,
            &self.settings,
            &self.tools,
            &self.focus,
            artifacts,
            Arc::clone(&logger),
        )
        .with_progress_callback(self.progress_callback.clone());

        let mut state = RunState::new(&run_id);
        let result = self
            .pipeline
            .run(&ctx, &mut state)
            .and_then(|()| Self::finish(&ctx, &mut state));

        match &result {
            Ok(output) => logger.success(&format!("Result written to {}", output.path.display())),
            Err(e) => logger.error(&format!("Synchronization failed: {}", e)),
        }
        logger.close();

        result
    }

    /// Hand the result video to the caller and assemble the report.
    fn finish(ctx: &Context<'_>, state: &mut RunState) -> SyncResult<SyncOutput> {
        let video = state.result_video.take();
        let decision = state.focus.clone().zip(state.final_match);

        let (Some(video), Some((focus, final_match))) = (video, decision) else {
            state.discard_artifacts(&ctx.logger);
            return Err(ClassifiedError::new(
                ErrorKind::ArtifactIoFailure,
                SyncPhase::Muxing,
                "run finished without a result video",
            ));
        };

        let path = video.into_output().map_err(|e| {
            ClassifiedError::new(
                ErrorKind::ArtifactIoFailure,
                SyncPhase::Muxing,
                format!("could not keep result video: {}", e),
            )
        })?;

        Ok(SyncOutput {
            path,
            report: SyncReport {
                run_id: state.run_id.clone(),
                focus,
                final_offset_secs: final_match.offset_secs,
                final_score: final_match.score,
                phases: state.phases.clone(),
            },
        })
    }

    fn create_logger(&self, run_id: &str) -> RunLogger {
        if self.settings.paths.write_run_logs {
            let log_dir = PathBuf::from(&self.settings.paths.logs_folder);
            match RunLogger::with_file(
                run_id,
                &log_dir,
                self.log_config.clone(),
                self.run_log_callback(),
            ) {
                Ok(logger) => return logger,
                Err(e) => tracing::warn!(
                    "Cannot write run log under {}: {}",
                    log_dir.display(),
                    e
                ),
            }
        }

        RunLogger::detached(run_id, self.log_config.clone(), self.run_log_callback())
    }

    fn run_log_callback(&self) -> Option<LogCallback> {
        self.log_callback.as_ref().map(|cb| {
            let cb = Arc::clone(cb);
            Box::new(move |line: &str| cb(line)) as LogCallback
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactStage;
    use crate::correlate::CorrelationResult;
    use crate::focus::{DelimiterPair, FocusOutcome};
    use crate::logging::init_test_tracing;
    use crate::testing::{
        FakeDownloader, FakeTranscoder, Needle, Recorded, ScriptedCorrelator,
    };
    use parking_lot::Mutex;

    const MIB: u64 = 1024 * 1024;
    const LINK: &str = "https://www.youtube.com/watch?v=abc";

    struct Harness {
        dir: tempfile::TempDir,
        background: PathBuf,
        settings: Settings,
    }

    impl Harness {
        fn new() -> Self {
            init_test_tracing();
            let dir = tempfile::tempdir().unwrap();
            let background = dir.path().join("gameplay.mp4");
            std::fs::write(&background, b"background video").unwrap();

            let mut settings = Settings::default();
            settings.paths.temp_root = Some(dir.path().join("tmp"));
            settings.paths.write_run_logs = false;
            settings.delimiters = vec![
                DelimiterPair::new("XX", "res/xx_start.wav", "res/xx_end.wav"),
                DelimiterPair::new("Phoenix", "res/phoenix_start.wav", "res/phoenix_end.wav"),
            ];

            Self {
                dir,
                background,
                settings,
            }
        }

        fn temp_root(&self) -> PathBuf {
            self.dir.path().join("tmp")
        }

        fn temp_files(&self) -> usize {
            std::fs::read_dir(self.temp_root())
                .map(|entries| entries.count())
                .unwrap_or(0)
        }

        fn orchestrator(
            &self,
            downloader: Arc<FakeDownloader>,
            transcoder: Arc<FakeTranscoder>,
            correlator: Arc<ScriptedCorrelator>,
        ) -> SyncOrchestrator {
            SyncOrchestrator::with_toolset(
                self.settings.clone(),
                Toolset::new(downloader, transcoder, correlator),
            )
            .with_log_config(LogConfig::default())
        }
    }

    fn path(p: &str) -> Needle {
        Needle::Path(PathBuf::from(p))
    }

    fn small_download() -> Arc<FakeDownloader> {
        Arc::new(FakeDownloader::new(4096, 512 * MIB))
    }

    /// Phoenix matches at (25, 18); XX does not.
    fn phoenix_correlator(final_score: f64) -> ScriptedCorrelator {
        ScriptedCorrelator::new()
            .answer(path("res/xx_start.wav"), CorrelationResult::new(3.0, 4.0, 2.0))
            .answer(path("res/xx_end.wav"), CorrelationResult::new(60.0, 2.0, 2.0))
            .answer(
                path("res/phoenix_start.wav"),
                CorrelationResult::new(10.0, 25.0, 2.0),
            )
            .answer(
                path("res/phoenix_end.wav"),
                CorrelationResult::new(53.0, 18.0, 2.0),
            )
            .answer(
                Needle::Stage(ArtifactStage::TrimSilence),
                CorrelationResult::new(95.25, final_score, 40.0),
            )
    }

    #[test]
    fn matched_delimiter_reaches_done() {
        let h = Harness::new();
        let transcoder = Arc::new(FakeTranscoder::new());
        let correlator = Arc::new(phoenix_correlator(9.0));
        let orchestrator =
            h.orchestrator(small_download(), Arc::clone(&transcoder), Arc::clone(&correlator));

        let output = orchestrator.run(&h.background, LINK).unwrap();

        let m = output.report.focus.matched().unwrap();
        assert_eq!(m.delimiter_key, "Phoenix");
        assert_eq!((m.left_cut_secs, m.right_cut_secs), (12.5, 52.5));
        assert_eq!(output.report.final_offset_secs, 95.25);
        assert_eq!(output.report.final_score, 9.0);
        assert_eq!(output.report.phases.last(), Some(&SyncPhase::Done));
        assert_eq!(output.report.phases.len(), 8);

        // The window is placed where the final correlation found it.
        let calls = transcoder.calls();
        assert!(calls.iter().any(|c| matches!(
            c,
            Recorded::Overwrite { offset, .. } if *offset == 95.25
        )));
        assert!(matches!(calls.last(), Some(Recorded::Mux { video }) if *video == h.background));

        // Final locate compares background audio against the trimmed excerpt.
        let (haystack, needle) = correlator.calls().last().cloned().unwrap();
        assert!(haystack.to_string_lossy().ends_with("_ffmpeg_extract.wav"));
        assert!(needle.to_string_lossy().ends_with("_ffmpeg_trim.wav"));

        assert!(output.path.exists());
        assert!(output.path.starts_with(h.temp_root()));
        assert_eq!(h.temp_files(), 1);
    }

    #[test]
    fn unmatched_fallback_with_low_final_score_fails() {
        let h = Harness::new();
        let transcoder = Arc::new(FakeTranscoder::new());
        let correlator = Arc::new(
            ScriptedCorrelator::new()
                .answer(path("res/xx_start.wav"), CorrelationResult::new(4.0, 25.0, 2.0))
                .answer(path("res/xx_end.wav"), CorrelationResult::new(50.0, 10.0, 2.0))
                .answer(
                    path("res/phoenix_start.wav"),
                    CorrelationResult::new(4.0, 25.0, 2.0),
                )
                .answer(
                    path("res/phoenix_end.wav"),
                    CorrelationResult::new(50.0, 10.0, 2.0),
                )
                .answer(
                    Needle::Stage(ArtifactStage::TrimSilence),
                    CorrelationResult::new(30.0, 3.0, 40.0),
                ),
        );
        let orchestrator =
            h.orchestrator(small_download(), Arc::clone(&transcoder), Arc::clone(&correlator));

        let err = orchestrator.synchronize(&h.background, LINK).unwrap_err();

        assert_eq!(err.kind, ErrorKind::LowConfidenceMatch);
        assert_eq!(err.phase, SyncPhase::LocatingFinal);

        // Fallback trimmed the untouched source audio; nothing was cut.
        let calls = transcoder.calls();
        assert!(!calls.iter().any(|c| matches!(c, Recorded::Cut { .. })));
        let trims: Vec<&PathBuf> = calls
            .iter()
            .filter_map(|c| match c {
                Recorded::Trim(input) => Some(input),
                _ => None,
            })
            .collect();
        assert_eq!(trims.len(), 1);
        assert!(trims[0].to_string_lossy().ends_with("_ffmpeg_extract.wav"));

        assert!(!calls.iter().any(|c| matches!(c, Recorded::Overwrite { .. })));
        assert_eq!(h.temp_files(), 0);
    }

    #[test]
    fn oversized_download_fails_before_extraction() {
        let h = Harness::new();
        let downloader = Arc::new(FakeDownloader::new(600 * MIB, 512 * MIB));
        let transcoder = Arc::new(FakeTranscoder::new());
        let correlator = Arc::new(ScriptedCorrelator::new());
        let orchestrator = h.orchestrator(
            Arc::clone(&downloader),
            Arc::clone(&transcoder),
            Arc::clone(&correlator),
        );

        let err = orchestrator.synchronize(&h.background, LINK).unwrap_err();

        assert_eq!(err.kind, ErrorKind::DownloadFailure);
        assert_eq!(err.phase, SyncPhase::Downloading);
        assert_eq!(downloader.calls(), 1);
        assert!(transcoder.calls().is_empty());
        assert!(correlator.calls().is_empty());
        assert_eq!(h.temp_files(), 0);
    }

    #[test]
    fn score_at_threshold_is_accepted() {
        let h = Harness::new();
        let orchestrator = h.orchestrator(
            small_download(),
            Arc::new(FakeTranscoder::new()),
            Arc::new(phoenix_correlator(6.0)),
        );

        let output = orchestrator.run(&h.background, LINK).unwrap();
        assert_eq!(output.report.final_score, 6.0);
        assert_eq!(h.temp_files(), 1);
    }

    #[test]
    fn score_just_below_threshold_is_rejected() {
        let h = Harness::new();
        let orchestrator = h.orchestrator(
            small_download(),
            Arc::new(FakeTranscoder::new()),
            Arc::new(phoenix_correlator(5.999)),
        );

        let err = orchestrator.run(&h.background, LINK).unwrap_err();
        assert_eq!(err.kind, ErrorKind::LowConfidenceMatch);
        assert_eq!(h.temp_files(), 0);
    }

    #[test]
    fn identical_inputs_take_identical_decisions() {
        let h = Harness::new();
        let orchestrator = h.orchestrator(
            small_download(),
            Arc::new(FakeTranscoder::new()),
            Arc::new(phoenix_correlator(9.0)),
        );

        let first = orchestrator.run(&h.background, LINK).unwrap();
        let second = orchestrator.run(&h.background, LINK).unwrap();

        assert_ne!(first.path, second.path);
        assert_ne!(first.report.run_id, second.report.run_id);
        assert_eq!(first.report.focus, second.report.focus);
        assert_eq!(first.report.final_offset_secs, second.report.final_offset_secs);
        assert_eq!(first.report.final_score, second.report.final_score);
        assert_eq!(first.report.phases, second.report.phases);
        assert_eq!(h.temp_files(), 2);
    }

    #[test]
    fn every_failing_stage_leaves_no_files() {
        let cases = [
            (ArtifactStage::ExtractAudio, ErrorKind::ExtractionFailure),
            (ArtifactStage::CutRange, ErrorKind::TranscodeFailure),
            (ArtifactStage::TrimSilence, ErrorKind::TranscodeFailure),
            (ArtifactStage::OverwriteWindow, ErrorKind::TranscodeFailure),
            (ArtifactStage::MuxReplaceAudio, ErrorKind::TranscodeFailure),
        ];

        for (stage, kind) in cases {
            let h = Harness::new();
            let orchestrator = h.orchestrator(
                small_download(),
                Arc::new(FakeTranscoder::new().fail_on(stage)),
                Arc::new(phoenix_correlator(9.0)),
            );

            let err = orchestrator.run(&h.background, LINK).unwrap_err();
            assert_eq!(err.kind, kind, "failing {:?}", stage);
            assert_eq!(h.temp_files(), 0, "leftovers after failing {:?}", stage);
        }
    }

    #[test]
    fn failed_foreground_extraction_discards_download_and_background_audio() {
        let h = Harness::new();
        let transcoder = Arc::new(
            FakeTranscoder::new().fail_on_input(Needle::Stage(ArtifactStage::Download)),
        );
        let orchestrator = h.orchestrator(
            small_download(),
            Arc::clone(&transcoder),
            Arc::new(phoenix_correlator(9.0)),
        );

        let err = orchestrator.run(&h.background, LINK).unwrap_err();

        assert_eq!(err.kind, ErrorKind::ExtractionFailure);
        assert_eq!(err.phase, SyncPhase::ExtractingForeground);

        // Background extraction succeeded before the downloaded video failed.
        let calls = transcoder.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], Recorded::Extract(h.background.clone()));
        assert!(matches!(
            &calls[1],
            Recorded::Extract(video) if video.to_string_lossy().ends_with("_yt_dlp.mp4")
        ));
        assert_eq!(h.temp_files(), 0);
    }

    #[test]
    fn recalibrated_thresholds_are_honoured() {
        let mut h = Harness::new();
        h.settings.thresholds.start_min_confidence = 30.0;
        h.settings.thresholds.final_min_score = 10.0;

        // Phoenix at 25 no longer clears the start threshold.
        let correlator = Arc::new(phoenix_correlator(12.0));
        let orchestrator = h.orchestrator(
            small_download(),
            Arc::new(FakeTranscoder::new()),
            Arc::clone(&correlator),
        );
        let output = orchestrator.run(&h.background, LINK).unwrap();
        match &output.report.focus {
            FocusOutcome::Unmatched(ledger) => {
                assert_eq!(ledger.len(), 2);
                assert!(ledger.get("Phoenix").is_some());
            }
            other => panic!("expected fallback, got {:?}", other),
        }

        let needles = correlator.needles();
        assert_eq!(
            needles[..4],
            [
                PathBuf::from("res/xx_start.wav"),
                PathBuf::from("res/xx_end.wav"),
                PathBuf::from("res/phoenix_start.wav"),
                PathBuf::from("res/phoenix_end.wav"),
            ]
        );
        assert!(needles[4].to_string_lossy().ends_with("_ffmpeg_trim.wav"));

        // 9 passed the default gate of 6 but not the raised one.
        let orchestrator = h.orchestrator(
            small_download(),
            Arc::new(FakeTranscoder::new()),
            Arc::new(phoenix_correlator(9.0)),
        );
        let err = orchestrator.run(&h.background, LINK).unwrap_err();
        assert_eq!(err.kind, ErrorKind::LowConfidenceMatch);
        assert_eq!(err.phase, SyncPhase::LocatingFinal);
        assert_eq!(h.temp_files(), 1);
    }

    #[test]
    fn correlation_failure_is_classified() {
        let h = Harness::new();
        let correlator = phoenix_correlator(9.0).fail_on(Needle::Stage(ArtifactStage::TrimSilence));
        let orchestrator = h.orchestrator(
            small_download(),
            Arc::new(FakeTranscoder::new()),
            Arc::new(correlator),
        );

        let err = orchestrator.run(&h.background, LINK).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CorrelationFailure);
        assert_eq!(err.phase, SyncPhase::LocatingFinal);
        assert_eq!(h.temp_files(), 0);
    }

    #[test]
    fn missing_background_is_extraction_failure() {
        let h = Harness::new();
        let downloader = small_download();
        let transcoder = Arc::new(FakeTranscoder::new());
        let orchestrator = h.orchestrator(
            Arc::clone(&downloader),
            Arc::clone(&transcoder),
            Arc::new(phoenix_correlator(9.0)),
        );

        let err = orchestrator
            .run(&h.dir.path().join("missing.mp4"), LINK)
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::ExtractionFailure);
        assert_eq!(err.phase, SyncPhase::ExtractingBackground);
        assert_eq!(downloader.calls(), 1);
        assert!(transcoder.calls().is_empty());
        assert_eq!(h.temp_files(), 0);
    }

    #[test]
    fn invalid_link_is_download_failure() {
        let h = Harness::new();
        let orchestrator = h.orchestrator(
            small_download(),
            Arc::new(FakeTranscoder::new()),
            Arc::new(ScriptedCorrelator::new()),
        );

        let err = orchestrator.run(&h.background, "not a link").unwrap_err();
        assert_eq!(err.kind, ErrorKind::DownloadFailure);
    }

    #[test]
    fn progress_reports_each_phase() {
        let h = Harness::new();
        let seen: Arc<Mutex<Vec<(SyncPhase, u32)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let orchestrator = h
            .orchestrator(
                small_download(),
                Arc::new(FakeTranscoder::new()),
                Arc::new(phoenix_correlator(9.0)),
            )
            .with_progress_callback(Arc::new(move |phase: SyncPhase, percent: u32, _msg: &str| {
                sink.lock().push((phase, percent));
            }));

        orchestrator.run(&h.background, LINK).unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 8);
        assert_eq!(seen[0], (SyncPhase::Downloading, 0));
        assert_eq!(seen[7], (SyncPhase::Done, 100));
        assert!(seen.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn log_callback_receives_phase_markers() {
        let h = Harness::new();
        let lines: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let orchestrator = h
            .orchestrator(
                small_download(),
                Arc::new(FakeTranscoder::new()),
                Arc::new(phoenix_correlator(9.0)),
            )
            .with_log_callback(Arc::new(move |line: &str| sink.lock().push(line.to_string())));

        orchestrator.run(&h.background, LINK).unwrap();

        let lines = lines.lock();
        assert!(lines.iter().any(|l| l.contains("Focusing")));
        assert!(lines.iter().any(|l| l.contains("Result written to")));
    }

    #[test]
    fn fallback_outcome_is_reported() {
        let h = Harness::new();
        let correlator = ScriptedCorrelator::new().answer(
            Needle::Stage(ArtifactStage::TrimSilence),
            CorrelationResult::new(12.0, 7.5, 30.0),
        );
        let orchestrator = h.orchestrator(
            small_download(),
            Arc::new(FakeTranscoder::new()),
            Arc::new(correlator),
        );

        let output = orchestrator.run(&h.background, LINK).unwrap();
        match &output.report.focus {
            FocusOutcome::Unmatched(ledger) => assert_eq!(ledger.len(), 2),
            other => panic!("expected fallback, got {:?}", other),
        }
        assert_eq!(h.temp_files(), 1);
    }
}
