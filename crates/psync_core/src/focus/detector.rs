//! Delimiter-based excerpt detection with silence-trim fallback.

use std::path::Path;

use crate::config::Settings;
use crate::correlate::Correlator;
use crate::tools::{ToolError, ToolScope};
use crate::transcode::Transcoder;

use super::types::{
    adjust_cut_offset, DelimiterPair, FocusAttempt, FocusAttemptLedger, FocusError, FocusMatch,
    FocusOutcome, FocusThresholds, FocusedAudio, RejectReason,
};

/// Narrows foreground audio down to the musical excerpt.
#[derive(Debug, Clone)]
pub struct FocusDetector {
    delimiters: Vec<DelimiterPair>,
    thresholds: FocusThresholds,
    silence_threshold_db: f64,
}

impl FocusDetector {
    pub fn new(
        delimiters: Vec<DelimiterPair>,
        thresholds: FocusThresholds,
        silence_threshold_db: f64,
    ) -> Self {
        Self {
            delimiters,
            thresholds,
            silence_threshold_db,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.delimiters.clone(),
            FocusThresholds::from(&settings.thresholds),
            settings.thresholds.silence_threshold_db,
        )
    }

    pub fn delimiters(&self) -> &[DelimiterPair] {
        &self.delimiters
    }

    pub fn thresholds(&self) -> &FocusThresholds {
        &self.thresholds
    }

    /// Try each delimiter pair in order and stop at the first accepted one.
    ///
    /// The transcoder is only consulted for the start signal's duration when
    /// the correlator did not report it.
    pub fn detect(
        &self,
        scope: &ToolScope<'_>,
        correlator: &dyn Correlator,
        transcoder: &dyn Transcoder,
        foreground: &Path,
    ) -> Result<FocusOutcome, FocusError> {
        let mut ledger = FocusAttemptLedger::new();

        for pair in &self.delimiters {
            scope
                .logger
                .debug(&format!("Checking delimiter pair '{}'", pair.key));

            let start = correlator
                .locate(scope, foreground, &pair.start_signal)
                .map_err(FocusError::Correlation)?;
            let end = correlator
                .locate(scope, foreground, &pair.end_signal)
                .map_err(FocusError::Correlation)?;

            if !self.thresholds.accepts(start.score, end.score) {
                scope.logger.debug(&format!(
                    "Delimiter '{}' rejected: scores ({:.2}, {:.2})",
                    pair.key, start.score, end.score
                ));
                ledger.record(FocusAttempt {
                    key: pair.key.clone(),
                    start_score: start.score,
                    end_score: end.score,
                    reason: RejectReason::LowConfidence,
                });
                continue;
            }

            let start_duration = if start.needle_duration_secs > 0.0 {
                start.needle_duration_secs
            } else {
                transcoder
                    .probe_duration(scope, &pair.start_signal)
                    .map_err(FocusError::Transcode)?
            };

            let (left_cut_secs, right_cut_secs) = adjust_cut_offset(
                start.offset_secs,
                start_duration,
                end.offset_secs,
                self.thresholds.fade_guard_secs,
            );

            if left_cut_secs >= right_cut_secs {
                scope.logger.warn(&format!(
                    "Delimiter '{}' matched but cut {:.3}..{:.3} is empty",
                    pair.key, left_cut_secs, right_cut_secs
                ));
                ledger.record(FocusAttempt {
                    key: pair.key.clone(),
                    start_score: start.score,
                    end_score: end.score,
                    reason: RejectReason::EmptyCut {
                        left_cut_secs,
                        right_cut_secs,
                    },
                });
                continue;
            }

            return Ok(FocusOutcome::Matched(FocusMatch {
                delimiter_key: pair.key.clone(),
                left_cut_secs,
                right_cut_secs,
                start_score: start.score,
                end_score: end.score,
            }));
        }

        Ok(FocusOutcome::Unmatched(ledger))
    }

    /// Detect, then cut (or fall back) and silence-trim.
    ///
    /// On a match the cut range is trimmed; otherwise the untouched foreground
    /// is trimmed. Intermediate files are removed before returning.
    pub fn focus_and_trim(
        &self,
        scope: &ToolScope<'_>,
        correlator: &dyn Correlator,
        transcoder: &dyn Transcoder,
        foreground: &Path,
    ) -> Result<FocusedAudio, FocusError> {
        let outcome = self.detect(scope, correlator, transcoder, foreground)?;

        let audio = match &outcome {
            FocusOutcome::Matched(m) => {
                scope.logger.info(&format!(
                    "Matched delimiter '{}' ({:.2}, {:.2}), cutting {:.3}s..{:.3}s",
                    m.delimiter_key, m.start_score, m.end_score, m.left_cut_secs, m.right_cut_secs
                ));

                let cut = transcoder
                    .cut_range(scope, foreground, m.left_cut_secs, m.right_cut_secs)
                    .map_err(FocusError::Transcode)?;
                let trimmed = transcoder
                    .trim_silence(scope, cut.path(), self.silence_threshold_db)
                    .map_err(FocusError::Transcode)?;
                cut.release().map_err(|e| {
                    FocusError::Transcode(ToolError::artifact("removing cut audio", e))
                })?;
                trimmed
            }
            FocusOutcome::Unmatched(ledger) => {
                scope.logger.warn(&format!(
                    "No known delimiter matched, falling back to silence trim. Scores: {}",
                    ledger
                ));
                transcoder
                    .trim_silence(scope, foreground, self.silence_threshold_db)
                    .map_err(FocusError::Transcode)?
            }
        };

        Ok(FocusedAudio { audio, outcome })
    }
}
