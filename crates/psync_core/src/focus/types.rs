//! Focus detection types.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::artifact::MediaArtifact;
use crate::config::ThresholdSettings;
use crate::tools::ToolError;

/// Guard band trimmed inside each delimiter boundary, in seconds.
pub const DEFAULT_FADE_GUARD_SECS: f64 = 0.5;

/// A known start/end-of-music signal pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelimiterPair {
    pub key: String,
    pub start_signal: PathBuf,
    pub end_signal: PathBuf,
}

impl DelimiterPair {
    pub fn new(
        key: impl Into<String>,
        start_signal: impl Into<PathBuf>,
        end_signal: impl Into<PathBuf>,
    ) -> Self {
        Self {
            key: key.into(),
            start_signal: start_signal.into(),
            end_signal: end_signal.into(),
        }
    }
}

/// Acceptance thresholds for a delimiter pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusThresholds {
    pub start_min_confidence: f64,
    pub end_min_confidence: f64,
    pub fade_guard_secs: f64,
}

impl FocusThresholds {
    /// Both scores must reach their minimum; equality accepts.
    pub fn accepts(&self, start_score: f64, end_score: f64) -> bool {
        start_score >= self.start_min_confidence && end_score >= self.end_min_confidence
    }
}

impl Default for FocusThresholds {
    fn default() -> Self {
        Self::from(&ThresholdSettings::default())
    }
}

impl From<&ThresholdSettings> for FocusThresholds {
    fn from(t: &ThresholdSettings) -> Self {
        Self {
            start_min_confidence: t.start_min_confidence,
            end_min_confidence: t.end_min_confidence,
            fade_guard_secs: t.fade_guard_secs,
        }
    }
}

/// Cut points for a matched pair: `(left, right)`.
///
/// `left = start_offset + start_duration + guard`, `right = end_offset - guard`.
/// The start signal ends in a fade, so the guard keeps its tail out of the cut.
pub fn adjust_cut_offset(
    start_offset: f64,
    start_duration: f64,
    end_offset: f64,
    guard: f64,
) -> (f64, f64) {
    (start_offset + start_duration + guard, end_offset - guard)
}

/// A delimiter pair that bounded the excerpt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusMatch {
    pub delimiter_key: String,
    pub left_cut_secs: f64,
    pub right_cut_secs: f64,
    pub start_score: f64,
    pub end_score: f64,
}

impl FocusMatch {
    pub fn duration_secs(&self) -> f64 {
        self.right_cut_secs - self.left_cut_secs
    }
}

/// Why a delimiter pair was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// A score fell below its threshold.
    LowConfidence,
    /// Scores passed but the adjusted cut was empty or inverted.
    EmptyCut {
        left_cut_secs: f64,
        right_cut_secs: f64,
    },
}

/// Scores of one rejected delimiter pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusAttempt {
    pub key: String,
    pub start_score: f64,
    pub end_score: f64,
    pub reason: RejectReason,
}

/// Rejected pairs in the order they were tried.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FocusAttemptLedger {
    attempts: Vec<FocusAttempt>,
}

impl FocusAttemptLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, attempt: FocusAttempt) {
        self.attempts.push(attempt);
    }

    pub fn get(&self, key: &str) -> Option<&FocusAttempt> {
        self.attempts.iter().find(|a| a.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FocusAttempt> {
        self.attempts.iter()
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}

impl fmt::Display for FocusAttemptLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempts.is_empty() {
            return write!(f, "no delimiters configured");
        }
        for (i, a) in self.attempts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: ({:.2}, {:.2})", a.key, a.start_score, a.end_score)?;
            if let RejectReason::EmptyCut {
                left_cut_secs,
                right_cut_secs,
            } = a.reason
            {
                write!(f, " empty cut {:.3}..{:.3}", left_cut_secs, right_cut_secs)?;
            }
        }
        Ok(())
    }
}

/// Result of focus detection.
///
/// `Unmatched` is a normal outcome: the caller falls back to silence trimming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FocusOutcome {
    Matched(FocusMatch),
    Unmatched(FocusAttemptLedger),
}

impl FocusOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, FocusOutcome::Matched(_))
    }

    pub fn matched(&self) -> Option<&FocusMatch> {
        match self {
            FocusOutcome::Matched(m) => Some(m),
            FocusOutcome::Unmatched(_) => None,
        }
    }

    pub fn ledger(&self) -> Option<&FocusAttemptLedger> {
        match self {
            FocusOutcome::Matched(_) => None,
            FocusOutcome::Unmatched(ledger) => Some(ledger),
        }
    }
}

/// Focused and silence-trimmed foreground audio.
#[derive(Debug)]
pub struct FocusedAudio {
    pub audio: MediaArtifact,
    pub outcome: FocusOutcome,
}

/// Hard failures during focusing. A missing delimiter match is not one.
#[derive(Debug, thiserror::Error)]
pub enum FocusError {
    #[error("Delimiter correlation failed: {0}")]
    Correlation(#[source] ToolError),

    #[error("Focus transcoding failed: {0}")]
    Transcode(#[source] ToolError),
}

impl FocusError {
    pub fn tool_error(&self) -> &ToolError {
        match self {
            FocusError::Correlation(e) | FocusError::Transcode(e) => e,
        }
    }
}
