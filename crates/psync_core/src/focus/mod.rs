//! Focus detection: isolating the musical excerpt in the foreground audio.
//!
//! Known delimiter signals (start/end of music) are located with the
//! correlator. The first pair whose scores clear the thresholds bounds the
//! excerpt; when none does, the caller gets a ledger of every attempt and the
//! foreground is silence-trimmed instead.

mod detector;
mod types;

pub use detector::FocusDetector;
pub use types::{
    adjust_cut_offset, DelimiterPair, FocusAttempt, FocusAttemptLedger, FocusError, FocusMatch,
    FocusOutcome, FocusThresholds, FocusedAudio, RejectReason, DEFAULT_FADE_GUARD_SECS,
};
