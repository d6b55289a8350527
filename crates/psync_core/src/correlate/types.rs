//! Correlation result and the utility's output format.

use serde::{Deserialize, Serialize};

/// Best placement of a needle signal inside a haystack signal.
///
/// `score` is defined by the correlation utility: higher is better, no fixed
/// upper bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// Start of the needle inside the haystack, in seconds.
    pub offset_secs: f64,
    /// Confidence of the placement.
    pub score: f64,
    /// Length of the needle, in seconds. Zero when the utility did not report it.
    pub needle_duration_secs: f64,
}

impl CorrelationResult {
    pub fn new(offset_secs: f64, score: f64, needle_duration_secs: f64) -> Self {
        Self {
            offset_secs,
            score,
            needle_duration_secs,
        }
    }
}

/// Wire record printed by the utility. Every field is optional.
#[derive(Debug, Deserialize)]
struct LocateRecord {
    #[serde(default)]
    offset: Option<f64>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    needle_duration: Option<f64>,
}

/// Parse the utility's stdout.
///
/// Missing or null fields become zero; only a record that is not a JSON
/// object with numeric fields is an error.
pub fn parse_locate_output(stdout: &str) -> Result<CorrelationResult, serde_json::Error> {
    let record: LocateRecord = serde_json::from_str(stdout.trim())?;
    Ok(CorrelationResult {
        offset_secs: record.offset.unwrap_or(0.0),
        score: record.score.unwrap_or(0.0),
        needle_duration_secs: record.needle_duration.unwrap_or(0.0),
    })
}
