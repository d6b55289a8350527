//! Audio correlation.
//!
//! The pipeline never correlates audio itself; it asks a [`Correlator`] where
//! one WAV file occurs inside another. The production implementation shells
//! out to the `locate_audio` utility shipped in this workspace.

mod locate;
mod types;

pub use locate::LocateAudio;
pub use types::{parse_locate_output, CorrelationResult};

use std::path::Path;

use crate::tools::{ToolResult, ToolScope};

/// Finds the best placement of one audio signal inside another.
pub trait Correlator: Send + Sync {
    /// Locate `needle` inside `haystack`.
    ///
    /// Both files must come from the same extraction configuration.
    fn locate(
        &self,
        scope: &ToolScope<'_>,
        haystack: &Path,
        needle: &Path,
    ) -> ToolResult<CorrelationResult>;
}
