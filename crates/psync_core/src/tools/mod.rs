//! Shared plumbing for the external utility adapters.
//!
//! The downloader, transcoder and correlator adapters all shell out through
//! [`run_tool`] and allocate their outputs from the run's
//! [`ArtifactStore`](crate::artifact::ArtifactStore) via a [`ToolScope`].

mod error;
mod runner;

pub use error::{ToolError, ToolResult};
pub use runner::{run_tool, ToolCommand, ToolOutput};

use std::path::Path;

use crate::artifact::{ArtifactStage, ArtifactStore, MediaArtifact};
use crate::logging::RunLogger;

/// Per-run resources every tool call needs.
#[derive(Clone, Copy)]
pub struct ToolScope<'a> {
    pub artifacts: &'a ArtifactStore,
    pub logger: &'a RunLogger,
}

impl<'a> ToolScope<'a> {
    pub fn new(artifacts: &'a ArtifactStore, logger: &'a RunLogger) -> Self {
        Self { artifacts, logger }
    }

    /// Allocate the output artifact for a tool call.
    pub fn allocate(&self, stage: ArtifactStage) -> ToolResult<MediaArtifact> {
        self.artifacts
            .allocate(stage)
            .map_err(|e| ToolError::artifact(format!("allocating {} output", stage.tag()), e))
    }
}

/// Fail early when an input file is missing.
pub fn require_input(path: &Path) -> ToolResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ToolError::InputNotFound(path.to_path_buf()))
    }
}

/// Reject an output file that is missing or empty after a clean exit.
pub fn require_nonempty_output(tool: &str, artifact: &MediaArtifact) -> ToolResult<u64> {
    match artifact.size() {
        Ok(0) => Err(ToolError::output_rejected(
            tool,
            artifact.path(),
            "output file is empty",
        )),
        Ok(size) => Ok(size),
        Err(e) => Err(ToolError::output_rejected(
            tool,
            artifact.path(),
            format!("cannot read output: {}", e),
        )),
    }
}
