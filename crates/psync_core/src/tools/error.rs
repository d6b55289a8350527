//! Errors raised by the external tool adapters.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of one external utility call.
///
/// Adapters do not know which pipeline stage called them; the orchestrator
/// classifies these into stage-level error kinds.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The executable could not be started.
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The tool exited with a non-zero status.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// The tool's output could not be interpreted.
    #[error("Failed to parse {tool} output: {message}")]
    ParseError { tool: String, message: String },

    /// The tool exited cleanly but its output file is unusable.
    #[error("{tool} produced unusable output {path}: {reason}")]
    OutputRejected {
        tool: String,
        path: PathBuf,
        reason: String,
    },

    /// An input file does not exist.
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    /// The request was rejected before any tool ran.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Creating or deleting a temporary artifact failed.
    #[error("Artifact I/O error while {operation}: {source}")]
    Artifact {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl ToolError {
    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    pub fn parse_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn output_rejected(
        tool: impl Into<String>,
        path: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self::OutputRejected {
            tool: tool.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn artifact(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Artifact {
            operation: operation.into(),
            source,
        }
    }

    /// Whether this is a local temporary-file failure rather than a tool failure.
    pub fn is_artifact_io(&self) -> bool {
        matches!(self, ToolError::Artifact { .. })
    }
}

/// Result type for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;
