//! Adapter for the `locate_audio` correlation utility.

use std::path::Path;

use crate::tools::{require_input, run_tool, ToolCommand, ToolError, ToolResult, ToolScope};

use super::types::{parse_locate_output, CorrelationResult};
use super::Correlator;

/// Runs `locate_audio <haystack> <needle>` and parses its JSON record.
#[derive(Debug, Clone)]
pub struct LocateAudio {
    program: String,
}

impl LocateAudio {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn command(&self, haystack: &Path, needle: &Path) -> ToolCommand {
        ToolCommand::new(&self.program).arg(haystack).arg(needle)
    }
}

impl Correlator for LocateAudio {
    fn locate(
        &self,
        scope: &ToolScope<'_>,
        haystack: &Path,
        needle: &Path,
    ) -> ToolResult<CorrelationResult> {
        require_input(haystack)?;
        require_input(needle)?;

        let command = self.command(haystack, needle);
        let output = run_tool(&command, scope.logger)?;
        let stdout = output.stdout_lossy();

        let result = parse_locate_output(&stdout).map_err(|e| {
            ToolError::parse_error(command.tool_name(), format!("{} in {:?}", e, stdout.trim()))
        })?;

        scope.logger.debug(&format!(
            "Located {} in {}: offset {:.3}s, score {:.2}",
            needle.display(),
            haystack.display(),
            result.offset_secs,
            result.score
        ));

        Ok(result)
    }
}
