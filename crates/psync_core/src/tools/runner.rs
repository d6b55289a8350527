//! Blocking execution of external utilities.
//!
//! Every adapter builds a [`ToolCommand`] and hands it to [`run_tool`], which
//! logs the command line, captures stdout, feeds stderr into the run logger's
//! tail buffer and turns a non-zero exit into [`ToolError::CommandFailed`].

use std::ffi::{OsStr, OsString};
use std::process::{Command, Stdio};

use crate::logging::RunLogger;

use super::error::{ToolError, ToolResult};

/// Number of stderr lines quoted in a failure message.
const FAILURE_CONTEXT_LINES: usize = 3;

/// An external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arg_list(&self) -> &[OsString] {
        &self.args
    }

    /// Short tool name for messages (`/usr/bin/ffmpeg` -> `ffmpeg`).
    pub fn tool_name(&self) -> String {
        std::path::Path::new(&self.program)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.clone())
    }

    /// Shell-like rendering for the log.
    pub fn display(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            out.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('\'') {
                out.push('"');
                out.push_str(&arg.replace('"', "\\\""));
                out.push('"');
            } else {
                out.push_str(&arg);
            }
        }
        out
    }
}

/// Captured result of a successful tool run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl ToolOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }
}

/// Run a command to completion, blocking the calling thread.
pub fn run_tool(command: &ToolCommand, logger: &RunLogger) -> ToolResult<ToolOutput> {
    let tool = command.tool_name();
    logger.clear_tail();
    logger.command(&command.display());

    let output = Command::new(command.program())
        .args(command.arg_list())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| ToolError::Spawn {
            tool: tool.clone(),
            source,
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
        logger.output_line(line);
    }

    if !output.status.success() {
        logger.show_tail(&tool);
        let exit_code = output.status.code().unwrap_or(-1);
        return Err(ToolError::command_failed(
            tool,
            exit_code,
            failure_context(&stderr),
        ));
    }

    Ok(ToolOutput {
        stdout: output.stdout,
        stderr,
    })
}

/// Last few meaningful stderr lines, joined for an error message.
fn failure_context(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if lines.is_empty() {
        return "no error output".to_string();
    }

    let start = lines.len().saturating_sub(FAILURE_CONTEXT_LINES);
    lines[start..].join(" | ")
}
