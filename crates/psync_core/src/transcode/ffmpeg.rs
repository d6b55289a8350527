//! FFmpeg/FFprobe transcoder.
//!
//! Filter graphs are built here and nowhere else; callers only see
//! [`TranscodeOp`] descriptors.

use std::ffi::OsString;
use std::path::Path;

use crate::artifact::MediaArtifact;
use crate::tools::{
    require_input, require_nonempty_output, run_tool, ToolCommand, ToolError, ToolResult,
    ToolScope,
};

use super::ops::TranscodeOp;
use super::Transcoder;

/// Transcoder backed by the `ffmpeg` and `ffprobe` executables.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg: String,
    ffprobe: String,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Full ffmpeg command for `op` writing to `output`.
    pub fn command(&self, op: &TranscodeOp<'_>, output: &Path) -> ToolCommand {
        ToolCommand::new(&self.ffmpeg).args(build_args(op, output))
    }

    /// ffprobe command that prints the container duration in seconds.
    pub fn duration_command(&self, path: &Path) -> ToolCommand {
        ToolCommand::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "csv=p=0",
            ])
            .arg(path)
    }
}

impl Transcoder for FfmpegTranscoder {
    fn run(&self, scope: &ToolScope<'_>, op: &TranscodeOp<'_>) -> ToolResult<MediaArtifact> {
        op.validate().map_err(ToolError::InvalidInput)?;
        for input in op.inputs() {
            require_input(input)?;
        }

        scope.logger.debug(&format!("Transcode: {}", op));

        // Dropped (and deleted) by any early return below.
        let artifact = scope.allocate(op.stage())?;
        let command = self.command(op, artifact.path());
        run_tool(&command, scope.logger)?;
        require_nonempty_output(&command.tool_name(), &artifact)?;

        Ok(artifact)
    }

    fn probe_duration(&self, scope: &ToolScope<'_>, path: &Path) -> ToolResult<f64> {
        require_input(path)?;

        let command = self.duration_command(path);
        let output = run_tool(&command, scope.logger)?;
        let stdout = output.stdout_lossy();

        let duration = parse_duration(&stdout).ok_or_else(|| {
            ToolError::parse_error(
                command.tool_name(),
                format!("no usable duration in {:?}", stdout.trim()),
            )
        })?;

        scope
            .logger
            .debug(&format!("Duration of {}: {:.3}s", path.display(), duration));
        Ok(duration)
    }
}

/// ffmpeg arguments for one operation. Every command overwrites `output`.
pub fn build_args(op: &TranscodeOp<'_>, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into()];

    match *op {
        TranscodeOp::ExtractAudio { video, extraction } => {
            args.push("-i".into());
            args.push(video.into());
            args.push("-ar".into());
            args.push(extraction.sample_rate.to_string().into());
            args.push("-ac".into());
            args.push(extraction.channels.to_string().into());
        }
        TranscodeOp::CutRange {
            audio,
            start_secs,
            end_secs,
        } => {
            // Input seeking: -ss/-t precede -i.
            args.push("-ss".into());
            args.push(start_secs.to_string().into());
            args.push("-t".into());
            args.push((end_secs - start_secs).to_string().into());
            args.push("-i".into());
            args.push(audio.into());
        }
        TranscodeOp::TrimSilence {
            audio,
            threshold_db,
        } => {
            args.push("-i".into());
            args.push(audio.into());
            args.push("-af".into());
            args.push(silence_trim_filter(threshold_db).into());
        }
        TranscodeOp::OverwriteWindow {
            foreground,
            background,
            offset_secs,
            foreground_duration_secs,
        } => {
            args.push("-filter_complex".into());
            args.push(overwrite_filter(offset_secs, foreground_duration_secs).into());
            args.push("-i".into());
            args.push(foreground.into());
            args.push("-i".into());
            args.push(background.into());
            args.push("-map".into());
            args.push("[result]".into());
        }
        TranscodeOp::MuxReplaceAudio { video, audio } => {
            args.push("-i".into());
            args.push(video.into());
            args.push("-i".into());
            args.push(audio.into());
            for arg in [
                "-map", "0:v", "-map", "1:0", "-f", "mp4", "-c:v", "copy", "-c:a", "aac",
            ] {
                args.push(arg.into());
            }
        }
    }

    args.push(output.into());
    args
}

/// Forward trim, reverse, trim again, reverse back.
fn silence_trim_filter(threshold_db: f64) -> String {
    let trim = format!(
        "silenceremove=start_periods=1:start_duration=0:start_threshold={}dB",
        threshold_db
    );
    format!("{trim},areverse,{trim},areverse")
}

/// Input 0 is the foreground, input 1 the background.
fn overwrite_filter(offset_secs: f64, foreground_duration_secs: f64) -> String {
    let delay_ms = (offset_secs * 1000.0) as i64;
    format!(
        "[0:0]adelay=all=1:delays={}[fg];\
         [1:0]volume=volume=0:enable='between(t,{:.6},{:.6})'[bg];\
         [bg][fg]amix=inputs=2:duration=longest[result]",
        delay_ms,
        offset_secs,
        offset_secs + foreground_duration_secs
    )
}

/// Parse ffprobe's `csv=p=0` duration line.
fn parse_duration(stdout: &str) -> Option<f64> {
    let value: f64 = stdout.lines().next()?.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}
