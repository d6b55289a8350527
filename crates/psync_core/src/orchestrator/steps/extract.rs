//! Extract steps - demux correlation-ready audio from both videos.
//!
//! Both sides use the one `[extraction]` configuration, so their outputs can
//! be compared with each other and with the delimiter signals.

use crate::orchestrator::errors::{ErrorKind, StepError, StepResult};
use crate::orchestrator::step::SyncStep;
use crate::orchestrator::types::{release, required, Context, RunState, SyncPhase};

/// Extracts audio from the caller's background video.
pub struct ExtractBackgroundStep;

impl SyncStep for ExtractBackgroundStep {
    fn phase(&self) -> SyncPhase {
        SyncPhase::ExtractingBackground
    }

    fn description(&self) -> &str {
        "Extracting background audio"
    }

    fn validate_input(&self, ctx: &Context<'_>, _state: &RunState) -> StepResult<()> {
        if !ctx.background_video.is_file() {
            return Err(StepError::precondition(
                ErrorKind::ExtractionFailure,
                format!(
                    "background video not found: {}",
                    ctx.background_video.display()
                ),
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context<'_>, state: &mut RunState) -> StepResult<()> {
        let audio = ctx
            .tools
            .transcoder
            .extract_audio(
                &ctx.scope(),
                ctx.background_video,
                ctx.settings.extraction,
            )
            .map_err(|e| StepError::tool(ErrorKind::ExtractionFailure, e))?;

        state.background_audio = Some(audio);
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context<'_>, state: &RunState) -> StepResult<()> {
        required(
            &state.background_audio,
            "background audio",
            ErrorKind::ExtractionFailure,
        )?;
        Ok(())
    }
}

/// Extracts audio from the downloaded video, then drops the video.
pub struct ExtractForegroundStep;

impl SyncStep for ExtractForegroundStep {
    fn phase(&self) -> SyncPhase {
        SyncPhase::ExtractingForeground
    }

    fn description(&self) -> &str {
        "Extracting source audio"
    }

    fn validate_input(&self, _ctx: &Context<'_>, state: &RunState) -> StepResult<()> {
        required(
            &state.foreground_video,
            "downloaded video",
            ErrorKind::ExtractionFailure,
        )?;
        Ok(())
    }

    fn execute(&self, ctx: &Context<'_>, state: &mut RunState) -> StepResult<()> {
        let video = required(
            &state.foreground_video,
            "downloaded video",
            ErrorKind::ExtractionFailure,
        )?;

        let audio = ctx
            .tools
            .transcoder
            .extract_audio(&ctx.scope(), video.path(), ctx.settings.extraction)
            .map_err(|e| StepError::tool(ErrorKind::ExtractionFailure, e))?;

        state.foreground_audio = Some(audio);
        release(&mut state.foreground_video, "downloaded video")
    }

    fn validate_output(&self, _ctx: &Context<'_>, state: &RunState) -> StepResult<()> {
        required(
            &state.foreground_audio,
            "source audio",
            ErrorKind::ExtractionFailure,
        )?;
        Ok(())
    }
}
