//! Mux step - swaps the background video's audio for the mixed track.

use crate::orchestrator::errors::{ErrorKind, StepError, StepResult};
use crate::orchestrator::step::SyncStep;
use crate::orchestrator::types::{release, required, Context, RunState, SyncPhase};
use crate::tools::require_nonempty_output;

/// Copies the background video stream and replaces its audio.
pub struct MuxStep;

impl SyncStep for MuxStep {
    fn phase(&self) -> SyncPhase {
        SyncPhase::Muxing
    }

    fn description(&self) -> &str {
        "Writing the final video"
    }

    fn validate_input(&self, ctx: &Context<'_>, state: &RunState) -> StepResult<()> {
        required(&state.mixed_audio, "mixed audio", ErrorKind::TranscodeFailure)?;
        if !ctx.background_video.is_file() {
            return Err(StepError::precondition(
                ErrorKind::TranscodeFailure,
                format!(
                    "background video disappeared: {}",
                    ctx.background_video.display()
                ),
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context<'_>, state: &mut RunState) -> StepResult<()> {
        let mixed = required(&state.mixed_audio, "mixed audio", ErrorKind::TranscodeFailure)?;

        let video = ctx
            .tools
            .transcoder
            .mux_replace_audio(&ctx.scope(), ctx.background_video, mixed.path())
            .map_err(|e| StepError::tool(ErrorKind::TranscodeFailure, e))?;

        state.result_video = Some(video);
        release(&mut state.mixed_audio, "mixed audio")
    }

    fn validate_output(&self, _ctx: &Context<'_>, state: &RunState) -> StepResult<()> {
        let video = required(&state.result_video, "result video", ErrorKind::TranscodeFailure)?;
        require_nonempty_output("mux", video)
            .map_err(|e| StepError::tool(ErrorKind::TranscodeFailure, e))?;

        if state.held_artifacts() != 1 {
            return Err(StepError::precondition(
                ErrorKind::ArtifactIoFailure,
                format!(
                    "{} intermediate file(s) still held after mux",
                    state.held_artifacts() - 1
                ),
            ));
        }
        Ok(())
    }
}
