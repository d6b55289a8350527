//! Overwrite step - splices the excerpt into the background audio.

use crate::orchestrator::errors::{ErrorKind, StepError, StepResult};
use crate::orchestrator::step::SyncStep;
use crate::orchestrator::types::{release, required, Context, RunState, SyncPhase};

/// Mutes the matched window of the background and mixes the excerpt in.
pub struct OverwriteStep;

impl SyncStep for OverwriteStep {
    fn phase(&self) -> SyncPhase {
        SyncPhase::Overwriting
    }

    fn description(&self) -> &str {
        "Replacing the matched audio window"
    }

    fn validate_input(&self, _ctx: &Context<'_>, state: &RunState) -> StepResult<()> {
        required(
            &state.background_audio,
            "background audio",
            ErrorKind::TranscodeFailure,
        )?;
        required(
            &state.focused_audio,
            "focused audio",
            ErrorKind::TranscodeFailure,
        )?;
        if state.final_match.is_none() {
            return Err(StepError::precondition(
                ErrorKind::TranscodeFailure,
                "no final match to overwrite at",
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context<'_>, state: &mut RunState) -> StepResult<()> {
        let offset_secs = state
            .final_match
            .map(|m| m.offset_secs)
            .ok_or_else(|| {
                StepError::precondition(ErrorKind::TranscodeFailure, "no final match")
            })?;
        let background = required(
            &state.background_audio,
            "background audio",
            ErrorKind::TranscodeFailure,
        )?;
        let focused = required(
            &state.focused_audio,
            "focused audio",
            ErrorKind::TranscodeFailure,
        )?;

        let mixed = ctx
            .tools
            .transcoder
            .overwrite_window(&ctx.scope(), focused.path(), background.path(), offset_secs)
            .map_err(|e| StepError::tool(ErrorKind::TranscodeFailure, e))?;

        state.mixed_audio = Some(mixed);
        release(&mut state.focused_audio, "focused audio")?;
        release(&mut state.background_audio, "background audio")
    }

    fn validate_output(&self, _ctx: &Context<'_>, state: &RunState) -> StepResult<()> {
        required(&state.mixed_audio, "mixed audio", ErrorKind::TranscodeFailure)?;
        Ok(())
    }
}
