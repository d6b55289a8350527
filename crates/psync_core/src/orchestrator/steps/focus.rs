//! Focus step - isolates the musical excerpt in the source audio.

use crate::focus::{FocusError, FocusOutcome};
use crate::orchestrator::errors::{ErrorKind, StepError, StepResult};
use crate::orchestrator::step::SyncStep;
use crate::orchestrator::types::{release, required, Context, RunState, SyncPhase};

/// Runs delimiter detection (or the silence-trim fallback) on the source audio.
pub struct FocusStep;

impl SyncStep for FocusStep {
    fn phase(&self) -> SyncPhase {
        SyncPhase::Focusing
    }

    fn description(&self) -> &str {
        "Finding the music in the source audio"
    }

    fn validate_input(&self, _ctx: &Context<'_>, state: &RunState) -> StepResult<()> {
        required(
            &state.foreground_audio,
            "source audio",
            ErrorKind::TranscodeFailure,
        )?;
        Ok(())
    }

    fn execute(&self, ctx: &Context<'_>, state: &mut RunState) -> StepResult<()> {
        let foreground = required(
            &state.foreground_audio,
            "source audio",
            ErrorKind::TranscodeFailure,
        )?;

        let focused = ctx
            .focus
            .focus_and_trim(
                &ctx.scope(),
                ctx.tools.correlator.as_ref(),
                ctx.tools.transcoder.as_ref(),
                foreground.path(),
            )
            .map_err(|e| match e {
                FocusError::Correlation(source) => {
                    StepError::tool(ErrorKind::CorrelationFailure, source)
                }
                FocusError::Transcode(source) => {
                    StepError::tool(ErrorKind::TranscodeFailure, source)
                }
            })?;

        match &focused.outcome {
            FocusOutcome::Matched(m) => ctx.logger.info(&format!(
                "Excerpt bounded by '{}': {:.3}s long",
                m.delimiter_key,
                m.duration_secs()
            )),
            FocusOutcome::Unmatched(ledger) => ctx.logger.info(&format!(
                "Using silence-trimmed source audio ({} delimiter pair(s) rejected)",
                ledger.len()
            )),
        }

        state.focus = Some(focused.outcome);
        state.focused_audio = Some(focused.audio);
        release(&mut state.foreground_audio, "source audio")
    }

    fn validate_output(&self, _ctx: &Context<'_>, state: &RunState) -> StepResult<()> {
        required(
            &state.focused_audio,
            "focused audio",
            ErrorKind::TranscodeFailure,
        )?;
        if state.focus.is_none() {
            return Err(StepError::precondition(
                ErrorKind::TranscodeFailure,
                "focus outcome was not recorded",
            ));
        }
        Ok(())
    }
}
