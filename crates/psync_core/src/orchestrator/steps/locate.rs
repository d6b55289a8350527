//! Locate step - places the focused excerpt inside the background audio.
//!
//! This is the run's acceptance gate: everything before it is exploratory.

use crate::orchestrator::errors::{ErrorKind, StepError, StepResult};
use crate::orchestrator::step::SyncStep;
use crate::orchestrator::types::{required, Context, RunState, SyncPhase};

/// Correlates the focused audio against the background audio.
pub struct LocateFinalStep;

impl SyncStep for LocateFinalStep {
    fn phase(&self) -> SyncPhase {
        SyncPhase::LocatingFinal
    }

    fn description(&self) -> &str {
        "Locating the music in the background audio"
    }

    fn validate_input(&self, _ctx: &Context<'_>, state: &RunState) -> StepResult<()> {
        required(
            &state.background_audio,
            "background audio",
            ErrorKind::CorrelationFailure,
        )?;
        required(
            &state.focused_audio,
            "focused audio",
            ErrorKind::CorrelationFailure,
        )?;
        Ok(())
    }

    fn execute(&self, ctx: &Context<'_>, state: &mut RunState) -> StepResult<()> {
        let background = required(
            &state.background_audio,
            "background audio",
            ErrorKind::CorrelationFailure,
        )?;
        let focused = required(
            &state.focused_audio,
            "focused audio",
            ErrorKind::CorrelationFailure,
        )?;

        let result = ctx
            .tools
            .correlator
            .locate(&ctx.scope(), background.path(), focused.path())
            .map_err(|e| StepError::tool(ErrorKind::CorrelationFailure, e))?;

        ctx.logger.info(&format!(
            "Final match at {:.3}s with score {:.2}",
            result.offset_secs, result.score
        ));
        state.final_match = Some(result);

        let minimum = ctx.settings.thresholds.final_min_score;
        if result.score < minimum {
            return Err(StepError::LowConfidence {
                score: result.score,
                minimum,
            });
        }
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context<'_>, state: &RunState) -> StepResult<()> {
        if state.final_match.is_none() {
            return Err(StepError::precondition(
                ErrorKind::CorrelationFailure,
                "final match was not recorded",
            ));
        }
        Ok(())
    }
}
