//! Download step - fetches the source video.

use crate::orchestrator::errors::{ErrorKind, StepError, StepResult};
use crate::orchestrator::step::SyncStep;
use crate::orchestrator::types::{required, Context, RunState, SyncPhase};

/// Fetches the linked video into a temporary artifact.
pub struct DownloadStep;

impl SyncStep for DownloadStep {
    fn phase(&self) -> SyncPhase {
        SyncPhase::Downloading
    }

    fn description(&self) -> &str {
        "Downloading source video"
    }

    fn validate_input(&self, _ctx: &Context<'_>, state: &RunState) -> StepResult<()> {
        if state.foreground_video.is_some() {
            return Err(StepError::precondition(
                ErrorKind::DownloadFailure,
                "source video was already downloaded",
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context<'_>, state: &mut RunState) -> StepResult<()> {
        ctx.logger.info(&format!("Downloading {}", ctx.link));

        let video = ctx
            .tools
            .downloader
            .fetch(&ctx.scope(), ctx.link)
            .map_err(|e| StepError::tool(ErrorKind::DownloadFailure, e))?;

        state.foreground_video = Some(video);
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context<'_>, state: &RunState) -> StepResult<()> {
        required(
            &state.foreground_video,
            "downloaded video",
            ErrorKind::DownloadFailure,
        )?;
        Ok(())
    }
}
