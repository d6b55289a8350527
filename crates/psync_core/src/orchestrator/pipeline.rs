//! Pipeline runner that executes steps in sequence.

use super::errors::{ClassifiedError, StepResult};
use super::step::SyncStep;
use super::steps::{
    DownloadStep, ExtractBackgroundStep, ExtractForegroundStep, FocusStep, LocateFinalStep,
    MuxStep, OverwriteStep,
};
use super::types::{Context, RunState, SyncPhase};

/// Pipeline that runs a sequence of steps.
///
/// The pipeline executes steps in order, running validation before and after
/// each step. The first failure moves the run to `Failed` and deletes every
/// artifact the run still holds.
pub struct SyncPipeline {
    /// Steps to execute in order.
    steps: Vec<Box<dyn SyncStep>>,
}

impl SyncPipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// The seven phases from download to mux.
    pub fn standard() -> Self {
        Self::new()
            .with_step(DownloadStep)
            .with_step(ExtractBackgroundStep)
            .with_step(ExtractForegroundStep)
            .with_step(FocusStep)
            .with_step(LocateFinalStep)
            .with_step(OverwriteStep)
            .with_step(MuxStep)
    }

    /// Add a step to the pipeline.
    pub fn add_step<S: SyncStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: SyncStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Run every step against `state`.
    ///
    /// On success the run is in `Done` and `state` holds the result video.
    pub fn run(&self, ctx: &Context<'_>, state: &mut RunState) -> Result<(), ClassifiedError> {
        let total_steps = self.steps.len().max(1);

        for (i, step) in self.steps.iter().enumerate() {
            let phase = step.phase();
            let step_name = step.name();

            state.enter(phase);
            ctx.logger.phase(step_name);

            let percent = ((i as f64 / total_steps as f64) * 100.0) as u32;
            ctx.report_progress(phase, percent, step.description());

            if let Err(e) = run_step(step.as_ref(), ctx, state) {
                let error = ClassifiedError::from_step(phase, &e);
                self.fail(ctx, state, &error);
                return Err(error);
            }

            ctx.logger.success(&format!("{} completed", step_name));
        }

        state.enter(SyncPhase::Done);
        ctx.report_progress(SyncPhase::Done, 100, "Synchronization finished");
        Ok(())
    }

    fn fail(&self, ctx: &Context<'_>, state: &mut RunState, error: &ClassifiedError) {
        let failed = SyncPhase::Failed(error.kind);
        state.enter(failed);
        ctx.logger.error(&error.to_string());

        let removed = state.discard_artifacts(&ctx.logger);
        if removed > 0 {
            ctx.logger
                .debug(&format!("Removed {} temporary file(s)", removed));
        }

        ctx.report_progress(failed, 100, &error.message);
    }

    /// Get the number of steps in the pipeline.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Phases in execution order.
    pub fn phases(&self) -> Vec<SyncPhase> {
        self.steps.iter().map(|s| s.phase()).collect()
    }
}

fn run_step(step: &dyn SyncStep, ctx: &Context<'_>, state: &mut RunState) -> StepResult<()> {
    ctx.logger
        .debug(&format!("Validating input for '{}'", step.name()));
    step.validate_input(ctx, state)?;

    ctx.logger.debug(&format!("Executing '{}'", step.name()));
    step.execute(ctx, state)?;

    step.validate_output(ctx, state)
}

impl Default for SyncPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_pipeline_follows_state_machine() {
        let pipeline = SyncPipeline::standard();
        assert_eq!(pipeline.step_count(), 7);
        assert_eq!(
            pipeline.phases(),
            vec![
                SyncPhase::Downloading,
                SyncPhase::ExtractingBackground,
                SyncPhase::ExtractingForeground,
                SyncPhase::Focusing,
                SyncPhase::LocatingFinal,
                SyncPhase::Overwriting,
                SyncPhase::Muxing,
            ]
        );
    }
}
