//! Pipeline step trait definition.
//!
//! All pipeline steps implement this trait, providing a consistent
//! interface for validation and execution.

use super::errors::StepResult;
use super::types::{Context, RunState, SyncPhase};

/// Trait for pipeline steps.
///
/// Each step runs exactly one phase of the state machine. The pipeline
/// runner calls these methods in order:
///
/// 1. `validate_input` - Check that earlier phases left what this one needs
/// 2. `execute` - Perform the stage call and record its artifact in `state`
/// 3. `validate_output` - Verify the artifact was recorded
///
/// A step that fails after creating an artifact must not leave it behind;
/// holding it in a local until it is stored in `state` is enough.
pub trait SyncStep: Send + Sync {
    /// Phase this step implements.
    fn phase(&self) -> SyncPhase;

    /// Get the step name (for logging and error context).
    fn name(&self) -> &str {
        self.phase().name()
    }

    /// Human-readable description of what this step does.
    fn description(&self) -> &str {
        self.name()
    }

    /// Validate inputs before execution.
    fn validate_input(&self, ctx: &Context<'_>, state: &RunState) -> StepResult<()>;

    /// Execute the step's main work.
    fn execute(&self, ctx: &Context<'_>, state: &mut RunState) -> StepResult<()>;

    /// Validate outputs after execution.
    fn validate_output(&self, ctx: &Context<'_>, state: &RunState) -> StepResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockStep;

    impl SyncStep for MockStep {
        fn phase(&self) -> SyncPhase {
            SyncPhase::Focusing
        }

        fn validate_input(&self, _ctx: &Context<'_>, _state: &RunState) -> StepResult<()> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context<'_>, _state: &mut RunState) -> StepResult<()> {
            Ok(())
        }

        fn validate_output(&self, _ctx: &Context<'_>, _state: &RunState) -> StepResult<()> {
            Ok(())
        }
    }

    #[test]
    fn step_trait_object_works() {
        let step: Box<dyn SyncStep> = Box::new(MockStep);

        assert_eq!(step.name(), "Focusing");
        assert_eq!(step.description(), "Focusing");
    }
}
