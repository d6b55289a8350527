//! Synchronization pipeline orchestrator.
//!
//! A run is a linear state machine. Each state performs exactly one stage
//! call through a [`SyncStep`]; the first failure moves the run to
//! `Failed(kind)` and deletes every temporary file the run still owns.
//!
//! # Architecture
//!
//! ```text
//! SyncPipeline
//!     ├── Step: Downloading
//!     ├── Step: ExtractingBackground
//!     ├── Step: ExtractingForeground
//!     ├── Step: Focusing
//!     ├── Step: LocatingFinal   (score gate)
//!     ├── Step: Overwriting
//!     └── Step: Muxing
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use psync_core::config::Settings;
//! use psync_core::orchestrator::SyncOrchestrator;
//!
//! let orchestrator = SyncOrchestrator::new(Settings::default());
//! match orchestrator.synchronize(Path::new("gameplay.mp4"), "https://youtu.be/abc") {
//!     Ok(path) => println!("Result: {}", path.display()),
//!     Err(e) => eprintln!("{} ({})", e.message, e.kind),
//! }
//! ```

mod errors;
mod pipeline;
mod step;
pub mod steps;
mod sync;
mod types;

pub use errors::{ClassifiedError, ErrorKind, StepError, StepResult, SyncResult};
pub use pipeline::SyncPipeline;
pub use step::SyncStep;
pub use sync::{SharedLogCallback, SyncOrchestrator};
pub use types::{
    Context, ProgressCallback, RunState, SyncOutput, SyncPhase, SyncReport, Toolset,
};
