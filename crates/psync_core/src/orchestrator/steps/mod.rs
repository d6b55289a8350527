//! Pipeline step implementations.
//!
//! One step per phase of the synchronization state machine.

mod download;
mod extract;
mod focus;
mod locate;
mod mux;
mod overwrite;

pub use download::DownloadStep;
pub use extract::{ExtractBackgroundStep, ExtractForegroundStep};
pub use focus::FocusStep;
pub use locate::LocateFinalStep;
pub use mux::MuxStep;
pub use overwrite::OverwriteStep;
