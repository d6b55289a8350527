//! Allocation of collision-free artifact files for one run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{ArtifactStage, MediaArtifact};

/// Number of random characters in every artifact name.
const RANDOM_LEN: usize = 10;

/// Hands out artifact files under a root directory.
///
/// Names look like `pumpsync_<run>_<random>_<tag>.<ext>`, so concurrent runs
/// sharing one root never collide and a run's files are easy to spot.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    run_tag: String,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>, run_tag: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            run_tag: run_tag.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_tag(&self) -> &str {
        &self.run_tag
    }

    /// Create an empty file for `stage` and return the owning artifact.
    pub fn allocate(&self, stage: ArtifactStage) -> io::Result<MediaArtifact> {
        fs::create_dir_all(&self.root)?;

        let prefix = format!("pumpsync_{}_", self.run_tag);
        let suffix = format!("_{}.{}", stage.tag(), stage.extension());

        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .rand_bytes(RANDOM_LEN)
            .tempfile_in(&self.root)?;

        let path = file.into_temp_path();
        tracing::trace!("Allocated artifact {}", path.display());

        Ok(MediaArtifact::new(path, stage))
    }
}
