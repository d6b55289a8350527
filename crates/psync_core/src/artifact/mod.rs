//! Transient media files produced by the pipeline stages.
//!
//! Every stage writes its output into a [`MediaArtifact`] allocated from the
//! run's [`ArtifactStore`]. An artifact owns its file: dropping it deletes the
//! file, so any early return (including `?`) cleans up whatever was created so
//! far. Only [`MediaArtifact::into_output`] lets a file outlive its artifact.

mod store;

pub use store::ArtifactStore;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::TempPath;

/// Kind of media held by an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// The operation that created an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStage {
    Download,
    ExtractAudio,
    CutRange,
    TrimSilence,
    OverwriteWindow,
    MuxReplaceAudio,
}

impl ArtifactStage {
    /// Tag embedded in the file name.
    pub fn tag(&self) -> &'static str {
        match self {
            ArtifactStage::Download => "yt_dlp",
            ArtifactStage::ExtractAudio => "ffmpeg_extract",
            ArtifactStage::CutRange => "ffmpeg_cut",
            ArtifactStage::TrimSilence => "ffmpeg_trim",
            ArtifactStage::OverwriteWindow => "ffmpeg_overwrite",
            ArtifactStage::MuxReplaceAudio => "result",
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            ArtifactStage::Download | ArtifactStage::MuxReplaceAudio => MediaKind::Video,
            _ => MediaKind::Audio,
        }
    }

    /// File extension; ffmpeg picks the output container from it.
    pub fn extension(&self) -> &'static str {
        match self.kind() {
            MediaKind::Video => "mp4",
            MediaKind::Audio => "wav",
        }
    }
}

/// A temporary media file exclusively owned by one pipeline stage.
#[derive(Debug)]
pub struct MediaArtifact {
    path: TempPath,
    stage: ArtifactStage,
}

impl MediaArtifact {
    pub(crate) fn new(path: TempPath, stage: ArtifactStage) -> Self {
        Self { path, stage }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MediaKind {
        self.stage.kind()
    }

    pub fn stage(&self) -> ArtifactStage {
        self.stage
    }

    /// Current size of the file on disk.
    pub fn size(&self) -> io::Result<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    /// Hand the file off to the caller. It is no longer deleted on drop.
    pub fn into_output(self) -> io::Result<PathBuf> {
        self.path.keep().map_err(|e| e.error)
    }

    /// Delete the file now, reporting failure instead of ignoring it.
    pub fn release(self) -> io::Result<()> {
        let path = self.path.to_path_buf();
        match self.path.close() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Artifact {} was already gone", path.display());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
