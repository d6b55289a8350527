//! yt-dlp downloader.

use crate::artifact::{ArtifactStage, MediaArtifact};
use crate::config::DownloadSettings;
use crate::tools::{run_tool, ToolCommand, ToolResult, ToolScope};

use super::{enforce_download_limits, validate_link, Downloader};

/// Downloader backed by the `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    settings: DownloadSettings,
}

impl YtDlp {
    pub fn new(program: impl Into<String>, settings: DownloadSettings) -> Self {
        Self {
            program: program.into(),
            settings,
        }
    }

    pub fn settings(&self) -> &DownloadSettings {
        &self.settings
    }

    /// yt-dlp command writing `link` to `output`.
    pub fn command(&self, link: &str, output: &std::path::Path) -> ToolCommand {
        let mut command = ToolCommand::new(&self.program)
            .arg(link)
            .args(["-f", self.settings.format.as_str()])
            .arg("--force-overwrites")
            .arg("--max-filesize")
            .arg(format!("{}M", self.settings.max_filesize_mb));

        if self.settings.no_playlist {
            command = command.arg("--no-playlist");
        }

        command.arg("-o").arg(output)
    }
}

impl Downloader for YtDlp {
    fn fetch(&self, scope: &ToolScope<'_>, link: &str) -> ToolResult<MediaArtifact> {
        let link = validate_link(link)?;

        let artifact = scope.allocate(ArtifactStage::Download)?;
        let command = self.command(link, artifact.path());
        run_tool(&command, scope.logger)?;

        let size = enforce_download_limits(
            &command.tool_name(),
            &artifact,
            self.settings.max_filesize_bytes(),
        )?;
        scope.logger.info(&format!(
            "Downloaded {:.1} MB from {}",
            size as f64 / (1024.0 * 1024.0),
            link
        ));

        Ok(artifact)
    }
}
