//! Fetching the source video.

mod ytdlp;

pub use ytdlp::YtDlp;

use crate::artifact::MediaArtifact;
use crate::tools::{require_nonempty_output, ToolError, ToolResult, ToolScope};

/// Fetches a remote video into a local artifact.
pub trait Downloader: Send + Sync {
    /// Download `link`. The artifact is deleted again if any constraint fails.
    fn fetch(&self, scope: &ToolScope<'_>, link: &str) -> ToolResult<MediaArtifact>;
}

/// Accept only non-empty `http`/`https` links.
pub fn validate_link(link: &str) -> ToolResult<&str> {
    let link = link.trim();
    if link.is_empty() {
        return Err(ToolError::InvalidInput("source link is empty".to_string()));
    }

    let scheme_ok = link
        .split_once("://")
        .map(|(scheme, rest)| {
            (scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https"))
                && !rest.is_empty()
        })
        .unwrap_or(false);

    if scheme_ok {
        Ok(link)
    } else {
        Err(ToolError::InvalidInput(format!(
            "unsupported source link: {}",
            link
        )))
    }
}

/// Check a finished download against the size cap.
///
/// yt-dlp exits cleanly without writing anything when `--max-filesize` is
/// exceeded, so an empty file counts as a rejected download too.
pub fn enforce_download_limits(
    tool: &str,
    artifact: &MediaArtifact,
    max_bytes: u64,
) -> ToolResult<u64> {
    let size = require_nonempty_output(tool, artifact)?;
    if size > max_bytes {
        return Err(ToolError::output_rejected(
            tool,
            artifact.path(),
            format!("{} bytes exceeds the {} byte limit", size, max_bytes),
        ));
    }
    Ok(size)
}
