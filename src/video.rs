//! Video container tagging via FFmpeg
//!
//! Streams are copied, never re-encoded. Existing container metadata is
//! dumped as ffmetadata, extended with a chapter carrying the new fields,
//! and remuxed into a scratch file that replaces the original on success.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::command::ToolCommand;
use crate::error::Result;
use crate::scratch;

const FFMETADATA_HEADER: &str = ";FFMETADATA1";

/// Backslash-escape the characters ffmetadata treats as syntax.
pub fn escape_ffmetadata(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '=' | ';' | '#' | '\\' | '\n') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Append a zero-length chapter holding `fields` to an ffmetadata dump.
///
/// An empty dump gets the `;FFMETADATA1` header first.
pub fn augment_ffmetadata(existing: &str, fields: &[(&str, String)]) -> String {
    let mut out = if existing.trim().is_empty() {
        format!("{FFMETADATA_HEADER}\n")
    } else {
        existing.to_string()
    };
    if !out.ends_with('\n') {
        out.push('\n');
    }

    out.push_str("\n[CHAPTER]\nTIMEBASE=1/1\nSTART=0\nEND=0\n");
    for (key, value) in fields {
        out.push_str(&format!(
            "{}={}\n",
            escape_ffmetadata(key),
            escape_ffmetadata(value)
        ));
    }
    out
}

pub struct VideoMetadataWriter {
    ffmpeg: PathBuf,
}

impl VideoMetadataWriter {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    /// Current container metadata in ffmetadata form.
    fn dump_metadata(&self, video: &Path) -> Result<String> {
        let output = ToolCommand::new(&self.ffmpeg)
            .args(&["-hide_banner", "-loglevel", "error"])
            .input(video)
            .args(&["-f", "ffmetadata", "-"])
            .execute()?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Tag `video` with `fields` in place.
    ///
    /// On failure the original is left as it was and no scratch files
    /// remain next to it.
    pub fn write(&self, video: &Path, fields: &[(&str, String)]) -> Result<()> {
        let existing = self.dump_metadata(video)?;
        let metadata = augment_ffmetadata(&existing, fields);

        let mut meta_file = scratch::scratch_file(video, ".ffmeta")?;
        meta_file.write_all(metadata.as_bytes())?;
        meta_file.as_file().sync_all()?;
        debug!("{}: metadata staged in {}", video.display(), meta_file.path().display());

        let remuxed = scratch::scratch_like(video)?;

        let mut cmd = ToolCommand::new(&self.ffmpeg)
            .args(&["-hide_banner", "-loglevel", "error", "-y"])
            .input(video)
            .input(meta_file.path())
            .args(&["-map", "0", "-map_metadata", "1", "-map_chapters", "1", "-c", "copy"]);
        for (key, value) in fields {
            cmd = cmd.arg("-metadata").arg(format!("{key}={value}"));
        }
        cmd.arg(remuxed.path()).execute()?;

        scratch::persist_over(remuxed, video)?;

        info!("{}: wrote {} container tags", video.display(), fields.len());
        Ok(())
    }
}

impl Default for VideoMetadataWriter {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}
