//! Run configuration

use std::io;
use std::path::{Path, PathBuf};

/// External programs, resolved through `PATH` unless given as paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub magick: PathBuf,
    pub ffmpeg: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            magick: PathBuf::from("magick"),
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the sidecars and their media.
    pub directory: PathBuf,
    pub tools: ToolPaths,
}

impl Config {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            tools: ToolPaths::default(),
        }
    }

    pub fn with_magick(mut self, program: impl Into<PathBuf>) -> Self {
        self.tools.magick = program.into();
        self
    }

    pub fn with_ffmpeg(mut self, program: impl Into<PathBuf>) -> Self {
        self.tools.ffmpeg = program.into();
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn validate(&self) -> io::Result<()> {
        if !self.directory.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", self.directory.display()),
            ));
        }
        Ok(())
    }
}
