//! External tool command wrapper (ffmpeg, ImageMagick)

use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0} not found in system PATH")]
    NotInstalled(String),

    #[error("{program} failed ({status}): {stderr}")]
    ExecutionFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Blocking invocation of an external program. A non-zero exit is an error.
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(OsString::from));
        self
    }

    /// `-i <path>`, for ffmpeg-style inputs.
    pub fn input(self, path: impl AsRef<Path>) -> Self {
        self.arg("-i").arg(path.as_ref())
    }

    /// Runs to completion, returning captured stdout/stderr on success.
    pub fn execute(self) -> Result<Output, ToolError> {
        let program = self.program.display().to_string();
        debug!(program = %program, args = ?self.args, "running external tool");

        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ToolError::NotInstalled(program.clone()),
                _ => ToolError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ToolError::ExecutionFailed {
                program,
                status: output.status,
                stderr,
            });
        }

        Ok(output)
    }
}

/// Whether `program` can be spawned at all (`<program> -version`).
pub fn is_installed(program: impl AsRef<Path>) -> bool {
    Command::new(program.as_ref())
        .arg("-version")
        .output()
        .is_ok()
}
