//! Container transcoding through ImageMagick

use std::path::{Path, PathBuf};

use crate::command::{ToolCommand, ToolError};

/// Bridges formats we cannot write metadata into (HEIC) via JPEG.
pub struct FormatConverter {
    program: PathBuf,
}

impl FormatConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// `magick convert <src> <dst>`; the output format follows `dst`'s extension.
    pub fn convert(&self, src: &Path, dst: &Path) -> Result<(), ToolError> {
        ToolCommand::new(&self.program)
            .arg("convert")
            .arg(src)
            .arg(dst)
            .execute()?;

        Ok(())
    }
}

impl Default for FormatConverter {
    fn default() -> Self {
        Self::new("magick")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_failed_conversion_is_reported() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("in.heic");
        fs::write(&src, b"not really heic").unwrap();

        let converter = FormatConverter::new("false");
        let err = converter.convert(&src, &dir.path().join("out.jpeg")).unwrap_err();

        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }

    #[test]
    fn test_missing_converter() {
        let dir = TempDir::new().unwrap();
        let converter = FormatConverter::new("no-such-magick-binary");

        let err = converter
            .convert(&dir.path().join("a.heic"), &dir.path().join("b.jpeg"))
            .unwrap_err();

        assert!(matches!(err, ToolError::NotInstalled(_)));
    }

    #[test]
    fn test_default_program() {
        assert_eq!(FormatConverter::default().program(), Path::new("magick"));
    }
}
