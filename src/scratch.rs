//! Per-file scratch paths next to the media being rewritten
//!
//! Scratch files live in the same directory as their source so the final
//! rename is atomic, and are named after the source plus a random part so
//! two files never share one. They are removed when dropped unless
//! persisted.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Creates `.<file name>.<random><suffix>` beside `source`.
pub fn scratch_file(source: &Path, suffix: &str) -> std::io::Result<NamedTempFile> {
    let mut prefix = OsString::from(".");
    if let Some(name) = source.file_name() {
        prefix.push(name);
        prefix.push(".");
    }

    Builder::new()
        .prefix(&prefix)
        .suffix(suffix)
        .tempfile_in(parent_dir(source))
}

/// Scratch file keeping `source`'s extension, for tools that pick the
/// output format from it.
pub fn scratch_like(source: &Path) -> std::io::Result<NamedTempFile> {
    let suffix = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    scratch_file(source, &suffix)
}

/// Renames `scratch` over `path`, carrying over `path`'s permission bits
/// (scratch files are created owner-only).
pub fn persist_over(scratch: NamedTempFile, path: &Path) -> std::io::Result<()> {
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(scratch.path(), meta.permissions())?;
    }

    scratch.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Atomically replaces `path`'s contents with `bytes`.
pub fn replace_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut scratch = scratch_like(path)?;
    scratch.write_all(bytes)?;
    scratch.as_file().sync_all()?;

    persist_over(scratch, path)
}
