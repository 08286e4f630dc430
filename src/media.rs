//! Media kinds, the extension search order and content sniffing

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::{ImageFormat, ImageReader};
use tracing::debug;

use crate::error::Result;

/// Extensions probed for a sidecar's media file, in priority order.
pub const MEDIA_EXTENSIONS: [&str; 7] = ["JPG", "JPEG", "HEIC", "MOV", "MP4", "PNG", "GIF"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Jpeg,
    Png,
    Gif,
    Heic,
    Mov,
    Mp4,
    Unsupported,
}

impl MediaKind {
    /// Case-insensitive.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => MediaKind::Jpeg,
            "png" => MediaKind::Png,
            "gif" => MediaKind::Gif,
            "heic" => MediaKind::Heic,
            "mov" => MediaKind::Mov,
            "mp4" => MediaKind::Mp4,
            _ => MediaKind::Unsupported,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(MediaKind::Unsupported, Self::from_extension)
    }

    pub fn is_image(self) -> bool {
        matches!(
            self,
            MediaKind::Jpeg | MediaKind::Png | MediaKind::Gif | MediaKind::Heic
        )
    }

    pub fn is_video(self) -> bool {
        matches!(self, MediaKind::Mov | MediaKind::Mp4)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Jpeg => "JPEG",
            MediaKind::Png => "PNG",
            MediaKind::Gif => "GIF",
            MediaKind::Heic => "HEIC",
            MediaKind::Mov => "MOV",
            MediaKind::Mp4 => "MP4",
            MediaKind::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect an image's container from its bytes, ignoring the extension.
///
/// JPEG/PNG/GIF headers are validated by `image` (a corrupt header is an
/// error). HEIC is recognised by its ISO-BMFF brand since `image` has no
/// decoder for it. Anything else is [`MediaKind::Unsupported`].
pub fn detect_image_kind(path: &Path) -> Result<MediaKind> {
    // `ImageReader::open` would preset the format from the extension
    let reader = ImageReader::new(BufReader::new(File::open(path)?)).with_guessed_format()?;

    let kind = match reader.format() {
        Some(ImageFormat::Jpeg) => MediaKind::Jpeg,
        Some(ImageFormat::Png) => MediaKind::Png,
        Some(ImageFormat::Gif) => MediaKind::Gif,
        Some(other) => {
            debug!("{}: detected {:?}, no metadata writer", path.display(), other);
            return Ok(MediaKind::Unsupported);
        }
        None => {
            let mime = infer::get_from_path(path)?.map(|t| t.mime_type());
            debug!("{}: magic number says {:?}", path.display(), mime);
            return Ok(match mime {
                Some("image/heif") | Some("image/heic") => MediaKind::Heic,
                _ => MediaKind::Unsupported,
            });
        }
    };

    let (width, height) = reader.into_dimensions()?;
    debug!("{}: {} {}x{}", path.display(), kind, width, height);

    Ok(kind)
}
