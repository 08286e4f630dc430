//! Sidecar -> media matching and per-file routing

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::convert::FormatConverter;
use crate::error::Result;
use crate::image::{ImageMetadataWriter, ImageWrite};
use crate::media::{MediaKind, MEDIA_EXTENSIONS};
use crate::metadata::MetadataPayload;
use crate::sidecar::Sidecar;
use crate::summary::Summary;
use crate::video::VideoMetadataWriter;

const SIDECAR_SUFFIX: &str = ".json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoMatchingMedia,
    /// The matched file's content has no metadata writer.
    UnsupportedFormat(PathBuf),
}

/// Result of handling one sidecar. Never aborts the batch.
#[derive(Debug)]
pub enum FileOutcome {
    Updated { media: PathBuf, kind: MediaKind },
    Skipped { sidecar: PathBuf, reason: SkipReason },
    Failed { sidecar: PathBuf, error: crate::error::MediaError },
}

/// `IMG_0001.json` -> `IMG_0001`. The suffix is matched case-insensitively.
pub fn sidecar_base_name(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    let split = name.len().checked_sub(SIDECAR_SUFFIX.len())?;
    if split == 0 || !name.is_char_boundary(split) {
        return None;
    }
    let (base, suffix) = name.split_at(split);
    suffix.eq_ignore_ascii_case(SIDECAR_SUFFIX).then_some(base)
}

/// Find the media file for sidecar base name `base` in `dir`.
///
/// Extensions are tried in [`MEDIA_EXTENSIONS`] order, upper case first;
/// the first existing file wins. Falls back to `base` itself when it already
/// carries a searched extension (`IMG_0001.jpg.json`).
pub fn find_media(dir: &Path, base: &str) -> Option<PathBuf> {
    for ext in MEDIA_EXTENSIONS {
        for spelling in [ext.to_string(), ext.to_ascii_lowercase()] {
            let candidate = dir.join(format!("{base}.{spelling}"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    let named = dir.join(base);
    (MediaKind::from_path(&named) != MediaKind::Unsupported && named.is_file()).then_some(named)
}

pub struct Dispatcher {
    config: Config,
    images: ImageMetadataWriter,
    videos: VideoMetadataWriter,
}

impl Dispatcher {
    pub fn new(config: Config) -> Self {
        let images = ImageMetadataWriter::new(FormatConverter::new(&config.tools.magick));
        let videos = VideoMetadataWriter::new(&config.tools.ffmpeg);
        Self {
            config,
            images,
            videos,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sidecars in the configured directory, sorted by file name.
    pub fn sidecars(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.config.directory)? {
            let path = entry?.path();
            if path.is_file() && sidecar_base_name(&path).is_some() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Process every sidecar. Only an unreadable directory is an error;
    /// per-file problems end up in the summary.
    pub fn run(&self) -> Result<Summary> {
        let sidecars = self.sidecars()?;
        info!(
            "{}: {} sidecar files",
            self.config.directory.display(),
            sidecars.len()
        );

        let mut summary = Summary::new();
        for sidecar in &sidecars {
            let outcome = self.process_sidecar(sidecar);
            summary.record(&outcome);
        }

        info!("{summary}");
        Ok(summary)
    }

    pub fn process_sidecar(&self, path: &Path) -> FileOutcome {
        let skipped = |reason: SkipReason| FileOutcome::Skipped {
            sidecar: path.to_path_buf(),
            reason,
        };

        let Some(base) = sidecar_base_name(path) else {
            return skipped(SkipReason::NoMatchingMedia);
        };
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let (media, sidecar) = match find_media(dir, base) {
            Some(media) => (media, Sidecar::load(path)),
            None => {
                // Exported names are sometimes truncated; the title keeps the
                // full original name.
                let sidecar = match Sidecar::load(path) {
                    Ok(sidecar) => sidecar,
                    Err(error) => {
                        warn!("{}: no media file, sidecar unreadable: {}", path.display(), error);
                        return skipped(SkipReason::NoMatchingMedia);
                    }
                };
                match sidecar.media_file_name().and_then(|name| find_media(dir, name)) {
                    Some(media) => (media, Ok(sidecar)),
                    None => {
                        debug!("{}: no media file", path.display());
                        return skipped(SkipReason::NoMatchingMedia);
                    }
                }
            }
        };
        debug!("{} -> {}", path.display(), media.display());

        let result = sidecar
            .and_then(|sidecar| MetadataPayload::from_sidecar(&sidecar))
            .and_then(|payload| self.apply(&media, &payload));

        match result {
            Ok(Some(kind)) => FileOutcome::Updated { media, kind },
            Ok(None) => {
                warn!("{}: unsupported format, left unchanged", media.display());
                skipped(SkipReason::UnsupportedFormat(media))
            }
            Err(error) => {
                warn!("{}: {}", media.display(), error);
                FileOutcome::Failed {
                    sidecar: path.to_path_buf(),
                    error,
                }
            }
        }
    }

    /// `Ok(None)` when no writer exists for the file's content.
    fn apply(&self, media: &Path, payload: &MetadataPayload) -> Result<Option<MediaKind>> {
        let kind = MediaKind::from_path(media);

        if kind.is_image() {
            return Ok(match self.images.write(media, payload)? {
                ImageWrite::Written(kind) => Some(kind),
                ImageWrite::Unsupported => None,
            });
        }
        if kind.is_video() {
            self.videos.write(media, &payload.video_fields())?;
            return Ok(Some(kind));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;
    use tempfile::TempDir;

    const SIDECAR: &str = r#"{
        "title": "IMG_0001.jpg",
        "photoTakenTime": {"timestamp": "1700000000"},
        "geoData": {"latitude": 37.7749, "longitude": -122.4194}
    }"#;

    #[test]
    fn test_sidecar_base_name() {
        assert_eq!(sidecar_base_name(Path::new("dir/IMG_1.json")), Some("IMG_1"));
        assert_eq!(sidecar_base_name(Path::new("IMG_1.JSON")), Some("IMG_1"));
        assert_eq!(sidecar_base_name(Path::new("IMG_1.jpg.json")), Some("IMG_1.jpg"));
        assert_eq!(sidecar_base_name(Path::new(".json")), None);
        assert_eq!(sidecar_base_name(Path::new("IMG_1.jpg")), None);
    }

    #[test]
    fn test_find_media_priority() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.PNG"), b"").unwrap();
        fs::write(dir.path().join("a.jpg"), b"").unwrap();
        fs::write(dir.path().join("a.MOV"), b"").unwrap();

        assert_eq!(find_media(dir.path(), "a"), Some(dir.path().join("a.jpg")));
        assert_eq!(find_media(dir.path(), "b"), None);
    }

    #[test]
    fn test_find_media_base_name_with_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("IMG_1.heic"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();

        assert_eq!(
            find_media(dir.path(), "IMG_1.heic"),
            Some(dir.path().join("IMG_1.heic"))
        );
        assert_eq!(find_media(dir.path(), "notes.txt"), None);
    }

    #[test]
    fn test_unmatched_sidecar_is_skipped() {
        let dir = TempDir::new().unwrap();
        let sidecar = dir.path().join("lonely.json");
        fs::write(&sidecar, SIDECAR).unwrap();

        let dispatcher = Dispatcher::new(Config::new(dir.path()));
        let outcome = dispatcher.process_sidecar(&sidecar);

        assert!(matches!(
            outcome,
            FileOutcome::Skipped {
                reason: SkipReason::NoMatchingMedia,
                ..
            }
        ));
    }

    #[test]
    fn test_title_fallback() {
        let dir = TempDir::new().unwrap();
        let media = dir.path().join("IMG_0001.jpg");
        image::RgbImage::new(4, 4).save(&media).unwrap();
        let sidecar = dir.path().join("IMG_000.json");
        fs::write(&sidecar, SIDECAR).unwrap();

        let dispatcher = Dispatcher::new(Config::new(dir.path()));
        let outcome = dispatcher.process_sidecar(&sidecar);

        assert!(matches!(
            outcome,
            FileOutcome::Updated { kind: MediaKind::Jpeg, media: ref m } if *m == media
        ));
    }

    #[test]
    fn test_malformed_sidecar_fails() {
        let dir = TempDir::new().unwrap();
        image::RgbImage::new(4, 4)
            .save(dir.path().join("IMG_2.PNG"))
            .unwrap();
        let sidecar = dir.path().join("IMG_2.json");
        fs::write(&sidecar, r#"{"geoData": {"latitude": 1.0, "longitude": 2.0}}"#).unwrap();

        let dispatcher = Dispatcher::new(Config::new(dir.path()));
        let outcome = dispatcher.process_sidecar(&sidecar);

        assert!(matches!(
            outcome,
            FileOutcome::Failed {
                error: MediaError::Sidecar { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_unreadable_sidecar_without_media_is_skipped() {
        let dir = TempDir::new().unwrap();
        let sidecar = dir.path().join("IMG_9.json");
        fs::write(&sidecar, "{ not json").unwrap();

        let dispatcher = Dispatcher::new(Config::new(dir.path()));
        let outcome = dispatcher.process_sidecar(&sidecar);

        assert!(matches!(
            outcome,
            FileOutcome::Skipped {
                reason: SkipReason::NoMatchingMedia,
                ..
            }
        ));
    }

    #[test]
    fn test_sidecars_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["b.json", "a.JSON", "c.jpg", "d.json.bak"] {
            fs::write(dir.path().join(name), b"{}").unwrap();
        }
        fs::create_dir(dir.path().join("e.json")).unwrap();

        let dispatcher = Dispatcher::new(Config::new(dir.path()));
        let names: Vec<_> = dispatcher
            .sidecars()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.JSON", "b.json"]);
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let dispatcher = Dispatcher::new(Config::new(dir.path().join("gone")));

        assert!(dispatcher.run().is_err());
    }
}
