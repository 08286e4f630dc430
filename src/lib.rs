//! media_restamp - restore capture time and location into exported media
//!
//! Photo-export services strip metadata from the media they hand back and
//! put it into a JSON sidecar next to each file instead. This crate reads
//! those sidecars and writes the timestamp and GPS location back into the
//! JPEG/PNG/GIF/HEIC images and MOV/MP4 videos they describe.
//!
//! Images are edited at the container level in-process; HEIC goes through
//! ImageMagick and videos through the system `ffmpeg` binary (streams are
//! copied, never re-encoded).

pub mod command;
pub mod config;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod gif;
pub mod gps;
pub mod image;
pub mod media;
pub mod metadata;
pub mod scratch;
pub mod sidecar;
pub mod summary;
pub mod video;

pub use command::{ToolCommand, ToolError};
pub use config::{Config, ToolPaths};
pub use convert::FormatConverter;
pub use crate::image::{ImageMetadataWriter, ImageWrite};
pub use dispatch::{find_media, Dispatcher, FileOutcome, SkipReason};
pub use error::{MediaError, Result};
pub use gps::{to_dms, Dms, GpsCoordinates};
pub use media::{MediaKind, MEDIA_EXTENSIONS};
pub use metadata::MetadataPayload;
pub use sidecar::Sidecar;
pub use summary::Summary;
pub use video::VideoMetadataWriter;
