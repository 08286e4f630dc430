//! Image metadata writer
//!
//! Every format is edited at the container level so pixel data is never
//! re-encoded:
//!
//! | Format | Written                                                         |
//! |--------|-----------------------------------------------------------------|
//! | JPEG   | EXIF APP1: `DateTimeOriginal`, GPS lat/lon + reference letters  |
//! | PNG    | `tEXt` `Timestamp`; `eXIf` with the JPEG block when GPS is known |
//! | GIF    | comment extension holding the time (no GPS field exists)        |
//! | HEIC   | bridged through a scratch JPEG with ImageMagick                 |

use std::fs;
use std::io::Cursor;
use std::path::Path;

use exif::{Field, In, Tag, Value};
use img_parts::jpeg::Jpeg;
use img_parts::png::{Png, PngChunk};
use img_parts::{Bytes, ImageEXIF};
use tracing::{debug, info};

use crate::convert::FormatConverter;
use crate::error::Result;
use crate::gif;
use crate::media::{detect_image_kind, MediaKind};
use crate::metadata::MetadataPayload;
use crate::scratch;

const PNG_TEXT: [u8; 4] = *b"tEXt";
const PNG_END: [u8; 4] = *b"IEND";
const PNG_TIMESTAMP_KEYWORD: &str = "Timestamp";

/// Tags this writer owns; earlier values are dropped.
const REPLACED_TAGS: [Tag; 6] = [
    Tag::DateTimeOriginal,
    Tag::GPSVersionID,
    Tag::GPSLatitudeRef,
    Tag::GPSLatitude,
    Tag::GPSLongitudeRef,
    Tag::GPSLongitude,
];

/// Pointer and offset tags the EXIF writer regenerates itself.
const LAYOUT_TAGS: [Tag; 9] = [
    Tag::ExifIFDPointer,
    Tag::GPSInfoIFDPointer,
    Tag::InteropIFDPointer,
    Tag::StripOffsets,
    Tag::StripByteCounts,
    Tag::TileOffsets,
    Tag::TileByteCounts,
    Tag::JPEGInterchangeFormat,
    Tag::JPEGInterchangeFormatLength,
];

/// What happened to an image handed to [`ImageMetadataWriter::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageWrite {
    Written(MediaKind),
    /// Content is not a format with a writer; the file was left alone.
    Unsupported,
}

pub struct ImageMetadataWriter {
    converter: FormatConverter,
}

impl ImageMetadataWriter {
    pub fn new(converter: FormatConverter) -> Self {
        Self { converter }
    }

    /// Embed `payload` into the image at `path`, in place.
    ///
    /// The format is taken from the file's content, not its extension.
    pub fn write(&self, path: &Path, payload: &MetadataPayload) -> Result<ImageWrite> {
        let kind = detect_image_kind(path)?;

        match kind {
            MediaKind::Jpeg => embed_jpeg_exif(path, payload)?,
            MediaKind::Png => embed_png_metadata(path, payload)?,
            MediaKind::Gif => embed_gif_comment(path, payload)?,
            MediaKind::Heic => self.bridge_heic(path, payload)?,
            MediaKind::Mov | MediaKind::Mp4 | MediaKind::Unsupported => {
                return Ok(ImageWrite::Unsupported)
            }
        }

        info!("{}: wrote {} metadata ({})", path.display(), kind, payload.formatted_time());
        Ok(ImageWrite::Written(kind))
    }

    /// HEIC -> scratch JPEG -> EXIF -> scratch HEIC -> rename over original.
    ///
    /// The original is only replaced by the final rename, so any failure
    /// before it leaves the source untouched. Both scratch files are removed
    /// on every path.
    fn bridge_heic(&self, path: &Path, payload: &MetadataPayload) -> Result<()> {
        let jpeg = scratch::scratch_file(path, ".jpeg")?;
        self.converter.convert(path, jpeg.path())?;
        debug!("{}: bridged to {}", path.display(), jpeg.path().display());

        embed_jpeg_exif(jpeg.path(), payload)?;

        // `.heic` even when the original is misnamed, so magick writes HEIC
        let heic = scratch::scratch_file(path, ".heic")?;
        self.converter.convert(jpeg.path(), heic.path())?;
        scratch::persist_over(heic, path)?;

        Ok(())
    }
}

impl Default for ImageMetadataWriter {
    fn default() -> Self {
        Self::new(FormatConverter::default())
    }
}

fn ascii(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

fn read_exif(data: &[u8]) -> Option<exif::Exif> {
    exif::Reader::new()
        .read_from_container(&mut Cursor::new(data))
        .ok()
}

/// Build a TIFF-structured EXIF block: the primary-image fields of
/// `existing` plus the time and GPS fields from `payload`.
pub fn build_exif(existing: Option<&exif::Exif>, payload: &MetadataPayload) -> Result<Vec<u8>> {
    let mut fields: Vec<Field> = existing
        .map(|exif| {
            exif.fields()
                .filter(|f| f.ifd_num == In::PRIMARY)
                .filter(|f| !REPLACED_TAGS.contains(&f.tag) && !LAYOUT_TAGS.contains(&f.tag))
                .filter(|f| !matches!(f.value, Value::Unknown(..)))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    fields.push(ascii(Tag::DateTimeOriginal, &payload.exif_time()));

    if let Some(gps) = &payload.gps {
        fields.push(Field {
            tag: Tag::GPSVersionID,
            ifd_num: In::PRIMARY,
            value: Value::Byte(vec![2, 2, 0, 0]),
        });
        fields.push(ascii(Tag::GPSLatitudeRef, gps.latitude_ref()));
        fields.push(Field {
            tag: Tag::GPSLatitude,
            ifd_num: In::PRIMARY,
            value: Value::Rational(gps.latitude_dms().to_exif_rationals()),
        });
        fields.push(ascii(Tag::GPSLongitudeRef, gps.longitude_ref()));
        fields.push(Field {
            tag: Tag::GPSLongitude,
            ifd_num: In::PRIMARY,
            value: Value::Rational(gps.longitude_dms().to_exif_rationals()),
        });
    }

    let mut writer = exif::experimental::Writer::new();
    for field in &fields {
        writer.push_field(field);
    }

    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, false)?;
    Ok(buf.into_inner())
}

/// Swap the JPEG's EXIF APP1 segment for one carrying `payload`.
pub fn embed_jpeg_exif(path: &Path, payload: &MetadataPayload) -> Result<()> {
    let data = fs::read(path)?;
    let exif_block = build_exif(read_exif(&data).as_ref(), payload)?;

    let mut jpeg = Jpeg::from_bytes(Bytes::from(data))?;
    jpeg.set_exif(Some(Bytes::from(exif_block)));

    scratch::replace_file(path, &jpeg.encoder().bytes())?;
    Ok(())
}

/// `tEXt` `Timestamp` chunk, plus `eXIf` when there is a location to store.
pub fn embed_png_metadata(path: &Path, payload: &MetadataPayload) -> Result<()> {
    let data = fs::read(path)?;
    let existing = read_exif(&data);

    let mut png = Png::from_bytes(Bytes::from(data))?;

    let mut text = Vec::from(PNG_TIMESTAMP_KEYWORD.as_bytes());
    text.push(0);
    let keyword_len = text.len();
    text.extend_from_slice(payload.formatted_time().as_bytes());

    let chunks = png.chunks_mut();
    chunks.retain(|c| !(c.kind() == PNG_TEXT && c.contents().starts_with(&text[..keyword_len])));
    let end = chunks
        .iter()
        .position(|c| c.kind() == PNG_END)
        .unwrap_or(chunks.len());
    chunks.insert(end, PngChunk::new(PNG_TEXT, Bytes::from(text)));

    if payload.gps.is_some() {
        let exif_block = build_exif(existing.as_ref(), payload)?;
        png.set_exif(Some(Bytes::from(exif_block)));
    }

    scratch::replace_file(path, &png.encoder().bytes())?;
    Ok(())
}

pub fn embed_gif_comment(path: &Path, payload: &MetadataPayload) -> Result<()> {
    let data = fs::read(path)?;
    let updated = gif::set_comment(&data, &payload.formatted_time())?;

    if payload.gps.is_some() {
        debug!("{}: GIF has no location field, GPS not written", path.display());
    }

    scratch::replace_file(path, &updated)?;
    Ok(())
}
