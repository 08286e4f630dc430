//! GIF block walker
//!
//! GIF has no metadata container; the closest thing is the comment extension
//! (`0x21 0xFE`). Rewriting it only needs the block layout, so the stream is
//! walked rather than decoded and re-encoded, which keeps every frame's
//! LZW data byte-identical.

use crate::error::{MediaError, Result};

const EXTENSION_INTRODUCER: u8 = 0x21;
const IMAGE_SEPARATOR: u8 = 0x2C;
const TRAILER: u8 = 0x3B;
const COMMENT_LABEL: u8 = 0xFE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Comment,
    Other,
}

#[derive(Debug)]
struct Layout {
    /// End of header, logical screen descriptor and global color table.
    preamble_end: usize,
    /// Byte ranges of every block between the preamble and the trailer.
    blocks: Vec<(BlockKind, usize, usize)>,
}

fn malformed(msg: impl Into<String>) -> MediaError {
    MediaError::Gif(msg.into())
}

fn byte(data: &[u8], pos: usize) -> Result<u8> {
    data.get(pos)
        .copied()
        .ok_or_else(|| malformed(format!("unexpected end of data at offset {pos}")))
}

fn color_table_len(packed: u8) -> usize {
    if packed & 0x80 != 0 {
        3 << ((packed & 0x07) + 1)
    } else {
        0
    }
}

/// Returns the offset just past the zero-length terminator.
fn skip_sub_blocks(data: &[u8], mut pos: usize) -> Result<usize> {
    loop {
        let len = byte(data, pos)? as usize;
        pos += 1;
        if len == 0 {
            return Ok(pos);
        }
        pos += len;
    }
}

fn walk(data: &[u8]) -> Result<Layout> {
    if !(data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a")) {
        return Err(malformed("missing GIF signature"));
    }

    let screen_packed = byte(data, 10)?;
    let preamble_end = 13 + color_table_len(screen_packed);
    let mut blocks = Vec::new();
    let mut pos = preamble_end;

    loop {
        match byte(data, pos)? {
            EXTENSION_INTRODUCER => {
                let label = byte(data, pos + 1)?;
                let end = skip_sub_blocks(data, pos + 2)?;
                let kind = if label == COMMENT_LABEL {
                    BlockKind::Comment
                } else {
                    BlockKind::Other
                };
                blocks.push((kind, pos, end));
                pos = end;
            }
            IMAGE_SEPARATOR => {
                let packed = byte(data, pos + 9)?;
                // descriptor, local color table, LZW minimum code size
                let lzw_start = pos + 10 + color_table_len(packed) + 1;
                let end = skip_sub_blocks(data, lzw_start)?;
                blocks.push((BlockKind::Other, pos, end));
                pos = end;
            }
            TRAILER => return Ok(Layout { preamble_end, blocks }),
            other => {
                return Err(malformed(format!(
                    "unknown block 0x{other:02X} at offset {pos}"
                )))
            }
        }
    }
}

/// Comment extensions in stream order, decoded lossily as UTF-8.
pub fn comments(data: &[u8]) -> Result<Vec<String>> {
    let layout = walk(data)?;

    Ok(layout
        .blocks
        .iter()
        .filter(|(kind, _, _)| *kind == BlockKind::Comment)
        .map(|&(_, start, end)| {
            let mut text = Vec::new();
            let mut pos = start + 2;
            while pos < end {
                let len = data[pos] as usize;
                text.extend_from_slice(&data[pos + 1..pos + 1 + len]);
                pos += 1 + len;
            }
            String::from_utf8_lossy(&text).into_owned()
        })
        .collect())
}

/// Replace all comment extensions with a single one holding `comment`,
/// placed right before the trailer. Upgrades a GIF87a header to GIF89a.
pub fn set_comment(data: &[u8], comment: &str) -> Result<Vec<u8>> {
    let layout = walk(data)?;

    let mut out = Vec::with_capacity(data.len() + comment.len() + 8);
    out.extend_from_slice(&data[..layout.preamble_end]);
    out[..6].copy_from_slice(b"GIF89a");

    for &(kind, start, end) in &layout.blocks {
        if kind == BlockKind::Other {
            out.extend_from_slice(&data[start..end]);
        }
    }

    out.extend_from_slice(&[EXTENSION_INTRODUCER, COMMENT_LABEL]);
    for chunk in comment.as_bytes().chunks(255) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
    out.push(0);
    out.push(TRAILER);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn sample_gif() -> Vec<u8> {
        let mut img = RgbaImage::new(3, 2);
        img.put_pixel(1, 1, image::Rgba([255, 0, 0, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Gif).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_set_comment_keeps_pixels() {
        let original = sample_gif();
        let updated = set_comment(&original, "2023-11-14 22:13:20").unwrap();

        assert_eq!(comments(&updated).unwrap(), vec!["2023-11-14 22:13:20"]);

        let before = image::load_from_memory(&original).unwrap().to_rgba8();
        let after = image::load_from_memory(&updated).unwrap().to_rgba8();
        assert_eq!(before, after);
    }

    #[test]
    fn test_set_comment_replaces_previous() {
        let once = set_comment(&sample_gif(), "first").unwrap();
        let twice = set_comment(&once, "second").unwrap();

        assert_eq!(comments(&twice).unwrap(), vec!["second"]);
    }

    #[test]
    fn test_long_comment_is_split_into_sub_blocks() {
        let long = "x".repeat(600);
        let updated = set_comment(&sample_gif(), &long).unwrap();

        assert_eq!(comments(&updated).unwrap(), vec![long]);
    }

    #[test]
    fn test_rejects_non_gif() {
        assert!(matches!(set_comment(b"\x89PNG....", "x"), Err(MediaError::Gif(_))));
    }

    #[test]
    fn test_rejects_truncated_gif() {
        let gif = sample_gif();
        let truncated = &gif[..gif.len() - 4];

        assert!(set_comment(truncated, "x").is_err());
    }
}
