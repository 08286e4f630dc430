use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Malformed sidecar {}: {source}", path.display())]
    Sidecar {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("EXIF error: {0}")]
    Exif(#[from] exif::Error),

    #[error("Container error: {0}")]
    Container(#[from] img_parts::Error),

    #[error("Malformed GIF: {0}")]
    Gif(String),

    #[error("External tool error: {0}")]
    Tool(#[from] crate::command::ToolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MediaError>;
