//! Sidecar JSON records written next to exported photos and videos
//!
//! Only the subset this tool consumes is modelled:
//!
//! ```json
//! {
//!   "title": "IMG_0001.jpg",
//!   "photoTakenTime": { "timestamp": "1700000000", "formatted": "..." },
//!   "geoData": { "latitude": 37.7749, "longitude": -122.4194, "altitude": 0.0 },
//!   "geoDataExif": { "latitude": 0.0, "longitude": 0.0, "altitude": 0.0 }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{MediaError, Result};
use crate::gps::GpsCoordinates;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sidecar {
    #[serde(default)]
    pub title: Option<String>,
    pub photo_taken_time: TakenTime,
    pub geo_data: GeoData,
    #[serde(default)]
    pub geo_data_exif: Option<GeoData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TakenTime {
    pub timestamp: Timestamp,
}

/// Epoch seconds; the exporter writes a string but numbers are accepted too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GeoData {
    pub latitude: f64,
    pub longitude: f64,
}

impl Sidecar {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::parse(path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| MediaError::Sidecar {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn taken_at(&self) -> Result<DateTime<Utc>> {
        let seconds = match &self.photo_taken_time.timestamp {
            Timestamp::Number(n) => *n,
            Timestamp::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|e| MediaError::InvalidTimestamp(format!("{s:?}: {e}")))?,
        };

        DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| MediaError::InvalidTimestamp(format!("{seconds} out of range")))
    }

    /// The exported media's original file name, when it is a bare file name.
    pub fn media_file_name(&self) -> Option<&str> {
        let title = self.title.as_deref()?.trim();
        let name = Path::new(title).file_name()?.to_str()?;
        (!title.is_empty() && name == title).then_some(title)
    }

    /// `geoData`, falling back to `geoDataExif` when the former is 0/0.
    /// `None` when neither carries a location.
    pub fn location(&self) -> Option<GpsCoordinates> {
        std::iter::once(self.geo_data)
            .chain(self.geo_data_exif)
            .map(|g| GpsCoordinates::new(g.latitude, g.longitude))
            .find(|c| !c.is_unset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(text: &str) -> Result<Sidecar> {
        Sidecar::parse(&PathBuf::from("test.json"), text)
    }

    #[test]
    fn test_string_timestamp() {
        let sidecar = parse(
            r#"{"photoTakenTime": {"timestamp": "1700000000"},
                "geoData": {"latitude": 37.7749, "longitude": -122.4194}}"#,
        )
        .unwrap();

        let taken = sidecar.taken_at().unwrap();
        assert_eq!(taken.format("%Y-%m-%d %H:%M:%S").to_string(), "2023-11-14 22:13:20");
    }

    #[test]
    fn test_numeric_timestamp() {
        let sidecar = parse(
            r#"{"photoTakenTime": {"timestamp": 1700000000},
                "geoData": {"latitude": 1.0, "longitude": 2.0}}"#,
        )
        .unwrap();

        assert_eq!(sidecar.taken_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_garbage_timestamp() {
        let sidecar = parse(
            r#"{"photoTakenTime": {"timestamp": "yesterday"},
                "geoData": {"latitude": 1.0, "longitude": 2.0}}"#,
        )
        .unwrap();

        assert!(matches!(sidecar.taken_at(), Err(MediaError::InvalidTimestamp(_))));
    }

    #[test]
    fn test_missing_fields_are_sidecar_errors() {
        let err = parse(r#"{"photoTakenTime": {"timestamp": "1"}}"#).unwrap_err();
        assert!(matches!(err, MediaError::Sidecar { .. }));
        assert!(err.to_string().contains("geoData"));

        let err = parse(r#"{"geoData": {"latitude": 1.0, "longitude": 2.0}}"#).unwrap_err();
        assert!(err.to_string().contains("photoTakenTime"));
    }

    #[test]
    fn test_media_file_name() {
        let sidecar = parse(
            r#"{"title": "IMG_0001.HEIC", "photoTakenTime": {"timestamp": "1"},
                "geoData": {"latitude": 0.0, "longitude": 0.0}}"#,
        )
        .unwrap();
        assert_eq!(sidecar.media_file_name(), Some("IMG_0001.HEIC"));

        let sidecar = parse(
            r#"{"title": "../escape.jpg", "photoTakenTime": {"timestamp": "1"},
                "geoData": {"latitude": 0.0, "longitude": 0.0}}"#,
        )
        .unwrap();
        assert_eq!(sidecar.media_file_name(), None);
    }

    #[test]
    fn test_location_fallback() {
        let sidecar = parse(
            r#"{"photoTakenTime": {"timestamp": "1"},
                "geoData": {"latitude": 0.0, "longitude": 0.0},
                "geoDataExif": {"latitude": 48.8584, "longitude": 2.2945}}"#,
        )
        .unwrap();
        assert_eq!(sidecar.location(), Some(GpsCoordinates::new(48.8584, 2.2945)));

        let sidecar = parse(
            r#"{"photoTakenTime": {"timestamp": "1"},
                "geoData": {"latitude": 0.0, "longitude": 0.0}}"#,
        )
        .unwrap();
        assert_eq!(sidecar.location(), None);
    }
}
