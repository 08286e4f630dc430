//! Per-file metadata payload built from a sidecar record

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::gps::GpsCoordinates;
use crate::sidecar::Sidecar;

/// Human-readable UTC time written into PNG text, GIF comments and video tags.
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Container `creation_time`; the `Z` keeps ffmpeg from reading it as local time.
pub const ISO_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// EXIF `DateTimeOriginal` layout.
pub const EXIF_TIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// What gets embedded into one media file. Built fresh for every file.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataPayload {
    pub taken_at: DateTime<Utc>,
    pub gps: Option<GpsCoordinates>,
}

impl MetadataPayload {
    pub fn new(taken_at: DateTime<Utc>, gps: Option<GpsCoordinates>) -> Self {
        Self { taken_at, gps }
    }

    pub fn from_sidecar(sidecar: &Sidecar) -> Result<Self> {
        Ok(Self::new(sidecar.taken_at()?, sidecar.location()))
    }

    /// `YYYY-MM-DD HH:MM:SS`
    pub fn formatted_time(&self) -> String {
        self.taken_at.format(DISPLAY_TIME_FORMAT).to_string()
    }

    pub fn exif_time(&self) -> String {
        self.taken_at.format(EXIF_TIME_FORMAT).to_string()
    }

    pub fn iso_time(&self) -> String {
        self.taken_at.format(ISO_TIME_FORMAT).to_string()
    }

    /// Container tags for the video writer, in write order.
    pub fn video_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("creation_time", self.iso_time())];
        if let Some(gps) = &self.gps {
            fields.push(("location", gps.iso6709()));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(gps: Option<GpsCoordinates>) -> MetadataPayload {
        MetadataPayload::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap(), gps)
    }

    #[test]
    fn test_time_formats() {
        let payload = payload(None);

        assert_eq!(payload.formatted_time(), "2023-11-14 22:13:20");
        assert_eq!(payload.exif_time(), "2023:11:14 22:13:20");
        assert_eq!(payload.iso_time(), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_video_fields() {
        let with_gps = payload(Some(GpsCoordinates::new(37.7749, 122.4194)));
        assert_eq!(
            with_gps.video_fields(),
            vec![
                ("creation_time", "2023-11-14T22:13:20Z".to_string()),
                ("location", "+37.7749+122.4194/".to_string()),
            ]
        );

        let without_gps = payload(None);
        assert_eq!(without_gps.video_fields().len(), 1);
    }
}
