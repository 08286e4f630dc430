//! Decimal degree <-> degrees/minutes/seconds conversion

use exif::Rational;
use serde::{Deserialize, Serialize};

/// Degrees/minutes/seconds. All three components carry the sign of the
/// decimal value they came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dms {
    pub degrees: i32,
    pub minutes: i32,
    pub seconds: f64,
}

/// Split a decimal degree value into DMS by truncation.
///
/// No range validation is done. `-122.4194` yields `(-122, -25, -9.84)`;
/// hemisphere letters come from [`GpsCoordinates`], not from here.
pub fn to_dms(value: f64) -> Dms {
    let degrees = value.trunc();
    let minutes = ((value - degrees) * 60.0).trunc();
    let seconds = (value - degrees - minutes / 60.0) * 3600.0;

    Dms {
        degrees: degrees as i32,
        minutes: minutes as i32,
        seconds,
    }
}

impl Dms {
    pub fn to_decimal(&self) -> f64 {
        self.degrees as f64 + self.minutes as f64 / 60.0 + self.seconds / 3600.0
    }

    /// EXIF `GPSLatitude`/`GPSLongitude` triple: `deg/1, min/1, sec*100/100`.
    /// Rationals are unsigned, so magnitudes are used.
    pub fn to_exif_rationals(&self) -> Vec<Rational> {
        vec![
            Rational {
                num: self.degrees.unsigned_abs(),
                denom: 1,
            },
            Rational {
                num: self.minutes.unsigned_abs(),
                denom: 1,
            },
            Rational {
                num: (self.seconds.abs() * 100.0) as u32,
                denom: 100,
            },
        ]
    }
}

/// GPS location
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsCoordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// The export service writes 0/0 when it has no location.
    pub fn is_unset(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    pub fn latitude_ref(&self) -> &'static str {
        if self.latitude >= 0.0 {
            "N"
        } else {
            "S"
        }
    }

    pub fn longitude_ref(&self) -> &'static str {
        if self.longitude >= 0.0 {
            "E"
        } else {
            "W"
        }
    }

    pub fn latitude_dms(&self) -> Dms {
        to_dms(self.latitude)
    }

    pub fn longitude_dms(&self) -> Dms {
        to_dms(self.longitude)
    }

    /// ISO 6709 point as used by QuickTime `location`, e.g. `+37.7749-122.4194/`.
    pub fn iso6709(&self) -> String {
        format!("{:+}{:+}/", self.latitude, self.longitude)
    }
}
