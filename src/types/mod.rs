pub mod linalg;

pub use linalg::*;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};

/// WGS84 latitude/longitude pair in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Rejects non-finite or out-of-range coordinates before they reach the estimator.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(TrackError::InvalidInput(format!(
                "non-finite coordinate ({}, {})",
                self.latitude, self.longitude
            )));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(TrackError::InvalidInput(format!(
                "latitude {} outside [-90, 90]",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(TrackError::InvalidInput(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }

    /// GeoJSON coordinate order: `[longitude, latitude]`
    pub fn to_lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    pub fn from_lon_lat(point: [f64; 2]) -> Self {
        Self::new(point[1], point[0])
    }

    /// Map form, `(lat, lon)`
    pub fn to_map_string(&self) -> String {
        format!("({}, {})", self.latitude, self.longitude)
    }

    /// WKT form, `POINT(lon lat)`
    pub fn to_wkt(&self) -> String {
        format!("POINT({} {})", self.longitude, self.latitude)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

impl FromStr for Position {
    type Err = TrackError;

    /// Accepts `lat,lon`, `(lat, lon)` and `POINT(lon lat)`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TrackError::InvalidInput(format!("cannot parse position from {s:?}"));
        let number = |part: &str| part.trim().parse::<f64>().map_err(|_| invalid());

        if let Some(inner) = s.strip_prefix("POINT(").and_then(|r| r.strip_suffix(')')) {
            let parts: Vec<&str> = inner.split_whitespace().collect();
            if parts.len() != 2 {
                return Err(invalid());
            }
            return Ok(Self::new(number(parts[1])?, number(parts[0])?));
        }

        let inner = match s.strip_prefix('(') {
            Some(rest) => rest.strip_suffix(')').ok_or_else(invalid)?,
            None => s,
        };
        let parts: Vec<&str> = inner.split(',').collect();
        if parts.len() != 2 {
            return Err(invalid());
        }
        Ok(Self::new(number(parts[0])?, number(parts[1])?))
    }
}

/// Receiver-reported motion; carried through filtering untouched
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    /// m/s, NaN when the receiver did not report it
    pub speed: f64,
    /// degrees from north, NaN when unknown
    pub heading: f64,
}

/// Which attachments a fix carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixKind {
    Plain,
    Timed,
    Motion,
    Indexed,
}

/// One GPS sample: a position plus optional time, motion and original index.
///
/// Equality compares the kind and the coordinates only, so a timed fix never
/// equals a plain fix at the same spot, while two timed fixes at the same spot
/// are equal regardless of their instants. Unknown (NaN) coordinates compare
/// equal to each other, so an unknown fix equals itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Fix {
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion: Option<Motion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Position::new(latitude, longitude),
            timestamp: None,
            motion: None,
            index: None,
        }
    }

    pub fn timed(latitude: f64, longitude: f64, timestamp: DateTime<FixedOffset>) -> Self {
        Self::new(latitude, longitude).with_timestamp(timestamp)
    }

    pub fn moving(
        latitude: f64,
        longitude: f64,
        speed: f64,
        heading: f64,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self::timed(latitude, longitude, timestamp).with_motion(Motion { speed, heading })
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = Some(motion);
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Same fix moved to another position; time, motion and index are kept.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn kind(&self) -> FixKind {
        if self.index.is_some() {
            FixKind::Indexed
        } else if self.motion.is_some() {
            FixKind::Motion
        } else if self.timestamp.is_some() {
            FixKind::Timed
        } else {
            FixKind::Plain
        }
    }

    pub fn latitude(&self) -> f64 {
        self.position.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.position.longitude
    }
}

impl PartialEq for Fix {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind()
            && same_coordinate(self.position.latitude, other.position.latitude)
            && same_coordinate(self.position.longitude, other.position.longitude)
    }
}

fn same_coordinate(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}
