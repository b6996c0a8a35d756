//! Persisted track record
//!
//! JSON layout matches the viewer's `.rwt` cache files: PascalCase keys and
//! unknown doubles written as the string `"NaN"`. Files ending in `.gz` are
//! transparently (de)compressed.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};
use crate::types::{Fix, Motion};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrackRecord {
    pub id: i64,
    pub start_at: DateTime<FixedOffset>,
    pub end_at: DateTime<FixedOffset>,
    pub locations: Vec<RecordLocation>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordLocation {
    #[serde(with = "nan_as_string")]
    pub latitude: f64,
    #[serde(with = "nan_as_string")]
    pub longitude: f64,
    #[serde(with = "nan_as_string")]
    pub heading: f64,
    #[serde(with = "nan_as_string")]
    pub speed: f64,
    pub timestamp: DateTime<FixedOffset>,
    pub index: usize,
}

impl TrackRecord {
    /// Builds a record from timed fixes. Missing motion is stored as NaN,
    /// a missing index as the fix's position in the slice.
    pub fn from_fixes(id: i64, fixes: &[Fix]) -> Result<Self> {
        let locations = fixes
            .iter()
            .enumerate()
            .map(|(i, fix)| {
                let timestamp = fix.timestamp.ok_or_else(|| {
                    TrackError::InvalidInput(format!("fix {i} has no timestamp to persist"))
                })?;
                let motion = fix.motion.unwrap_or(Motion {
                    speed: f64::NAN,
                    heading: f64::NAN,
                });
                Ok(RecordLocation {
                    latitude: fix.latitude(),
                    longitude: fix.longitude(),
                    heading: motion.heading,
                    speed: motion.speed,
                    timestamp,
                    index: fix.index.unwrap_or(i),
                })
            })
            .collect::<Result<Vec<RecordLocation>>>()?;

        let (start_at, end_at) = match (locations.first(), locations.last()) {
            (Some(first), Some(last)) => (first.timestamp, last.timestamp),
            _ => {
                return Err(TrackError::InvalidInput(
                    "cannot persist an empty track".to_string(),
                ))
            }
        };

        Ok(Self {
            id,
            start_at,
            end_at,
            locations,
        })
    }

    /// Indexed fixes in stored order
    pub fn to_fixes(&self) -> Vec<Fix> {
        self.locations
            .iter()
            .map(|loc| {
                Fix::moving(
                    loc.latitude,
                    loc.longitude,
                    loc.speed,
                    loc.heading,
                    loc.timestamp,
                )
                .with_index(loc.index)
            })
            .collect()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        if is_gzip(path) {
            let reader = BufReader::new(GzDecoder::new(file));
            Ok(serde_json::from_reader(reader)?)
        } else {
            let reader = BufReader::new(file);
            Ok(serde_json::from_reader(reader)?)
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let file = File::create(path)?;
        if is_gzip(path) {
            let mut encoder = GzEncoder::new(file, Compression::default());
            encoder.write_all(json.as_bytes())?;
            encoder.finish()?;
        } else {
            let mut writer = BufWriter::new(file);
            writer.write_all(json.as_bytes())?;
            writer.flush()?;
        }
        Ok(())
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().map(|e| e == "gz").unwrap_or(false)
}

/// NaN travels as the string "NaN"; every other value as a plain number.
mod nan_as_string {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_nan() {
            serializer.serialize_str("NaN")
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(v) => Ok(v),
            NumberOrString::Text(s) if s == "NaN" => Ok(f64::NAN),
            NumberOrString::Text(s) => Err(D::Error::custom(format!(
                "expected a number or \"NaN\", got {s:?}"
            ))),
        }
    }
}
