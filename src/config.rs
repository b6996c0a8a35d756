use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::filters::FilterParameters;

pub const DEFAULT_MODEL_PRECISION: f64 = 1.0;
pub const DEFAULT_SENSOR_PRECISION: f64 = 10.0;
pub const DEFAULT_OUTLINE_SPEED: f64 = 60.0; // m/s, ~216 km/h
pub const DEFAULT_ZERO_SPEED_DRIFT: f64 = 0.5; // m/s

/// Partial filter settings from a file or the command line
///
/// Unset fields fall back to the next layer, then to the defaults above.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FilterConfig {
    pub model_precision: Option<f64>,
    pub sensor_precision: Option<f64>,
    pub outline_speed: Option<f64>,
    pub zero_speed_drift: Option<f64>,
}

impl FilterConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Values set in `overrides` win.
    pub fn merge(self, overrides: FilterConfig) -> FilterConfig {
        FilterConfig {
            model_precision: overrides.model_precision.or(self.model_precision),
            sensor_precision: overrides.sensor_precision.or(self.sensor_precision),
            outline_speed: overrides.outline_speed.or(self.outline_speed),
            zero_speed_drift: overrides.zero_speed_drift.or(self.zero_speed_drift),
        }
    }

    /// Fills gaps with defaults and validates the result.
    pub fn resolve(&self) -> Result<FilterParameters> {
        let params = FilterParameters {
            model_precision: self.model_precision.unwrap_or(DEFAULT_MODEL_PRECISION),
            sensor_precision: self.sensor_precision.unwrap_or(DEFAULT_SENSOR_PRECISION),
            outline_speed: self.outline_speed.unwrap_or(DEFAULT_OUTLINE_SPEED),
            zero_speed_drift: self.zero_speed_drift.unwrap_or(DEFAULT_ZERO_SPEED_DRIFT),
        };
        params.validate()?;
        Ok(params)
    }
}
