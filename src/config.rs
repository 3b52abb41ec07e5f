//! Grid configuration, loadable from JSON
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```
//! use sid_grid::config::GridConfig;
//!
//! let config = GridConfig::from_json_str(r#"{ "heights": [60, 120, 20], "magnet_model": "dipole" }"#).unwrap();
//! assert_eq!(config.heights.step, 20.0);
//! assert_eq!(config.step_seconds, 60);
//! ```

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_HEIGHTS_KM, DEFAULT_LATITUDES, DEFAULT_LONGITUDES, DEFAULT_SMOOTHING_DAYS,
    DEFAULT_END, DEFAULT_START, DEFAULT_STEP_SECONDS, DIPOLE_EQUATORIAL_FIELD_T, EARTH_RADIUS_KM,
};
use crate::error::{GridError, GridResult};
use crate::model::{DipoleConstants, MagneticModel, ModelSettings, RetryPolicy};
use crate::observer::ObserverHandle;
use crate::spatial_grid::{AxisRange, LongitudeSampling, SpatialGridBuilder};
use crate::temporal_grid::DateRange;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    pub latitudes: AxisRange,
    pub longitudes: AxisRange,
    pub heights: AxisRange,
    pub longitude_sampling: LongitudeSampling,

    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step_seconds: i64,

    pub magnet_model: String,
    pub earth_radius_km: f64,
    pub equatorial_field_t: f64,

    pub smoothing_days: u32,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            latitudes: DEFAULT_LATITUDES.into(),
            longitudes: DEFAULT_LONGITUDES.into(),
            heights: DEFAULT_HEIGHTS_KM.into(),
            longitude_sampling: LongitudeSampling::Independent,
            start: DEFAULT_START,
            end: DEFAULT_END,
            step_seconds: DEFAULT_STEP_SECONDS,
            magnet_model: MagneticModel::Igrf.as_str().to_string(),
            earth_radius_km: EARTH_RADIUS_KM,
            equatorial_field_t: DIPOLE_EQUATORIAL_FIELD_T,
            smoothing_days: DEFAULT_SMOOTHING_DAYS,
            retry_attempts: 1,
            retry_backoff_ms: 0,
        }
    }
}

impl GridConfig {
    pub fn from_json_str(json: &str) -> GridResult<Self> {
        serde_json::from_str(json).map_err(|e| GridError::Config(format!("failed to parse JSON: {}", e)))
    }

    pub fn load_json<P: AsRef<Path>>(file_path: P) -> GridResult<Self> {
        let path = file_path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| GridError::Config(format!("failed to read file {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> GridResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| GridError::Config(e.to_string()))
    }

    /// Checks every range and the model name up front, before any provider
    /// is touched.
    pub fn validate(&self) -> GridResult<()> {
        self.latitudes.count("latitude")?;
        self.longitudes.count("longitude")?;
        self.heights.count("height")?;
        self.date_range().offsets()?;
        MagneticModel::parse(&self.magnet_model)?;
        if self.smoothing_days == 0 {
            return Err(GridError::Config("smoothing_days must be at least 1".to_string()));
        }
        if !self.earth_radius_km.is_finite() || self.earth_radius_km <= 0.0 {
            return Err(GridError::Config("earth_radius_km must be positive".to_string()));
        }
        Ok(())
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start, self.end, self.step_seconds)
    }

    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            smoothing_days: self.smoothing_days,
            dipole: DipoleConstants {
                earth_radius_km: self.earth_radius_km,
                equatorial_field_t: self.equatorial_field_t,
            },
            retry: RetryPolicy::new(self.retry_attempts, self.retry_backoff_ms),
        }
    }

    pub fn spatial_builder(&self, observer: ObserverHandle) -> SpatialGridBuilder {
        SpatialGridBuilder::new(observer).with_longitude_sampling(self.longitude_sampling)
    }
}
