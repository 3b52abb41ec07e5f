//! Background neutral atmosphere and ionosphere at a grid point
//!
//! The neutral profile is driven by solar and geomagnetic activity, so the
//! activity indices are fetched first and fed into the atmosphere provider.
//! The ionosphere provider only needs date and location.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GridResult;

pub const ACTIVITY_KEYS: [&str; 3] = ["f107", "f107_smoothed", "Ap"];

pub const NEUTRAL_KEYS: [&str; 11] = [
    "He",
    "O",
    "N2",
    "O2",
    "Ar",
    "density",
    "H",
    "N",
    "anomalous_O",
    "exospheric_temperature",
    "temperature",
];

pub const IONOSPHERE_KEYS: [&str; 11] = [
    "electron_density",
    "neutral_temperature",
    "ion_temperature",
    "electron_temperature",
    "O+",
    "H+",
    "He+",
    "NO+",
    "O2+",
    "cluster_ion",
    "N+",
];

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ActivityIndices {
    pub f107: f64,
    pub f107_smoothed: f64,
    #[serde(rename = "Ap")]
    pub ap: f64,
}

impl ActivityIndices {
    pub fn entries(&self) -> [(&'static str, f64); 3] {
        [
            (ACTIVITY_KEYS[0], self.f107),
            (ACTIVITY_KEYS[1], self.f107_smoothed),
            (ACTIVITY_KEYS[2], self.ap),
        ]
    }
}

/// Number densities in cm^-3, mass density in g cm^-3, temperatures in K.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct NeutralAtmosphere {
    #[serde(rename = "He")]
    pub he: f64,
    #[serde(rename = "O")]
    pub o: f64,
    #[serde(rename = "N2")]
    pub n2: f64,
    #[serde(rename = "O2")]
    pub o2: f64,
    #[serde(rename = "Ar")]
    pub ar: f64,
    pub density: f64,
    #[serde(rename = "H")]
    pub h: f64,
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "anomalous_O")]
    pub anomalous_o: f64,
    pub exospheric_temperature: f64,
    pub temperature: f64,
}

impl NeutralAtmosphere {
    pub fn entries(&self) -> [(&'static str, f64); 11] {
        [
            (NEUTRAL_KEYS[0], self.he),
            (NEUTRAL_KEYS[1], self.o),
            (NEUTRAL_KEYS[2], self.n2),
            (NEUTRAL_KEYS[3], self.o2),
            (NEUTRAL_KEYS[4], self.ar),
            (NEUTRAL_KEYS[5], self.density),
            (NEUTRAL_KEYS[6], self.h),
            (NEUTRAL_KEYS[7], self.n),
            (NEUTRAL_KEYS[8], self.anomalous_o),
            (NEUTRAL_KEYS[9], self.exospheric_temperature),
            (NEUTRAL_KEYS[10], self.temperature),
        ]
    }
}

/// Electron and ion densities in m^-3, temperatures in K.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Ionosphere {
    pub electron_density: f64,
    pub neutral_temperature: f64,
    pub ion_temperature: f64,
    pub electron_temperature: f64,
    #[serde(rename = "O+")]
    pub o_plus: f64,
    #[serde(rename = "H+")]
    pub h_plus: f64,
    #[serde(rename = "He+")]
    pub he_plus: f64,
    #[serde(rename = "NO+")]
    pub no_plus: f64,
    #[serde(rename = "O2+")]
    pub o2_plus: f64,
    pub cluster_ion: f64,
    #[serde(rename = "N+")]
    pub n_plus: f64,
}

impl Ionosphere {
    pub fn entries(&self) -> [(&'static str, f64); 11] {
        [
            (IONOSPHERE_KEYS[0], self.electron_density),
            (IONOSPHERE_KEYS[1], self.neutral_temperature),
            (IONOSPHERE_KEYS[2], self.ion_temperature),
            (IONOSPHERE_KEYS[3], self.electron_temperature),
            (IONOSPHERE_KEYS[4], self.o_plus),
            (IONOSPHERE_KEYS[5], self.h_plus),
            (IONOSPHERE_KEYS[6], self.he_plus),
            (IONOSPHERE_KEYS[7], self.no_plus),
            (IONOSPHERE_KEYS[8], self.o2_plus),
            (IONOSPHERE_KEYS[9], self.cluster_ion),
            (IONOSPHERE_KEYS[10], self.n_plus),
        ]
    }
}

/// Composed background state of one simulation unit.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Background {
    pub indices: ActivityIndices,
    pub msise: NeutralAtmosphere,
    pub iri: Ionosphere,
}

pub trait ActivityIndexProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Daily F10.7 and Ap on `date`, plus F10.7 smoothed over `smoothing_days`.
    fn indices(&self, date: DateTime<Utc>, smoothing_days: u32) -> GridResult<ActivityIndices>;
}

pub trait NeutralAtmosphereProvider: Send + Sync {
    fn name(&self) -> &str;

    #[allow(clippy::too_many_arguments)]
    fn profile(
        &self,
        date: DateTime<Utc>,
        height: f64,
        latitude: f64,
        longitude: f64,
        f107: f64,
        f107_smoothed: f64,
        ap: f64,
    ) -> GridResult<NeutralAtmosphere>;
}

pub trait IonosphereProvider: Send + Sync {
    fn name(&self) -> &str;

    fn profile(
        &self,
        date: DateTime<Utc>,
        height: f64,
        latitude: f64,
        longitude: f64,
    ) -> GridResult<Ionosphere>;
}
