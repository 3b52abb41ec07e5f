//! Geomagnetic field at a grid point
//!
//! Two models are selectable by name. `igrf` defers to an external IGRF
//! synthesis behind [`MagneticFieldProvider::igrf`]. `dipole` is the centred
//! dipole approximation, evaluated here in closed form.

use serde::{Deserialize, Serialize};

use crate::constants::{DIPOLE_EQUATORIAL_FIELD_T, EARTH_RADIUS_KM};
use crate::error::{GridError, GridResult};

pub const IGRF_KEYS: [&str; 7] = [
    "declination",
    "inclination",
    "horizontal_intensity",
    "north",
    "east",
    "vertical",
    "total_intensity",
];

pub const DIPOLE_KEYS: [&str; 3] = ["radial_component", "tangential_component", "magnitude"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagneticModel {
    Igrf,
    Dipole,
}

impl MagneticModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MagneticModel::Igrf => "igrf",
            MagneticModel::Dipole => "dipole",
        }
    }

    pub fn parse(s: &str) -> GridResult<Self> {
        match s {
            "igrf" => Ok(MagneticModel::Igrf),
            "dipole" => Ok(MagneticModel::Dipole),
            other => Err(GridError::UnsupportedModel(other.to_string())),
        }
    }
}

/// IGRF output: angles in degrees, intensities in nT.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct IgrfComponents {
    pub declination: f64,
    pub inclination: f64,
    pub horizontal_intensity: f64,
    pub north: f64,
    pub east: f64,
    pub vertical: f64,
    pub total_intensity: f64,
}

/// Dipole output in Tesla.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct DipoleComponents {
    pub radial_component: f64,
    pub tangential_component: f64,
    pub magnitude: f64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct DipoleConstants {
    pub earth_radius_km: f64,
    pub equatorial_field_t: f64,
}

impl Default for DipoleConstants {
    fn default() -> Self {
        DipoleConstants {
            earth_radius_km: EARTH_RADIUS_KM,
            equatorial_field_t: DIPOLE_EQUATORIAL_FIELD_T,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum MagneticField {
    Igrf(IgrfComponents),
    Dipole(DipoleComponents),
}

impl MagneticField {
    pub fn model(&self) -> MagneticModel {
        match self {
            MagneticField::Igrf(_) => MagneticModel::Igrf,
            MagneticField::Dipole(_) => MagneticModel::Dipole,
        }
    }

    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        match self {
            MagneticField::Igrf(b) => vec![
                (IGRF_KEYS[0], b.declination),
                (IGRF_KEYS[1], b.inclination),
                (IGRF_KEYS[2], b.horizontal_intensity),
                (IGRF_KEYS[3], b.north),
                (IGRF_KEYS[4], b.east),
                (IGRF_KEYS[5], b.vertical),
                (IGRF_KEYS[6], b.total_intensity),
            ],
            MagneticField::Dipole(b) => vec![
                (DIPOLE_KEYS[0], b.radial_component),
                (DIPOLE_KEYS[1], b.tangential_component),
                (DIPOLE_KEYS[2], b.magnitude),
            ],
        }
    }
}

/// Centred dipole at geocentric radius `re + height`, co-latitude taken as
/// `90 - latitude`.
pub fn dipole_field(latitude: f64, height: f64, re: f64, b0: f64) -> DipoleComponents {
    let r = re + height;
    let theta = (90.0 - latitude).to_radians();
    let scale = b0 * (re / r).powi(3);
    let radial_component = -2.0 * scale * theta.cos();
    let tangential_component = -scale * theta.sin();

    DipoleComponents {
        radial_component,
        tangential_component,
        magnitude: radial_component.hypot(tangential_component),
    }
}

pub trait MagneticFieldProvider: Send + Sync {
    fn name(&self) -> &str;

    /// IGRF synthesis at geocentric `radius_km` for a (possibly fractional) year.
    fn igrf(&self, latitude: f64, longitude: f64, radius_km: f64, year: f64)
    -> GridResult<IgrfComponents>;

    fn dipole(&self, latitude: f64, height: f64, re: f64, b0: f64) -> GridResult<DipoleComponents> {
        Ok(dipole_field(latitude, height, re, b0))
    }
}

/// Closed-form dipole only. Asking it for IGRF is a provider error.
#[derive(Debug, Default, Clone, Copy)]
pub struct DipoleOnly;

impl MagneticFieldProvider for DipoleOnly {
    fn name(&self) -> &str {
        "dipole_only"
    }

    fn igrf(&self, _: f64, _: f64, _: f64, _: f64) -> GridResult<IgrfComponents> {
        Err(GridError::unavailable(
            self.name(),
            "no IGRF backend configured",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn model_names_round_trip() {
        for model in [MagneticModel::Igrf, MagneticModel::Dipole] {
            assert_eq!(MagneticModel::parse(model.as_str()).unwrap(), model);
        }
        assert!(matches!(
            MagneticModel::parse("unknown"),
            Err(GridError::UnsupportedModel(name)) if name == "unknown"
        ));
        assert!(MagneticModel::parse("IGRF").is_err());
    }

    #[test]
    fn dipole_at_equator_surface_is_b0_horizontal() {
        let b = dipole_field(0.0, 0.0, EARTH_RADIUS_KM, DIPOLE_EQUATORIAL_FIELD_T);
        assert_relative_eq!(b.radial_component, 0.0, epsilon = 1e-18);
        assert_relative_eq!(b.tangential_component, -DIPOLE_EQUATORIAL_FIELD_T);
        assert_relative_eq!(b.magnitude, DIPOLE_EQUATORIAL_FIELD_T);
    }

    #[test]
    fn dipole_at_pole_is_twice_b0_vertical() {
        let b = dipole_field(90.0, 0.0, EARTH_RADIUS_KM, DIPOLE_EQUATORIAL_FIELD_T);
        assert_relative_eq!(b.radial_component, -2.0 * DIPOLE_EQUATORIAL_FIELD_T);
        assert_relative_eq!(b.tangential_component, 0.0, epsilon = 1e-18);
    }

    #[test]
    fn dipole_falls_off_with_cube_of_radius() {
        let re = EARTH_RADIUS_KM;
        let surface = dipole_field(45.0, 0.0, re, DIPOLE_EQUATORIAL_FIELD_T);
        let aloft = dipole_field(45.0, re, re, DIPOLE_EQUATORIAL_FIELD_T);
        assert_relative_eq!(aloft.magnitude * 8.0, surface.magnitude, max_relative = 1e-12);
    }

    #[test]
    fn dipole_only_rejects_igrf() {
        let err = DipoleOnly.igrf(45.0, -75.0, 6471.0, 2015.0).unwrap_err();
        assert!(matches!(err, GridError::ProviderUnavailable { .. }));
        assert!(DipoleOnly.dipole(45.0, 100.0, EARTH_RADIUS_KM, DIPOLE_EQUATORIAL_FIELD_T).is_ok());
    }
}
