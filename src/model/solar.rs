//! Solar position along a timestamp series
//!
//! [`NoaaSolarGeometry`] follows the NOAA solar calculator: low-precision
//! solar coordinates from the Julian century, the hour angle from true solar
//! time, and the NOAA refraction correction for the apparent angles. Good to
//! roughly a hundredth of a degree between 1800 and 2100, which is far below
//! the spacing of any flare grid.

use chrono::{DateTime, Timelike, Utc};
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DAYS_PER_JULIAN_CENTURY, J2000_JULIAN_DAY, SECONDS_PER_DAY, UNIX_EPOCH_JULIAN_DAY,
};
use crate::error::{GridError, GridResult};
use crate::math_utils::wrap_degrees;

pub const SOLAR_KEYS: [&str; 6] = [
    "apparent_zenith",
    "zenith",
    "apparent_elevation",
    "elevation",
    "azimuth",
    "equation_of_time",
];

/// Solar angles in degrees, equation of time in minutes.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SolarPosition {
    pub apparent_zenith: f64,
    pub zenith: f64,
    pub apparent_elevation: f64,
    pub elevation: f64,
    pub azimuth: f64,
    pub equation_of_time: f64,
}

impl SolarPosition {
    pub fn entries(&self) -> [(&'static str, f64); 6] {
        [
            (SOLAR_KEYS[0], self.apparent_zenith),
            (SOLAR_KEYS[1], self.zenith),
            (SOLAR_KEYS[2], self.apparent_elevation),
            (SOLAR_KEYS[3], self.elevation),
            (SOLAR_KEYS[4], self.azimuth),
            (SOLAR_KEYS[5], self.equation_of_time),
        ]
    }
}

pub trait SolarGeometryProvider: Send + Sync {
    fn name(&self) -> &str;

    /// One position per timestamp, in input order. Any failure fails the
    /// whole series.
    fn position(
        &self,
        timestamps: &[DateTime<Utc>],
        latitude: f64,
        longitude: f64,
        height: f64,
    ) -> GridResult<Vec<SolarPosition>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoaaSolarGeometry;

impl NoaaSolarGeometry {
    pub fn new() -> Self {
        NoaaSolarGeometry
    }
}

impl SolarGeometryProvider for NoaaSolarGeometry {
    fn name(&self) -> &str {
        "noaa_solar_geometry"
    }

    fn position(
        &self,
        timestamps: &[DateTime<Utc>],
        latitude: f64,
        longitude: f64,
        height: f64,
    ) -> GridResult<Vec<SolarPosition>> {
        let fail = |reason: String| GridError::GeometryComputation {
            latitude,
            longitude,
            height,
            reason,
        };

        if !(latitude.is_finite() && longitude.is_finite() && height.is_finite()) {
            return Err(fail("coordinates must be finite".to_string()));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(fail(format!("latitude {} outside [-90, 90]", latitude)));
        }

        timestamps
            .iter()
            .map(|ts| {
                let position = solar_position_at(ts, latitude, longitude);
                if position.entries().iter().all(|(_, v)| v.is_finite()) {
                    Ok(position)
                } else {
                    Err(fail(format!("non-finite solar position at {}", ts)))
                }
            })
            .collect()
    }
}

fn julian_century(ts: &DateTime<Utc>) -> f64 {
    let seconds = ts.timestamp() as f64 + ts.timestamp_subsec_nanos() as f64 * 1e-9;
    let julian_day = seconds / SECONDS_PER_DAY + UNIX_EPOCH_JULIAN_DAY;
    (julian_day - J2000_JULIAN_DAY) / DAYS_PER_JULIAN_CENTURY
}

/// Returns (declination in degrees, equation of time in minutes).
fn declination_and_equation_of_time(jc: f64) -> (f64, f64) {
    let mean_long = wrap_degrees(280.46646 + jc * (36000.76983 + jc * 0.0003032));
    let mean_anom = 357.52911 + jc * (35999.05029 - 0.0001537 * jc);
    let eccentricity = 0.016708634 - jc * (0.000042037 + 0.0000001267 * jc);

    let m = mean_anom.to_radians();
    let centre = m.sin() * (1.914602 - jc * (0.004817 + 0.000014 * jc))
        + (2.0 * m).sin() * (0.019993 - 0.000101 * jc)
        + (3.0 * m).sin() * 0.000289;
    let true_long = mean_long + centre;

    let omega = (125.04 - 1934.136 * jc).to_radians();
    let apparent_long = true_long - 0.00569 - 0.00478 * omega.sin();

    let mean_obliquity =
        23.0 + (26.0 + (21.448 - jc * (46.815 + jc * (0.00059 - jc * 0.001813))) / 60.0) / 60.0;
    let obliquity = (mean_obliquity + 0.00256 * omega.cos()).to_radians();

    let declination = (obliquity.sin() * apparent_long.to_radians().sin())
        .asin()
        .to_degrees();

    let y = (obliquity / 2.0).tan().powi(2);
    let l0 = mean_long.to_radians();
    let eot = y * (2.0 * l0).sin() - 2.0 * eccentricity * m.sin()
        + 4.0 * eccentricity * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * eccentricity * eccentricity * (2.0 * m).sin();

    (declination, 4.0 * eot.to_degrees())
}

/// NOAA refraction correction in degrees for a geometric elevation.
fn refraction(elevation: f64) -> f64 {
    let tan_e = elevation.to_radians().tan();
    let arcsec = if elevation > 85.0 {
        0.0
    } else if elevation > 5.0 {
        58.1 / tan_e - 0.07 / tan_e.powi(3) + 0.000086 / tan_e.powi(5)
    } else if elevation > -0.575 {
        1735.0
            + elevation * (-518.2 + elevation * (103.4 + elevation * (-12.79 + elevation * 0.711)))
    } else {
        -20.772 / tan_e
    };
    arcsec / 3600.0
}

fn solar_position_at(ts: &DateTime<Utc>, latitude: f64, longitude: f64) -> SolarPosition {
    let (declination, equation_of_time) = declination_and_equation_of_time(julian_century(ts));

    let minutes = (ts.num_seconds_from_midnight() as f64 + ts.nanosecond() as f64 * 1e-9) / 60.0;
    let true_solar_time = (minutes + equation_of_time + 4.0 * longitude).rem_euclid(1440.0);
    let hour_angle = true_solar_time / 4.0 - 180.0;

    let (lat, dec, ha) = (
        latitude.to_radians(),
        declination.to_radians(),
        hour_angle.to_radians(),
    );

    // sun direction in the local east/north/up frame
    let sun = DVec3::new(
        -dec.cos() * ha.sin(),
        lat.cos() * dec.sin() - lat.sin() * dec.cos() * ha.cos(),
        lat.sin() * dec.sin() + lat.cos() * dec.cos() * ha.cos(),
    )
    .normalize();

    let zenith = sun.z.clamp(-1.0, 1.0).acos().to_degrees();
    let elevation = 90.0 - zenith;
    let apparent_elevation = elevation + refraction(elevation);
    let azimuth = wrap_degrees(sun.x.atan2(sun.y).to_degrees());

    SolarPosition {
        apparent_zenith: 90.0 - apparent_elevation,
        zenith,
        apparent_elevation,
        elevation,
        azimuth,
        equation_of_time,
    }
}
