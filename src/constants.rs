use chrono::{DateTime, Utc};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const DIPOLE_EQUATORIAL_FIELD_T: f64 = 3.12e-5; // sea-level field at the magnetic equator

// activity index smoothing window (days), centred on the reference date
pub const DEFAULT_SMOOTHING_DAYS: u32 = 81;

pub const SECONDS_PER_DAY: f64 = 86_400.0;
pub const UNIX_EPOCH_JULIAN_DAY: f64 = 2_440_587.5;
pub const J2000_JULIAN_DAY: f64 = 2_451_545.0;
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;

// relative slack when dividing an axis span by its step
pub const AXIS_COUNT_TOLERANCE: f64 = 1e-9;

// default grid, matches the historical 45N 75W column
pub const DEFAULT_LATITUDES: [f64; 3] = [45.0, 45.0, 1.0];
pub const DEFAULT_LONGITUDES: [f64; 3] = [-75.0, -75.0, 1.0];
pub const DEFAULT_HEIGHTS_KM: [f64; 3] = [50.0, 150.0, 1.0];
pub const DEFAULT_STEP_SECONDS: i64 = 60;
pub const DEFAULT_START: DateTime<Utc> = match DateTime::from_timestamp(1_426_089_600, 0) {
    Some(t) => t,
    None => panic!("default start date out of range"),
}; // 2015-03-11T16:00:00Z
pub const DEFAULT_END: DateTime<Utc> = match DateTime::from_timestamp(1_426_093_200, 0) {
    Some(t) => t,
    None => panic!("default end date out of range"),
}; // 2015-03-11T17:00:00Z
