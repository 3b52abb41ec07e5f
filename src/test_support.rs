// Provider doubles for unit tests. Outputs echo their inputs so tests can
// check what the suite passed through.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, TimeZone, Utc};

use crate::error::{GridError, GridResult};
use crate::model::{
    ActivityIndexProvider, ActivityIndices, IgrfComponents, Ionosphere, IonosphereProvider,
    MagneticFieldProvider, ModelSuite, NeutralAtmosphere, NeutralAtmosphereProvider,
    SolarGeometryProvider, SolarPosition,
};

pub fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2015, 3, 11, h, m, s).unwrap()
}

pub struct EchoMagnet;

impl MagneticFieldProvider for EchoMagnet {
    fn name(&self) -> &str {
        "echo_magnet"
    }

    fn igrf(&self, latitude: f64, longitude: f64, radius_km: f64, year: f64) -> GridResult<IgrfComponents> {
        Ok(IgrfComponents {
            declination: latitude,
            inclination: longitude,
            horizontal_intensity: radius_km,
            north: year,
            east: 0.0,
            vertical: 0.0,
            total_intensity: 1.0,
        })
    }
}

pub struct FixedIndices;

impl ActivityIndexProvider for FixedIndices {
    fn name(&self) -> &str {
        "fixed_indices"
    }

    fn indices(&self, _date: DateTime<Utc>, _smoothing_days: u32) -> GridResult<ActivityIndices> {
        Ok(ActivityIndices {
            f107: 11.0,
            f107_smoothed: 3.0,
            ap: 1.0,
        })
    }
}

/// F10.7 counts the calls made so far, so every lookup returns a new value.
#[derive(Default)]
pub struct CountingIndices {
    calls: AtomicU32,
}

impl ActivityIndexProvider for CountingIndices {
    fn name(&self) -> &str {
        "counting_indices"
    }

    fn indices(&self, _date: DateTime<Utc>, _smoothing_days: u32) -> GridResult<ActivityIndices> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ActivityIndices {
            f107: f64::from(call),
            f107_smoothed: 3.0,
            ap: 1.0,
        })
    }
}

pub struct EchoNeutral;

impl NeutralAtmosphereProvider for EchoNeutral {
    fn name(&self) -> &str {
        "echo_neutral"
    }

    fn profile(
        &self,
        _date: DateTime<Utc>,
        height: f64,
        latitude: f64,
        longitude: f64,
        f107: f64,
        f107_smoothed: f64,
        ap: f64,
    ) -> GridResult<NeutralAtmosphere> {
        Ok(NeutralAtmosphere {
            he: latitude,
            o: longitude,
            n2: 0.0,
            o2: 0.0,
            ar: 0.0,
            density: 0.0,
            h: 0.0,
            n: 0.0,
            anomalous_o: 0.0,
            exospheric_temperature: f107 + f107_smoothed + ap,
            temperature: height,
        })
    }
}

pub struct EchoIonosphere;

fn echo_ionosphere(height: f64, latitude: f64, longitude: f64) -> Ionosphere {
    Ionosphere {
        electron_density: latitude,
        neutral_temperature: longitude,
        ion_temperature: height,
        electron_temperature: 0.0,
        o_plus: 0.0,
        h_plus: 0.0,
        he_plus: 0.0,
        no_plus: 0.0,
        o2_plus: 0.0,
        cluster_ion: 0.0,
        n_plus: 0.0,
    }
}

impl IonosphereProvider for EchoIonosphere {
    fn name(&self) -> &str {
        "echo_ionosphere"
    }

    fn profile(&self, _date: DateTime<Utc>, height: f64, latitude: f64, longitude: f64) -> GridResult<Ionosphere> {
        Ok(echo_ionosphere(height, latitude, longitude))
    }
}

/// Unavailable for the first `n` calls, then echoes.
pub struct FlakyIonosphere {
    failures_left: AtomicU32,
}

impl FlakyIonosphere {
    pub fn failing_first(n: u32) -> Self {
        FlakyIonosphere {
            failures_left: AtomicU32::new(n),
        }
    }
}

impl IonosphereProvider for FlakyIonosphere {
    fn name(&self) -> &str {
        "flaky_ionosphere"
    }

    fn profile(&self, _date: DateTime<Utc>, height: f64, latitude: f64, longitude: f64) -> GridResult<Ionosphere> {
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(GridError::unavailable(self.name(), "timed out"));
        }
        Ok(echo_ionosphere(height, latitude, longitude))
    }
}

pub struct FailingSolar;

impl SolarGeometryProvider for FailingSolar {
    fn name(&self) -> &str {
        "failing_solar"
    }

    fn position(&self, _: &[DateTime<Utc>], latitude: f64, longitude: f64, height: f64) -> GridResult<Vec<SolarPosition>> {
        Err(GridError::GeometryComputation {
            latitude,
            longitude,
            height,
            reason: "ephemeris unavailable".to_string(),
        })
    }
}

pub fn stub_suite() -> ModelSuite {
    ModelSuite::new(
        Box::new(EchoMagnet),
        Box::new(FixedIndices),
        Box::new(EchoNeutral),
        Box::new(EchoIonosphere),
    )
}
