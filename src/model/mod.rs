//! Physical model providers and the suite that bundles them
//!
//! A [`ModelSuite`] is everything a simulation unit needs to compose its
//! state: one provider per model, the observer, and the tunables. Each
//! worker that builds units owns its own suite.

pub mod activity_index;
pub mod background;
pub mod magnet;
pub mod retry;
pub mod solar;

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

pub use activity_index::{ActivityIndexTable, DailyIndex, FileActivityIndexProvider};
pub use background::{
    ActivityIndexProvider, ActivityIndices, Background, Ionosphere, IonosphereProvider,
    NeutralAtmosphere, NeutralAtmosphereProvider,
};
pub use magnet::{
    DipoleComponents, DipoleConstants, DipoleOnly, IgrfComponents, MagneticField,
    MagneticFieldProvider, MagneticModel,
};
pub use retry::RetryPolicy;
pub use solar::{NoaaSolarGeometry, SolarGeometryProvider, SolarPosition};

use crate::constants::DEFAULT_SMOOTHING_DAYS;
use crate::error::GridResult;
use crate::observer::{GridEvent, NullObserver, ObserverHandle};
use crate::spatial_grid::SpatialPoint;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ModelSettings {
    pub smoothing_days: u32,
    pub dipole: DipoleConstants,
    pub retry: RetryPolicy,
}

impl Default for ModelSettings {
    fn default() -> Self {
        ModelSettings {
            smoothing_days: DEFAULT_SMOOTHING_DAYS,
            dipole: DipoleConstants::default(),
            retry: RetryPolicy::default(),
        }
    }
}

pub struct ModelSuite {
    solar: Box<dyn SolarGeometryProvider>,
    magnet: Box<dyn MagneticFieldProvider>,
    indices: Box<dyn ActivityIndexProvider>,
    neutral: Box<dyn NeutralAtmosphereProvider>,
    ionosphere: Box<dyn IonosphereProvider>,
    observer: ObserverHandle,
    settings: ModelSettings,
}

impl ModelSuite {
    /// Suite with the NOAA solar model, default settings and no observer.
    pub fn new(
        magnet: Box<dyn MagneticFieldProvider>,
        indices: Box<dyn ActivityIndexProvider>,
        neutral: Box<dyn NeutralAtmosphereProvider>,
        ionosphere: Box<dyn IonosphereProvider>,
    ) -> Self {
        ModelSuite {
            solar: Box::new(NoaaSolarGeometry),
            magnet,
            indices,
            neutral,
            ionosphere,
            observer: Arc::new(NullObserver),
            settings: ModelSettings::default(),
        }
    }

    pub fn with_solar(mut self, solar: Box<dyn SolarGeometryProvider>) -> Self {
        self.solar = solar;
        self
    }

    pub fn with_magnet(mut self, magnet: Box<dyn MagneticFieldProvider>) -> Self {
        self.magnet = magnet;
        self
    }

    pub fn with_indices(mut self, indices: Box<dyn ActivityIndexProvider>) -> Self {
        self.indices = indices;
        self
    }

    pub fn with_neutral(mut self, neutral: Box<dyn NeutralAtmosphereProvider>) -> Self {
        self.neutral = neutral;
        self
    }

    pub fn with_ionosphere(mut self, ionosphere: Box<dyn IonosphereProvider>) -> Self {
        self.ionosphere = ionosphere;
        self
    }

    pub fn with_observer(mut self, observer: ObserverHandle) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn observer(&self) -> &ObserverHandle {
        &self.observer
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn solar_series(
        &self,
        point: &SpatialPoint,
        timestamps: &[DateTime<Utc>],
    ) -> GridResult<Vec<SolarPosition>> {
        self.solar.position(
            timestamps,
            point.latitude(),
            point.longitude(),
            point.height(),
        )
    }

    pub fn magnetic_field(
        &self,
        point: &SpatialPoint,
        date: DateTime<Utc>,
        model: MagneticModel,
    ) -> GridResult<MagneticField> {
        let DipoleConstants {
            earth_radius_km,
            equatorial_field_t,
        } = self.settings.dipole;
        let retry = self.settings.retry;

        let field = match model {
            MagneticModel::Igrf => {
                let radius_km = earth_radius_km + point.height();
                let year = f64::from(date.year());
                MagneticField::Igrf(retry.run(self.magnet.name(), &*self.observer, || {
                    self.magnet
                        .igrf(point.latitude(), point.longitude(), radius_km, year)
                })?)
            }
            MagneticModel::Dipole => {
                MagneticField::Dipole(retry.run(self.magnet.name(), &*self.observer, || {
                    self.magnet.dipole(
                        point.latitude(),
                        point.height(),
                        earth_radius_km,
                        equatorial_field_t,
                    )
                })?)
            }
        };

        self.observer.on_event(&GridEvent::MagneticFieldComputed {
            point: *point,
            model: model.as_str().to_string(),
            year: date.year(),
        });
        Ok(field)
    }

    pub fn background(&self, point: &SpatialPoint, date: DateTime<Utc>) -> GridResult<Background> {
        let retry = self.settings.retry;
        let smoothing_days = self.settings.smoothing_days;
        let observer = &*self.observer;

        let indices = retry.run(self.indices.name(), observer, || {
            self.indices.indices(date, smoothing_days)
        })?;
        let msise = retry.run(self.neutral.name(), observer, || {
            self.neutral.profile(
                date,
                point.height(),
                point.latitude(),
                point.longitude(),
                indices.f107,
                indices.f107_smoothed,
                indices.ap,
            )
        })?;
        let iri = retry.run(self.ionosphere.name(), observer, || {
            self.ionosphere
                .profile(date, point.height(), point.latitude(), point.longitude())
        })?;

        self.observer.on_event(&GridEvent::BackgroundComputed {
            point: *point,
            date,
            smoothing_days,
        });
        Ok(Background {
            indices,
            msise,
            iri,
        })
    }
}
