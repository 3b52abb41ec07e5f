//! Simulation unit: one spatial point across the shared time sequence
//!
//! A unit goes through an explicit lifecycle. Solar geometry is computed when
//! the unit is created, because it is the only time-resolved input. Magnetic
//! field and background are characterised once, at the start date, by
//! `setup()`. `compile()` hands the composed state to a flare response model.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};
use crate::model::{Background, MagneticField, MagneticModel, ModelSuite, SolarPosition};
use crate::observer::GridEvent;
use crate::spatial_grid::SpatialPoint;
use crate::temporal_grid::TemporalSequence;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitState {
    /// Solar geometry available.
    Constructed,
    /// Magnetic field and background available as well.
    SetupComplete,
    /// Handed to a flare response model. Terminal.
    Compiled,
}

/// Consumes a fully set-up unit and produces the flare response.
pub trait FlareResponseModel {
    type Output;

    fn compile(&self, unit: &SimulationUnit) -> GridResult<Self::Output>;
}

pub struct SimulationUnit {
    point: SpatialPoint,
    temporal: Arc<TemporalSequence>,
    timestamps: Vec<DateTime<Utc>>,
    magnet_model: String,
    solar: Vec<SolarPosition>,
    magnetic: Option<MagneticField>,
    background: Option<Background>,
    state: UnitState,
    suite: Arc<ModelSuite>,
}

impl fmt::Debug for SimulationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationUnit")
            .field("point", &self.point)
            .field("start", &self.temporal.start())
            .field("steps", &self.temporal.len())
            .field("magnet_model", &self.magnet_model)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SimulationUnit {
    /// Builds the unit and computes its solar series in one provider call.
    /// Nothing is kept if the solar provider fails.
    pub fn create(
        point: SpatialPoint,
        temporal: Arc<TemporalSequence>,
        magnet_model: &str,
        suite: Arc<ModelSuite>,
    ) -> GridResult<SimulationUnit> {
        let geometry_error = |reason: String| GridError::GeometryComputation {
            latitude: point.latitude(),
            longitude: point.longitude(),
            height: point.height(),
            reason,
        };

        let timestamps = temporal
            .timestamps()
            .ok_or_else(|| geometry_error("offset overflows the calendar".to_string()))?;

        let solar = suite
            .solar_series(&point, &timestamps)
            .map_err(|e| match e {
                GridError::GeometryComputation { .. } => e,
                other => geometry_error(other.to_string()),
            })?;
        if solar.len() != timestamps.len() {
            return Err(geometry_error(format!(
                "expected {} solar positions, provider returned {}",
                timestamps.len(),
                solar.len()
            )));
        }

        suite.observer().on_event(&GridEvent::UnitConstructed {
            point,
            timestamps: timestamps.len(),
        });

        Ok(SimulationUnit {
            point,
            temporal,
            timestamps,
            magnet_model: magnet_model.to_string(),
            solar,
            magnetic: None,
            background: None,
            state: UnitState::Constructed,
            suite,
        })
    }

    pub fn point(&self) -> &SpatialPoint {
        &self.point
    }

    pub fn temporal(&self) -> &Arc<TemporalSequence> {
        &self.temporal
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.temporal.start()
    }

    pub fn offsets(&self) -> &[i64] {
        self.temporal.offsets()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn magnet_model(&self) -> &str {
        &self.magnet_model
    }

    pub fn solar_positions(&self) -> &[SolarPosition] {
        &self.solar
    }

    pub fn solar_at(&self, index: usize) -> Option<(DateTime<Utc>, &SolarPosition)> {
        Some((*self.timestamps.get(index)?, self.solar.get(index)?))
    }

    pub fn magnetic_field(&self) -> Option<&MagneticField> {
        self.magnetic.as_ref()
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    /// True once magnetic field and background are available.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, UnitState::SetupComplete | UnitState::Compiled)
    }

    /// (Re)computes magnetic field and background at the start date.
    ///
    /// Both results are committed together; on error the unit keeps whatever
    /// it had before the call.
    pub fn setup(&mut self) -> GridResult<()> {
        if self.state == UnitState::Compiled {
            return Err(GridError::InvalidState {
                operation: "setup",
                state: self.state,
            });
        }

        let model = MagneticModel::parse(&self.magnet_model)?;
        let date = self.start_date();
        let magnetic = self.suite.magnetic_field(&self.point, date, model)?;
        let background = self.suite.background(&self.point, date)?;

        self.magnetic = Some(magnetic);
        self.background = Some(background);
        self.state = UnitState::SetupComplete;

        self.suite
            .observer()
            .on_event(&GridEvent::SetupComplete { point: self.point });
        Ok(())
    }

    pub fn compile<M: FlareResponseModel>(&mut self, model: &M) -> GridResult<M::Output> {
        if self.state != UnitState::SetupComplete {
            return Err(GridError::InvalidState {
                operation: "compile",
                state: self.state,
            });
        }
        let output = model.compile(self)?;
        self.state = UnitState::Compiled;
        Ok(output)
    }
}

/// Runs `setup()` on every unit in order, stopping at the first failure.
pub fn setup_all(units: &mut [SimulationUnit]) -> GridResult<()> {
    units.iter_mut().try_for_each(SimulationUnit::setup)
}
