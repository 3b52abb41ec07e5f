//! Pairs every spatial point with one shared time sequence
//!
//! Offsets run `0, step, 2*step, ...` up to the largest multiple of `step`
//! that does not pass `end - start`, so the end date itself is only included
//! when the span divides evenly.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};
use crate::grid::SimulationUnit;
use crate::model::ModelSuite;
use crate::observer::GridEvent;
use crate::spatial_grid::SpatialPoint;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step_seconds: i64,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, step_seconds: i64) -> Self {
        DateRange {
            start,
            end,
            step_seconds,
        }
    }

    /// Whole seconds between start and end.
    pub fn span_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }

    pub fn offsets(&self) -> GridResult<Vec<i64>> {
        if self.end <= self.start {
            return Err(GridError::invalid_range(
                "date",
                format!("end {} is not after start {}", self.end, self.start),
            ));
        }
        if self.step_seconds <= 0 {
            return Err(GridError::invalid_range(
                "date",
                format!("step must be positive, got {} s", self.step_seconds),
            ));
        }

        let span = self.span_seconds();
        let steps = span / self.step_seconds;
        Ok((0..=steps).map(|n| n * self.step_seconds).collect())
    }
}

/// Start date plus strictly increasing second offsets.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TemporalSequence {
    start: DateTime<Utc>,
    offsets: Vec<i64>,
}

impl TemporalSequence {
    pub fn new(start: DateTime<Utc>, offsets: Vec<i64>) -> GridResult<Self> {
        if offsets.is_empty() {
            return Err(GridError::invalid_range("time", "no offsets"));
        }
        if let Some(pair) = offsets.windows(2).find(|pair| pair[1] <= pair[0]) {
            return Err(GridError::invalid_range(
                "time",
                format!("offsets must increase, got {} then {}", pair[0], pair[1]),
            ));
        }
        Ok(TemporalSequence { start, offsets })
    }

    pub fn from_range(range: &DateRange) -> GridResult<Self> {
        Self::new(range.start, range.offsets()?)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn offsets(&self) -> &[i64] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// `start + offset` for every offset; `None` if one overflows the calendar.
    pub fn timestamps(&self) -> Option<Vec<DateTime<Utc>>> {
        self.offsets
            .iter()
            .map(|&s| {
                Duration::try_seconds(s).and_then(|d| self.start.checked_add_signed(d))
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct UnitFailure {
    pub index: usize,
    pub point: SpatialPoint,
    pub error: GridError,
}

/// Outcome of a formulation that keeps going past failing points.
#[derive(Debug, Default)]
pub struct FormulationReport {
    pub units: Vec<SimulationUnit>,
    pub failures: Vec<UnitFailure>,
}

impl FormulationReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct TemporalGridBuilder {
    suite: Arc<ModelSuite>,
}

impl TemporalGridBuilder {
    pub fn new(suite: Arc<ModelSuite>) -> Self {
        TemporalGridBuilder { suite }
    }

    pub fn suite(&self) -> &Arc<ModelSuite> {
        &self.suite
    }

    fn sequence(&self, range: &DateRange) -> GridResult<Arc<TemporalSequence>> {
        let sequence = TemporalSequence::from_range(range)?;
        self.suite.observer().on_event(&GridEvent::TemporalSequenceBuilt {
            start: sequence.start(),
            steps: sequence.len(),
            step_seconds: range.step_seconds,
        });
        Ok(Arc::new(sequence))
    }

    /// One unit per point, in point order. The first failing point aborts
    /// the whole batch.
    pub fn formulate(
        &self,
        points: &[SpatialPoint],
        range: &DateRange,
        magnet_model: &str,
    ) -> GridResult<Vec<SimulationUnit>> {
        let sequence = self.sequence(range)?;
        points
            .iter()
            .map(|point| {
                SimulationUnit::create(*point, sequence.clone(), magnet_model, self.suite.clone())
            })
            .collect()
    }

    /// Like [`formulate`](Self::formulate) but records failing points and
    /// carries on. A malformed date range still fails outright.
    pub fn formulate_collect(
        &self,
        points: &[SpatialPoint],
        range: &DateRange,
        magnet_model: &str,
    ) -> GridResult<FormulationReport> {
        let sequence = self.sequence(range)?;
        let mut report = FormulationReport::default();

        for (index, point) in points.iter().enumerate() {
            match SimulationUnit::create(*point, sequence.clone(), magnet_model, self.suite.clone())
            {
                Ok(unit) => report.units.push(unit),
                Err(error) => {
                    self.suite.observer().on_event(&GridEvent::UnitFailed {
                        index,
                        point: *point,
                        reason: error.to_string(),
                    });
                    report.failures.push(UnitFailure {
                        index,
                        point: *point,
                        error,
                    });
                }
            }
        }
        Ok(report)
    }
}

/// Parallel [`TemporalGridBuilder::formulate`]. Every rayon work split gets
/// its own suite from `factory`, so provider state is never shared between
/// threads. Output order matches `points`.
///
/// The sequence event goes through a suite built on the calling thread, so
/// it is reported once like in the sequential builders.
pub fn formulate_parallel<F>(
    points: &[SpatialPoint],
    range: &DateRange,
    magnet_model: &str,
    factory: F,
) -> GridResult<Vec<SimulationUnit>>
where
    F: Fn() -> ModelSuite + Send + Sync,
{
    let sequence = TemporalGridBuilder::new(Arc::new(factory())).sequence(range)?;
    points
        .par_iter()
        .map_init(
            || Arc::new(factory()),
            |suite, point| {
                SimulationUnit::create(*point, sequence.clone(), magnet_model, suite.clone())
            },
        )
        .collect()
}
