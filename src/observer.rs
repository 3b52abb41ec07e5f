//! Structured events emitted while building and setting up grids.
//!
//! Nothing in the crate logs on its own; every builder and unit reports
//! through a [`GridObserver`] handed to it. [`TracingObserver`] forwards the
//! events to `tracing`, [`NullObserver`] drops them.

use std::sync::Arc;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::spatial_grid::SpatialPoint;

#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    SpatialGridBuilt {
        nx: usize,
        ny: usize,
        nz: usize,
    },
    TemporalSequenceBuilt {
        start: DateTime<Utc>,
        steps: usize,
        step_seconds: i64,
    },
    UnitConstructed {
        point: SpatialPoint,
        timestamps: usize,
    },
    MagneticFieldComputed {
        point: SpatialPoint,
        model: String,
        year: i32,
    },
    BackgroundComputed {
        point: SpatialPoint,
        date: DateTime<Utc>,
        smoothing_days: u32,
    },
    SetupComplete {
        point: SpatialPoint,
    },
    ProviderRetry {
        provider: String,
        attempt: u32,
        reason: String,
    },
    UnitFailed {
        index: usize,
        point: SpatialPoint,
        reason: String,
    },
}

pub trait GridObserver: Send + Sync {
    fn on_event(&self, event: &GridEvent);
}

pub type ObserverHandle = Arc<dyn GridObserver>;

#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl GridObserver for NullObserver {
    fn on_event(&self, _event: &GridEvent) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl GridObserver for TracingObserver {
    fn on_event(&self, event: &GridEvent) {
        match event {
            GridEvent::SpatialGridBuilt { nx, ny, nz } => {
                info!(nx, ny, nz, points = nx * ny * nz, "spatial grid built");
            }
            GridEvent::TemporalSequenceBuilt {
                start,
                steps,
                step_seconds,
            } => {
                info!(start = %start, steps, step_seconds, "temporal sequence built");
            }
            GridEvent::UnitConstructed { point, timestamps } => {
                debug!(
                    lat = point.latitude(),
                    lon = point.longitude(),
                    h = point.height(),
                    timestamps,
                    "simulation unit constructed"
                );
            }
            GridEvent::MagneticFieldComputed { point, model, year } => {
                debug!(
                    lat = point.latitude(),
                    lon = point.longitude(),
                    h = point.height(),
                    model = %model,
                    year,
                    "magnetic field computed"
                );
            }
            GridEvent::BackgroundComputed {
                point,
                date,
                smoothing_days,
            } => {
                debug!(
                    lat = point.latitude(),
                    lon = point.longitude(),
                    h = point.height(),
                    date = %date,
                    smoothing_days,
                    "background ionosphere computed"
                );
            }
            GridEvent::SetupComplete { point } => {
                debug!(
                    lat = point.latitude(),
                    lon = point.longitude(),
                    h = point.height(),
                    "setup complete"
                );
            }
            GridEvent::ProviderRetry {
                provider,
                attempt,
                reason,
            } => {
                warn!(provider = %provider, attempt, reason = %reason, "retrying provider call");
            }
            GridEvent::UnitFailed {
                index,
                point,
                reason,
            } => {
                warn!(
                    index,
                    lat = point.latitude(),
                    lon = point.longitude(),
                    h = point.height(),
                    reason = %reason,
                    "simulation unit failed"
                );
            }
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<GridEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GridEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, matches: impl Fn(&GridEvent) -> bool) -> usize {
        self.events().iter().filter(|event| matches(event)).count()
    }
}

impl GridObserver for RecordingObserver {
    fn on_event(&self, event: &GridEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
