//! Space-time grid for sudden ionospheric disturbance modelling.
//!
//! A [`spatial_grid::SpatialGridBuilder`] lays out latitude, longitude and
//! height samples, a [`temporal_grid::TemporalGridBuilder`] pairs every point
//! with one shared time sequence, and each resulting
//! [`grid::SimulationUnit`] composes solar geometry, magnetic field and
//! background atmosphere from the providers in a [`model::ModelSuite`].

pub mod config;
pub mod constants;
pub mod error;
pub mod grid;
pub mod grid_csv_writer;
pub mod math_utils;
pub mod model;
pub mod observer;
pub mod spatial_grid;
pub mod temporal_grid;

#[cfg(test)]
mod test_support;

pub use error::{GridError, GridResult};
