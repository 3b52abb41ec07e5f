//! Regular latitude x longitude x height lattice
//!
//! Each axis is given as `(start, end, step)`. The step only decides how many
//! samples an axis gets; the samples themselves are spread evenly from start
//! to end, so the real spacing is `(end - start) / (n - 1)`.

use std::sync::Arc;

use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::constants::AXIS_COUNT_TOLERANCE;
use crate::error::{GridError, GridResult};
use crate::math_utils::linspace;
use crate::observer::{GridEvent, NullObserver, ObserverHandle};

/// One grid location. Latitude and longitude in degrees (longitude signed,
/// [-180, 180]), height in km.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SpatialPoint {
    latitude: f64,
    longitude: f64,
    height: f64,
}

impl SpatialPoint {
    pub fn new(latitude: f64, longitude: f64, height: f64) -> SpatialPoint {
        SpatialPoint {
            latitude,
            longitude,
            height,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn height(&self) -> f64 {
        self.height
    }

}

/// Serialized as `[start, end, step]`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct AxisRange {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl AxisRange {
    pub fn new(start: f64, end: f64, step: f64) -> AxisRange {
        AxisRange { start, end, step }
    }

    /// A single-sample axis at `value`.
    pub fn fixed(value: f64) -> AxisRange {
        AxisRange::new(value, value, 1.0)
    }

    /// `floor((end - start) / step) + 1`
    pub fn count(&self, axis: &str) -> GridResult<usize> {
        if !(self.start.is_finite() && self.end.is_finite() && self.step.is_finite()) {
            return Err(GridError::invalid_range(axis, "bounds must be finite"));
        }
        if self.step <= 0.0 {
            return Err(GridError::invalid_range(
                axis,
                format!("step must be positive, got {}", self.step),
            ));
        }
        if self.end < self.start {
            return Err(GridError::invalid_range(
                axis,
                format!("end {} is before start {}", self.end, self.start),
            ));
        }

        let intervals = (self.end - self.start) / self.step;
        let count = (intervals * (1.0 + AXIS_COUNT_TOLERANCE)).floor() + 1.0;
        if count < 1.0 || count > usize::MAX as f64 {
            return Err(GridError::invalid_range(
                axis,
                format!("sample count {} is not representable", count),
            ));
        }
        Ok(count as usize)
    }

    pub fn samples(&self, count: usize) -> Vec<f64> {
        linspace(self.start, self.end, count)
    }
}

impl From<[f64; 3]> for AxisRange {
    fn from([start, end, step]: [f64; 3]) -> Self {
        AxisRange::new(start, end, step)
    }
}

impl From<AxisRange> for [f64; 3] {
    fn from(range: AxisRange) -> Self {
        [range.start, range.end, range.step]
    }
}

/// How longitude samples are spaced.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LongitudeSampling {
    /// Longitude samples derived from the longitude axis' own count.
    #[default]
    Independent,
    /// Longitude samples spread with the latitude count, reproducing grids
    /// generated by the historical tooling. Fails when the longitude axis
    /// has more samples than the latitude axis.
    Legacy,
}

/// Parallel coordinate arrays, all shaped `(nx, ny, nz)`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SpatialLattice {
    pub latitudes: Array3<f64>,
    pub longitudes: Array3<f64>,
    pub heights: Array3<f64>,
}

impl SpatialLattice {
    pub fn shape(&self) -> (usize, usize, usize) {
        self.latitudes.dim()
    }

    pub fn point_at(&self, i: usize, j: usize, k: usize) -> Option<SpatialPoint> {
        Some(SpatialPoint::new(
            *self.latitudes.get((i, j, k))?,
            *self.longitudes.get((i, j, k))?,
            *self.heights.get((i, j, k))?,
        ))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SpatialGrid {
    pub lattice: SpatialLattice,
    pub points: Vec<SpatialPoint>,
}

impl SpatialGrid {
    pub fn shape(&self) -> (usize, usize, usize) {
        self.lattice.shape()
    }

    /// Lattice index of the n-th flattened point.
    pub fn lattice_index(&self, n: usize) -> Option<(usize, usize, usize)> {
        let (_, ny, nz) = self.shape();
        if n >= self.points.len() {
            return None;
        }
        Some((n / (ny * nz), (n / nz) % ny, n % nz))
    }
}

pub struct SpatialGridBuilder {
    longitude_sampling: LongitudeSampling,
    observer: ObserverHandle,
}

impl Default for SpatialGridBuilder {
    fn default() -> Self {
        Self::new(Arc::new(NullObserver))
    }
}

impl SpatialGridBuilder {
    pub fn new(observer: ObserverHandle) -> SpatialGridBuilder {
        SpatialGridBuilder {
            longitude_sampling: LongitudeSampling::Independent,
            observer,
        }
    }

    pub fn with_longitude_sampling(mut self, sampling: LongitudeSampling) -> Self {
        self.longitude_sampling = sampling;
        self
    }

    pub fn build(
        &self,
        latitudes: AxisRange,
        longitudes: AxisRange,
        heights: AxisRange,
    ) -> GridResult<SpatialGrid> {
        let nx = latitudes.count("latitude")?;
        let ny = longitudes.count("longitude")?;
        let nz = heights.count("height")?;
        let total = lattice_size(nx, ny, nz)?;

        let lat_samples = latitudes.samples(nx);
        let lon_samples = match self.longitude_sampling {
            LongitudeSampling::Independent => longitudes.samples(ny),
            LongitudeSampling::Legacy => {
                if ny > nx {
                    return Err(GridError::invalid_range(
                        "longitude",
                        format!(
                            "legacy sampling spreads {} longitudes over {} latitude samples",
                            ny, nx
                        ),
                    ));
                }
                longitudes.samples(nx)
            }
        };
        let height_samples = heights.samples(nz);

        let shape = (nx, ny, nz);
        let mut lattice = SpatialLattice {
            latitudes: Array3::zeros(shape),
            longitudes: Array3::zeros(shape),
            heights: Array3::zeros(shape),
        };
        let mut points = Vec::with_capacity(total);

        for (i, &lat) in lat_samples.iter().enumerate() {
            for (j, &lon) in lon_samples.iter().take(ny).enumerate() {
                for (k, &h) in height_samples.iter().enumerate() {
                    lattice.latitudes[[i, j, k]] = lat;
                    lattice.longitudes[[i, j, k]] = lon;
                    lattice.heights[[i, j, k]] = h;
                    points.push(SpatialPoint::new(lat, lon, h));
                }
            }
        }

        self.observer
            .on_event(&GridEvent::SpatialGridBuilt { nx, ny, nz });

        Ok(SpatialGrid { lattice, points })
    }
}

/// Point count of an `nx * ny * nz` lattice, if the points fit in one
/// allocation.
fn lattice_size(nx: usize, ny: usize, nz: usize) -> GridResult<usize> {
    nx.checked_mul(ny)
        .and_then(|p| p.checked_mul(nz))
        .filter(|&n| {
            n.checked_mul(std::mem::size_of::<SpatialPoint>())
                .is_some_and(|bytes| bytes <= isize::MAX as usize)
        })
        .ok_or_else(|| {
            GridError::invalid_range(
                "lattice",
                format!("{} x {} x {} points do not fit in memory", nx, ny, nz),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::Rng;

    fn build(lat: AxisRange, lon: AxisRange, h: AxisRange) -> GridResult<SpatialGrid> {
        SpatialGridBuilder::default().build(lat, lon, h)
    }

    #[test]
    fn single_column_three_heights() {
        let grid = build(
            AxisRange::new(45.0, 45.0, 1.0),
            AxisRange::new(-75.0, -75.0, 1.0),
            AxisRange::new(50.0, 150.0, 50.0),
        )
        .unwrap();

        assert_eq!(grid.shape(), (1, 1, 3));
        assert_eq!(
            grid.points,
            vec![
                SpatialPoint::new(45.0, -75.0, 50.0),
                SpatialPoint::new(45.0, -75.0, 100.0),
                SpatialPoint::new(45.0, -75.0, 150.0),
            ]
        );
    }

    #[test]
    fn nested_order_latitude_outermost() {
        let grid = build(
            AxisRange::new(0.0, 10.0, 10.0),
            AxisRange::new(-20.0, 20.0, 20.0),
            AxisRange::new(60.0, 80.0, 20.0),
        )
        .unwrap();

        assert_eq!(grid.shape(), (2, 3, 2));
        assert_eq!(grid.points.len(), 12);
        assert_eq!(grid.points[0], SpatialPoint::new(0.0, -20.0, 60.0));
        assert_eq!(grid.points[1], SpatialPoint::new(0.0, -20.0, 80.0));
        assert_eq!(grid.points[2], SpatialPoint::new(0.0, 0.0, 60.0));
        assert_eq!(grid.points[6], SpatialPoint::new(10.0, -20.0, 60.0));
        assert_eq!(grid.points[11], SpatialPoint::new(10.0, 20.0, 80.0));
    }

    #[test]
    fn step_is_advisory() {
        // 0..=10 step 4 gives 3 samples spread over the full span
        let range = AxisRange::new(0.0, 10.0, 4.0);
        let n = range.count("height").unwrap();
        assert_eq!(n, 3);
        assert_eq!(range.samples(n), vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn fractional_step_count_tolerates_rounding() {
        assert_eq!(AxisRange::new(0.0, 0.3, 0.1).count("latitude").unwrap(), 4);
    }

    #[test]
    fn tolerant_count_differs_from_plain_floor() {
        // (0.3 - 0.0) / 0.1 is 2.9999999999999996 in f64, so a plain floor
        // gives one sample fewer than the tolerant count
        let range = AxisRange::new(0.0, 0.3, 0.1);
        let plain = ((range.end - range.start) / range.step).floor() as usize + 1;
        assert_eq!(plain, 3);
        assert_eq!(range.count("latitude").unwrap(), plain + 1);

        // exact ratios agree
        let range = AxisRange::new(50.0, 150.0, 50.0);
        let plain = ((range.end - range.start) / range.step).floor() as usize + 1;
        assert_eq!(range.count("height").unwrap(), plain);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = build(
            AxisRange::new(50.0, 45.0, 1.0),
            AxisRange::fixed(-75.0),
            AxisRange::fixed(100.0),
        )
        .unwrap_err();
        assert!(matches!(err, GridError::InvalidRange { ref axis, .. } if axis == "latitude"));
    }

    #[test]
    fn oversized_lattice_is_rejected() {
        // product overflows usize
        let huge = AxisRange::new(0.0, 9_999_999.0, 1.0);
        let err = build(huge, huge, huge).unwrap_err();
        assert!(matches!(err, GridError::InvalidRange { ref axis, .. } if axis == "lattice"));

        // 2^63 points fit in usize but not in an allocation
        let wide = AxisRange::new(0.0, 2_097_151.0, 1.0);
        assert_eq!(wide.count("latitude").unwrap(), 1 << 21);
        let err = build(wide, wide, wide).unwrap_err();
        assert!(matches!(err, GridError::InvalidRange { ref axis, .. } if axis == "lattice"));
    }

    #[test]
    fn non_positive_step_is_rejected() {
        for step in [0.0, -1.0, f64::NAN] {
            let err = AxisRange::new(0.0, 10.0, step).count("height").unwrap_err();
            assert!(matches!(err, GridError::InvalidRange { .. }));
        }
    }

    #[test]
    fn legacy_longitude_sampling_reuses_latitude_count() {
        let lat = AxisRange::new(40.0, 50.0, 5.0); // 3 samples
        let lon = AxisRange::new(-80.0, -70.0, 10.0); // 2 samples

        let independent = build(lat, lon, AxisRange::fixed(100.0)).unwrap();
        let legacy = SpatialGridBuilder::default()
            .with_longitude_sampling(LongitudeSampling::Legacy)
            .build(lat, lon, AxisRange::fixed(100.0))
            .unwrap();

        assert_eq!(independent.shape(), legacy.shape());
        assert_eq!(independent.points[1].longitude(), -70.0);
        // legacy spreads 3 samples over the longitude span and keeps the first 2
        assert_eq!(legacy.points[1].longitude(), -75.0);
    }

    #[test]
    fn legacy_longitude_sampling_fails_when_longitudes_outnumber_latitudes() {
        let err = SpatialGridBuilder::default()
            .with_longitude_sampling(LongitudeSampling::Legacy)
            .build(
                AxisRange::fixed(45.0),
                AxisRange::new(-80.0, -70.0, 5.0),
                AxisRange::fixed(100.0),
            )
            .unwrap_err();
        assert!(matches!(err, GridError::InvalidRange { ref axis, .. } if axis == "longitude"));
    }

    #[test]
    fn random_ranges_round_trip_through_lattice() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let lat_start = rng.random_range(-90.0..80.0);
            let lon_start = rng.random_range(-180.0..170.0);
            let lat = AxisRange::new(lat_start, lat_start + rng.random_range(0.0..10.0), 2.5);
            let lon = AxisRange::new(lon_start, lon_start + rng.random_range(0.0..10.0), 2.5);
            let h = AxisRange::new(60.0, 60.0 + rng.random_range(0.0..100.0), 20.0);

            let grid = build(lat, lon, h).unwrap();
            let (nx, ny, nz) = grid.shape();
            assert_eq!(nx, lat.count("latitude").unwrap());
            assert_eq!(ny, lon.count("longitude").unwrap());
            assert_eq!(nz, h.count("height").unwrap());
            assert_eq!(grid.points.len(), nx * ny * nz);

            for (n, point) in grid.points.iter().enumerate() {
                let (i, j, k) = grid.lattice_index(n).unwrap();
                assert_eq!(grid.lattice.point_at(i, j, k), Some(*point));
            }
            assert_abs_diff_eq!(grid.points[0].latitude(), lat.start);
            let last = grid.points[grid.points.len() - 1];
            assert_abs_diff_eq!(last.height(), *h.samples(nz).last().unwrap());
            assert!(last.height() <= h.end);
        }
    }

    #[test]
    fn emits_one_build_event() {
        let observer = Arc::new(crate::observer::RecordingObserver::new());
        SpatialGridBuilder::new(observer.clone())
            .build(
                AxisRange::fixed(45.0),
                AxisRange::fixed(-75.0),
                AxisRange::new(50.0, 150.0, 50.0),
            )
            .unwrap();
        assert_eq!(
            observer.events(),
            vec![GridEvent::SpatialGridBuilt { nx: 1, ny: 1, nz: 3 }]
        );
    }
}
