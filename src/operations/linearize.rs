use serde::Deserialize;

use crate::error::GeometryError;
use crate::math::polyline_2d::{centroid, interpolate, length};
use crate::math::vector_2d::normalized_vector;
use crate::math::Point2;

/// Sampling parameters of the [`Linearizer`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LinearizationConfig {
    /// First sampling step.
    pub start_step: f64,
    /// Ratio between consecutive sampling positions.
    pub growth: f64,
    /// Maximum arc length considered, also the length of the direction ray.
    pub cutoff: f64,
}

impl Default for LinearizationConfig {
    fn default() -> Self {
        Self {
            start_step: 1.0,
            growth: 1.2,
            cutoff: 30.0,
        }
    }
}

/// Summarizes the initial direction of a polyline as a 2-point segment.
///
/// The polyline is sampled at exponentially growing arc lengths, which
/// weights its near end. A ray of length `cutoff` is cast from the first
/// sample towards the samples' centroid, and the polyline's far end is
/// projected onto that ray.
#[derive(Debug, Clone, Copy, Default)]
pub struct Linearizer {
    config: LinearizationConfig,
}

impl Linearizer {
    /// Creates a new `Linearizer` with the given sampling parameters.
    #[must_use]
    pub fn new(config: LinearizationConfig) -> Self {
        Self { config }
    }

    /// Sampling positions `0, start, start·growth, …` up to `limit`; the last
    /// position may overshoot and is clamped by interpolation.
    fn sample_positions(&self, limit: f64) -> Vec<f64> {
        let mut positions = vec![0.0];
        if self.config.start_step <= 0.0 || self.config.growth <= 1.0 {
            positions.push(limit);
            return positions;
        }
        let mut step = self.config.start_step;
        positions.push(step);
        while step < limit {
            step *= self.config.growth;
            positions.push(step);
        }
        positions
    }

    /// Executes the linearization.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` for polylines with fewer than two
    /// points, and `GeometryError::ZeroVector` when the samples' centroid
    /// coincides with the first sample (zero-length polyline).
    pub fn execute(&self, polyline: &[Point2]) -> Result<[Point2; 2], GeometryError> {
        if polyline.len() < 2 {
            return Err(GeometryError::Degenerate(format!(
                "cannot linearize a polyline of {} point(s)",
                polyline.len()
            )));
        }
        let limit = length(polyline).min(self.config.cutoff);
        let samples: Vec<Point2> = self
            .sample_positions(limit)
            .into_iter()
            .filter_map(|d| interpolate(polyline, d.min(limit)))
            .collect();

        let start = samples[0];
        let center = centroid(&samples).ok_or(GeometryError::ZeroVector)?;
        let dir = normalized_vector(&start, &center)?;

        let last = polyline[polyline.len() - 1];
        let t = (last - start).dot(&dir).clamp(0.0, self.config.cutoff);
        Ok([start, start + dir * t])
    }
}
