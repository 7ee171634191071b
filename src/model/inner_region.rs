use serde::Serialize;

use super::turning_sidewalk::TurningSidewalk;
use crate::error::{Result, TopologyError};
use crate::math::polygon_2d::inset_ring;
use crate::math::{Point2, TOLERANCE};

/// Pedestrian-accessible region enclosed by the turning sidewalks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InnerRegion {
    /// Sidewalk polylines threaded end to end, closed.
    pub ring: Vec<Point2>,
    /// `ring` shrunk by the white space distance, closed.
    pub polygon: Vec<Point2>,
}

/// Threads the turning sidewalks into the inner region ring.
#[derive(Debug, Clone, Copy)]
pub struct BuildInnerRegion {
    white_space_distance: f64,
}

impl BuildInnerRegion {
    /// Creates a new `BuildInnerRegion` operation.
    #[must_use]
    pub fn new(white_space_distance: f64) -> Self {
        Self {
            white_space_distance,
        }
    }

    /// Executes the assembly.
    ///
    /// Starting from the last sidewalk, the sidewalk whose first or last
    /// branch name matches the open end of the chain is appended, reversed
    /// if needed, until none is left.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::UnclosedInnerRegion` when a sidewalk cannot be
    /// chained and `TopologyError::InvalidTopology` without sidewalks. A ring
    /// too degenerate to be shrunk is kept as the polygon.
    pub fn execute(&self, sidewalks: &[TurningSidewalk]) -> Result<InnerRegion> {
        let mut open: Vec<&TurningSidewalk> = sidewalks.iter().collect();
        let Some(first) = open.pop() else {
            return Err(TopologyError::InvalidTopology(
                "no turning sidewalk to build the inner region".to_owned(),
            )
            .into());
        };

        let mut ring = first.polyline();
        let mut open_end = first.branch_names()[1];
        while !open.is_empty() {
            let next = open.iter().enumerate().find_map(|(i, s)| {
                let [start, end] = s.branch_names();
                if start == open_end {
                    Some((i, true))
                } else if end == open_end {
                    Some((i, false))
                } else {
                    None
                }
            });
            let Some((index, forward)) = next else {
                return Err(TopologyError::UnclosedInnerRegion {
                    remaining: open.len(),
                }
                .into());
            };
            let sidewalk = open.remove(index);
            let mut points = sidewalk.polyline();
            if forward {
                open_end = sidewalk.branch_names()[1];
            } else {
                points.reverse();
                open_end = sidewalk.branch_names()[0];
            }
            ring.extend(points);
        }
        if let Some(&start) = ring.first() {
            ring.push(start);
        }

        let polygon = if self.white_space_distance > TOLERANCE {
            match inset_ring(&ring, self.white_space_distance) {
                Ok(polygon) => polygon,
                Err(err) => {
                    tracing::warn!(%err, "white space inset failed, ring kept");
                    ring.clone()
                }
            }
        } else {
            ring.clone()
        };
        tracing::info!(
            sidewalks = sidewalks.len(),
            vertices = polygon.len(),
            "inner region built"
        );
        Ok(InnerRegion { ring, polygon })
    }
}
