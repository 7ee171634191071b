use super::width::evaluate_width_way;
use crate::error::TopologyError;
use crate::graph::LabeledGraph;
use crate::math::distance_2d::{point_to_segment_dist, segment_to_segment_dist};
use crate::math::{Point2, TOLERANCE};

/// Iterations of the ternary and bisection searches along a segment.
const SEARCH_ITERATIONS: usize = 64;

/// Buffer of radius `radius` around the segment `a → b`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Capsule {
    a: Point2,
    b: Point2,
    radius: f64,
}

impl Capsule {
    /// Signed clearance of `p`: negative inside.
    fn clearance(&self, p: &Point2) -> f64 {
        point_to_segment_dist(p, &self.a, &self.b) - self.radius
    }

    /// Parameter interval of `a → b` lying inside the capsule.
    ///
    /// The clearance along a segment is convex, so the inside part is a
    /// single interval found around the clearance minimum.
    fn inside_interval(&self, a: &Point2, b: &Point2) -> Option<(f64, f64)> {
        let d = b - a;
        let f = |t: f64| self.clearance(&(a + d * t));

        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        for _ in 0..SEARCH_ITERATIONS {
            let m1 = lo + (hi - lo) / 3.0;
            let m2 = hi - (hi - lo) / 3.0;
            if f(m1) < f(m2) {
                hi = m2;
            } else {
                lo = m1;
            }
        }
        let t_min = 0.5 * (lo + hi);
        if f(t_min) > 0.0 {
            return None;
        }

        let bisect = |mut outside: f64, mut inside: f64| {
            for _ in 0..SEARCH_ITERATIONS {
                let mid = 0.5 * (outside + inside);
                if f(mid) > 0.0 {
                    outside = mid;
                } else {
                    inside = mid;
                }
            }
            inside
        };
        let start = if f(0.0) <= 0.0 { 0.0 } else { bisect(0.0, t_min) };
        let end = if f(1.0) <= 0.0 { 1.0 } else { bisect(1.0, t_min) };
        Some((start, end))
    }
}

/// Union of capsules built around the roadway edges of a graph.
///
/// Each edge contributes a capsule whose diameter is its evaluated width
/// plus a margin.
#[derive(Debug, Clone, Default)]
pub struct RoadBuffer {
    capsules: Vec<Capsule>,
}

impl RoadBuffer {
    /// Builds the buffer of every roadway edge of the graph.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NodeNotFound` if an edge endpoint is unknown.
    pub fn from_graph(graph: &LabeledGraph, margin: f64) -> Result<Self, TopologyError> {
        let mut capsules = Vec::new();
        for (from, to, edge) in graph.roadway_edges() {
            capsules.push(Capsule {
                a: graph.point(from)?,
                b: graph.point(to)?,
                radius: 0.5 * (evaluate_width_way(&edge.tags) + margin),
            });
        }
        Ok(Self { capsules })
    }

    /// Adds a capsule of the given total breadth around a segment.
    pub fn add_segment(&mut self, a: Point2, b: Point2, breadth: f64) {
        self.capsules.push(Capsule {
            a,
            b,
            radius: 0.5 * breadth,
        });
    }

    /// True if the buffer has no capsule.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.capsules.is_empty()
    }

    /// True if the point lies inside the buffer.
    #[must_use]
    pub fn contains(&self, p: &Point2) -> bool {
        self.capsules.iter().any(|c| c.clearance(p) <= 0.0)
    }

    /// True if the segment `a → b` touches the buffer.
    #[must_use]
    pub fn intersects_segment(&self, a: &Point2, b: &Point2) -> bool {
        self.capsules
            .iter()
            .any(|c| segment_to_segment_dist(a, b, &c.a, &c.b) <= c.radius)
    }

    /// Points where the segment `a → b` crosses the buffer boundary, with
    /// their parameter along the segment, sorted from `a` to `b`.
    ///
    /// The segment endpoints themselves are never reported.
    #[must_use]
    pub fn boundary_crossings(&self, a: &Point2, b: &Point2) -> Vec<(Point2, f64)> {
        let mut intervals: Vec<(f64, f64)> = self
            .capsules
            .iter()
            .filter_map(|c| c.inside_interval(a, b))
            .collect();
        intervals.sort_by(|x, y| x.0.total_cmp(&y.0));

        let mut merged: Vec<(f64, f64)> = Vec::new();
        for (start, end) in intervals {
            match merged.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }

        let d = b - a;
        merged
            .into_iter()
            .flat_map(|(start, end)| [start, end])
            .filter(|t| *t > TOLERANCE && *t < 1.0 - TOLERANCE)
            .map(|t| (a + d * t, t))
            .collect()
    }
}
