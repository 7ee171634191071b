use std::f64::consts::{FRAC_PI_2, PI};

use serde::Serialize;

use crate::error::TopologyError;
use crate::graph::{LabeledGraph, NodeId};
use crate::math::vector_2d::{angle_modulo, bearing, circular_mean, normalized_vector};
use crate::math::{Point2, Vector2};

/// A pedestrian crossing node with the direction pedestrians walk across it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Crossing {
    pub node_id: NodeId,
    pub location: Point2,
    /// Walking direction in `[0, 2π)`.
    pub bearing: f64,
    /// True when derived from the crossed roadways, false when derived from
    /// footways or when no estimate was possible.
    pub bearing_confidence: bool,
}

impl Crossing {
    /// Estimates the crossing orientation of a node from its neighbourhood.
    ///
    /// Footway neighbours give the walking direction directly. Otherwise the
    /// roadway neighbours are used, rotated by a quarter turn.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NodeNotFound` if the node is unknown.
    pub fn build(graph: &LabeledGraph, node_id: NodeId) -> Result<Self, TopologyError> {
        let location = graph.point(node_id)?;
        let mut footways = Vec::new();
        let mut roadways = Vec::new();
        for neighbor in graph.neighbors(node_id)? {
            let Ok(v) = normalized_vector(&location, &graph.point(neighbor)?) else {
                continue;
            };
            if graph.is_footway(node_id, neighbor) {
                footways.push(v);
            } else if graph.is_roadway(node_id, neighbor) {
                roadways.push(v);
            }
        }

        let estimate = if footways.is_empty() {
            parallel_orientation(&roadways).map(|b| (angle_modulo(b + FRAC_PI_2), true))
        } else {
            parallel_orientation(&footways).map(|b| (angle_modulo(b), false))
        };
        let (bearing, bearing_confidence) = estimate.unwrap_or_else(|| {
            tracing::warn!(
                node_id,
                footways = footways.len(),
                roadways = roadways.len(),
                "unsupported neighbourhood for crossing orientation"
            );
            (0.0, false)
        });

        Ok(Self {
            node_id,
            location,
            bearing,
            bearing_confidence,
        })
    }

    /// Unit vector along the bearing.
    #[must_use]
    pub fn direction(&self) -> Vector2 {
        Vector2::new(self.bearing.cos(), self.bearing.sin())
    }

    /// Three points along the bearing: `location ∓ length` and the location.
    #[must_use]
    pub fn line_representation(&self, length: f64) -> [Point2; 3] {
        let shift = self.direction() * length;
        [self.location - shift, self.location, self.location + shift]
    }
}

/// Direction of a set of unit vectors leaving a node, defined for one to
/// three vectors.
fn parallel_orientation(vectors: &[Vector2]) -> Option<f64> {
    match vectors {
        [v] => Some(bearing(v)),
        [v0, v1] => Some(bearing(&(v0 - v1))),
        [_, _, _] => {
            let mut angles: Vec<f64> = vectors.iter().map(bearing).collect();
            angles.sort_by(f64::total_cmp);
            let gap = |i: usize| angle_modulo(angles[(i + 1) % 3] - angles[i]);
            let first = (0..3)
                .min_by(|&a, &b| gap(a).total_cmp(&gap(b)))
                .unwrap_or(0);
            let second = (first + 1) % 3;
            let other = (first + 2) % 3;
            Some(circular_mean(
                circular_mean(angles[first], angles[second]),
                angles[other] + PI,
            ))
        }
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::graph::{DescriptionTable, EdgeTags, NodeData, NodeTags, RoadGraph};

    fn crossing_node(id: i64) -> NodeData {
        NodeData::new(id, 0.0, 0.0).with_tags(NodeTags {
            crossing: Some("zebra".to_owned()),
            ..NodeTags::default()
        })
    }

    #[test]
    fn roadway_neighbours_give_orthogonal_bearing() {
        let mut g = RoadGraph::new();
        g.add_node(crossing_node(1));
        g.add_node(NodeData::new(2, 10.0, 0.0));
        g.add_node(NodeData::new(3, -10.0, 0.0));
        g.add_edge(1, 2, EdgeTags::highway("residential")).unwrap();
        g.add_edge(1, 3, EdgeTags::highway("residential")).unwrap();
        let g = g.label(&DescriptionTable::default());

        let c = Crossing::build(&g, 1).unwrap();
        assert_abs_diff_eq!(c.bearing, FRAC_PI_2, epsilon = 1e-12);
        assert!(c.bearing_confidence);
        let [a, m, b] = c.line_representation(2.0);
        assert_abs_diff_eq!(a, Point2::new(0.0, -2.0), epsilon = 1e-12);
        assert_abs_diff_eq!(m, Point2::new(0.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(b, Point2::new(0.0, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn footway_wins_over_roadway() {
        let mut g = RoadGraph::new();
        g.add_node(crossing_node(1));
        g.add_node(NodeData::new(2, 10.0, 0.0));
        g.add_node(NodeData::new(3, 0.0, 5.0));
        g.add_edge(1, 2, EdgeTags::highway("residential")).unwrap();
        g.add_edge(1, 3, EdgeTags::highway("footway")).unwrap();
        let g = g.label(&DescriptionTable::default());

        let c = Crossing::build(&g, 1).unwrap();
        assert_abs_diff_eq!(c.bearing, FRAC_PI_2, epsilon = 1e-12);
        assert!(!c.bearing_confidence);
    }

    #[test]
    fn three_branches() {
        // Two close vectors pointing east-ish and one pointing west.
        let vectors = [
            Vector2::new(1.0, 0.2).normalize(),
            Vector2::new(1.0, -0.2).normalize(),
            Vector2::new(-1.0, 0.0),
        ];
        let b = parallel_orientation(&vectors).unwrap();
        assert_abs_diff_eq!(b.sin(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(b.cos(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn isolated_crossing_defaults() {
        let mut g = RoadGraph::new();
        g.add_node(crossing_node(1));
        g.add_node(NodeData::new(2, 10.0, 0.0));
        g.add_edge(1, 2, EdgeTags::highway("steps")).unwrap();
        let g = g.label(&DescriptionTable::default());

        let c = Crossing::build(&g, 1).unwrap();
        assert_abs_diff_eq!(c.bearing, 0.0);
        assert!(!c.bearing_confidence);
    }
}
