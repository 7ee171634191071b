use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{Result, TopologyError};
use crate::graph::{DescriptionKey, EntryKind, LabeledGraph, NodeId};
use crate::math::intersect_2d::segment_polyline_intersections;
use crate::math::polyline_2d::{centroid, length, split_at_length};
use crate::math::vector_2d::normalize;
use crate::math::{Point2, Vector2};
use crate::operations::{Linearizer, RoadBuffer};

/// Length of the rays cast from an island center towards its extremities.
const SPOKE_LENGTH: f64 = 200.0;

/// A traffic island rebuilt from its border fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficIsland {
    pub island_id: i64,
    /// Closed node ring (first id repeated at the end when the fragments
    /// close).
    pub polygon: Vec<NodeId>,
    fragments: Vec<(NodeId, NodeId)>,
}

/// Schematic summary of a traffic island.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IslandGeneralization {
    pub is_reachable: bool,
    pub center: Point2,
    pub radius: f64,
    pub is_linear: bool,
    /// End points of the spokes drawn towards elongated parts of the island.
    pub extremities: Vec<Point2>,
}

impl TrafficIsland {
    /// Groups the border fragments of every island named by a `branch` or
    /// `way` row, by ascending island id.
    #[must_use]
    pub fn collect_fragments(graph: &LabeledGraph) -> BTreeMap<i64, Vec<(NodeId, NodeId)>> {
        let mut islands: BTreeMap<i64, Vec<(NodeId, NodeId)>> = BTreeMap::new();
        for (key, entry) in graph.table().iter() {
            let DescriptionKey::Edge(a, b) = key else {
                continue;
            };
            if !matches!(entry.kind, EntryKind::Branch | EntryKind::Way) {
                continue;
            }
            for island_id in [entry.left_island, entry.right_island].into_iter().flatten() {
                islands.entry(island_id).or_default().push((a, b));
            }
        }
        islands
    }

    /// Chains unordered fragments into a single node ring.
    ///
    /// Fragments are appended to the open end of the chain, reversed when
    /// needed. When nothing fits, the chain is reversed once and the search
    /// resumes from its other end.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::IslandNotChainable` on a second failure, and
    /// `TopologyError::InvalidTopology` without fragments.
    pub fn build(
        island_id: i64,
        fragments: Vec<(NodeId, NodeId)>,
    ) -> std::result::Result<Self, TopologyError> {
        let mut open = fragments.clone();
        let Some((a, b)) = open.pop() else {
            return Err(TopologyError::InvalidTopology(format!(
                "traffic island {island_id} has no fragment"
            )));
        };
        let mut polygon = vec![a, b];
        let mut reversed = false;
        while !open.is_empty() {
            let end = polygon[polygon.len() - 1];
            match open.iter().position(|&(a, b)| a == end || b == end) {
                Some(i) => {
                    let (a, b) = open.remove(i);
                    polygon.push(if a == end { b } else { a });
                }
                None if !reversed => {
                    reversed = true;
                    polygon.reverse();
                }
                None => return Err(TopologyError::IslandNotChainable { island_id }),
            }
        }
        Ok(Self {
            island_id,
            polygon,
            fragments,
        })
    }

    /// True if the ring closes on its first node.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.polygon.len() > 2 && self.polygon.first() == self.polygon.last()
    }

    /// Distinct nodes of the ring.
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut seen = BTreeSet::new();
        self.polygon
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// True if a fragment has no counterpart in the graph.
    #[must_use]
    pub fn has_virtual_edge(&self, graph: &LabeledGraph) -> bool {
        self.fragments.iter().any(|&(a, b)| is_virtual(graph, a, b))
    }

    /// Border sections between consecutive crossing nodes around the ring.
    /// Without crossings the whole ring is a single section.
    #[must_use]
    pub fn sections(&self, crossings: &BTreeSet<NodeId>) -> Vec<Vec<NodeId>> {
        let mut ring = self.polygon.clone();
        if self.is_closed() {
            // Start the walk on a crossing so that no section wraps around.
            ring.pop();
            if let Some(start) = ring.iter().position(|id| crossings.contains(id)) {
                ring.rotate_left(start);
            }
            ring.push(ring[0]);
        }

        let mut sections = Vec::new();
        let mut current = Vec::new();
        for &id in &ring {
            current.push(id);
            if crossings.contains(&id) && current.len() > 1 {
                sections.push(std::mem::replace(&mut current, vec![id]));
            }
        }
        if current.len() > 1 {
            sections.push(current);
        }
        sections
    }
}

fn is_virtual(graph: &LabeledGraph, a: NodeId, b: NodeId) -> bool {
    graph.is_virtual_edge(a, b) || graph.edge(a, b).is_none()
}

/// Computes the schematic summary of traffic islands.
#[derive(Debug, Clone, Copy)]
pub struct GeneralizeIsland<'a> {
    crossings: &'a BTreeSet<NodeId>,
    road_buffer: &'a RoadBuffer,
    inner_ring: &'a [Point2],
    linearizer: Linearizer,
    virtual_edge_length: f64,
}

impl<'a> GeneralizeIsland<'a> {
    /// Creates a new `GeneralizeIsland` operation.
    ///
    /// Spokes stop on the boundary of `road_buffer` or on `inner_ring`. A
    /// section holding a virtual fragment longer than `virtual_edge_length`
    /// is split on that fragment instead of at its midpoint.
    #[must_use]
    pub fn new(
        crossings: &'a BTreeSet<NodeId>,
        road_buffer: &'a RoadBuffer,
        inner_ring: &'a [Point2],
        linearizer: Linearizer,
        virtual_edge_length: f64,
    ) -> Self {
        Self {
            crossings,
            road_buffer,
            inner_ring,
            linearizer,
            virtual_edge_length,
        }
    }

    /// Executes the generalization of one island.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NodeNotFound` if the ring names an unknown node.
    pub fn execute(&self, graph: &LabeledGraph, island: &TrafficIsland) -> Result<IslandGeneralization> {
        let nodes = island.nodes();
        let reachable: Vec<NodeId> = nodes
            .iter()
            .copied()
            .filter(|id| self.crossings.contains(id))
            .collect();
        let is_reachable = !reachable.is_empty();
        let anchors = if is_reachable { &reachable } else { &nodes };

        let center = centroid(&graph.points(anchors)?).ok_or_else(|| {
            TopologyError::InvalidTopology(format!("traffic island {} is empty", island.island_id))
        })?;
        let node_points = graph.points(&nodes)?;
        #[allow(clippy::cast_precision_loss)]
        let radius = node_points.iter().map(|p| (p - center).norm()).sum::<f64>()
            / node_points.len().max(1) as f64;

        let sections = island.sections(self.crossings);
        let is_linear =
            (is_reachable && sections.len() <= 2) || island.has_virtual_edge(graph);

        let mut extremities = Vec::new();
        if is_linear {
            for section in &sections {
                let points = graph.points(section)?;
                if length(&points) <= 2.0 * radius {
                    continue;
                }
                let split = self.split_distance(graph, section, &points);
                match self.spoke(&points, split, &center, radius) {
                    Some(p) => extremities.push(p),
                    None => tracing::debug!(
                        island_id = island.island_id,
                        "no spoke end found for an island section"
                    ),
                }
            }
        }

        Ok(IslandGeneralization {
            is_reachable,
            center,
            radius,
            is_linear,
            extremities,
        })
    }

    /// Arc length at which a section is cut in two: the middle of its longest
    /// virtual fragment above `virtual_edge_length`, or the section midpoint.
    fn split_distance(
        &self,
        graph: &LabeledGraph,
        section: &[NodeId],
        points: &[Point2],
    ) -> f64 {
        let mut walked = 0.0;
        let mut best: Option<(f64, f64)> = None;
        for (ids, w) in section.windows(2).zip(points.windows(2)) {
            let fragment = (w[1] - w[0]).norm();
            if fragment > self.virtual_edge_length
                && is_virtual(graph, ids[0], ids[1])
                && best.is_none_or(|(longest, _)| fragment > longest)
            {
                best = Some((fragment, walked + fragment / 2.0));
            }
            walked += fragment;
        }
        best.map_or(walked / 2.0, |(_, at)| at)
    }

    /// End of the spoke drawn from the center in the mean direction of both
    /// halves of a section split at arc length `split`, each walked from its
    /// end towards the split point.
    fn spoke(
        &self,
        section: &[Point2],
        split: f64,
        center: &Point2,
        radius: f64,
    ) -> Option<Point2> {
        let (head, mut tail) = split_at_length(section, split);
        tail.reverse();
        let direction = |half: &[Point2]| -> Option<Vector2> {
            let [a, b] = self.linearizer.execute(half).ok()?;
            normalize(&(b - a)).ok()
        };
        let dir = normalize(&(direction(&head)? + direction(&tail)?)).ok()?;

        let end = center + dir * SPOKE_LENGTH;
        let buffer_hits = self.road_buffer.boundary_crossings(center, &end);
        let ring_hits = segment_polyline_intersections(center, &end, self.inner_ring);
        let t = buffer_hits
            .iter()
            .chain(ring_hits.iter())
            .map(|(_, t)| *t)
            .filter(|t| *t > 0.0)
            .min_by(f64::total_cmp)?;
        Some(center + dir * (t * SPOKE_LENGTH - radius / 4.0))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::graph::{
        DescriptionEntry, DescriptionTable, EdgeTags, NodeData, NodeTags, RoadGraph,
    };
    use crate::math::polyline_2d::interpolate;

    fn square_fragments() -> Vec<(NodeId, NodeId)> {
        vec![(1, 2), (2, 3), (3, 4), (4, 1)]
    }

    fn is_square_loop(polygon: &[NodeId]) -> bool {
        let ring = &polygon[..4];
        let expected = [1, 2, 3, 4];
        (0..4).any(|r| {
            let forward = (0..4).all(|i| ring[(i + r) % 4] == expected[i]);
            let backward = (0..4).all(|i| ring[(r + 4 - i) % 4] == expected[i]);
            forward || backward
        })
    }

    #[test]
    fn square_from_shuffled_fragments() {
        // Every rotation and orientation pattern of the four fragments.
        let base = square_fragments();
        for order in [[0, 1, 2, 3], [2, 0, 3, 1], [3, 1, 0, 2], [1, 3, 2, 0]] {
            for flips in 0..16_u32 {
                let fragments: Vec<(NodeId, NodeId)> = order
                    .iter()
                    .enumerate()
                    .map(|(k, &i)| {
                        let (a, b) = base[i];
                        if flips & (1 << k) == 0 {
                            (a, b)
                        } else {
                            (b, a)
                        }
                    })
                    .collect();
                let island = TrafficIsland::build(9, fragments).unwrap();
                assert_eq!(island.polygon.len(), 5, "{:?}", island.polygon);
                assert_eq!(island.polygon[0], island.polygon[4]);
                assert!(is_square_loop(&island.polygon), "{:?}", island.polygon);
            }
        }
    }

    #[test]
    fn open_chain_is_reversed_once() {
        // The last fragment sits in the middle of the chain.
        let island = TrafficIsland::build(1, vec![(1, 2), (3, 4), (2, 3)]).unwrap();
        assert_eq!(island.polygon.len(), 4);
        assert!(!island.is_closed());
    }

    #[test]
    fn disjoint_fragments_fail() {
        let err = TrafficIsland::build(4, vec![(1, 2), (5, 6), (2, 3)]).unwrap_err();
        assert!(matches!(err, TopologyError::IslandNotChainable { island_id: 4 }));
    }

    #[test]
    fn sections_split_at_crossings() {
        let island = TrafficIsland::build(2, square_fragments()).unwrap();
        assert_eq!(island.sections(&BTreeSet::new()), [island.polygon.clone()]);

        let sections = island.sections(&BTreeSet::from([1, 3]));
        assert_eq!(sections.len(), 2);
        for section in &sections {
            assert_eq!(section.len(), 3);
            assert!([1, 3].contains(&section[0]));
            assert!([1, 3].contains(&section[2]));
        }
    }

    fn island_graph() -> (LabeledGraph, TrafficIsland) {
        let mut g = RoadGraph::new();
        let crossing = NodeTags {
            crossing: Some("marked".to_owned()),
            ..NodeTags::default()
        };
        g.add_node(NodeData::new(1, 0.0, 0.0).with_tags(crossing));
        g.add_node(NodeData::new(2, 20.0, 1.0));
        g.add_node(NodeData::new(3, 20.0, -1.0));
        g.add_edge(1, 2, EdgeTags::highway("footway")).unwrap();
        g.add_edge(2, 3, EdgeTags::highway("footway")).unwrap();
        g.add_edge(3, 1, EdgeTags::highway("footway")).unwrap();
        let table = DescriptionTable::from_entries([
            DescriptionEntry::edge(EntryKind::Way, 1, 2).islands(Some(8), None),
            DescriptionEntry::edge(EntryKind::Way, 2, 3).islands(Some(8), None),
            DescriptionEntry::edge(EntryKind::Way, 3, 1).islands(None, Some(8)),
        ])
        .unwrap();
        let g = g.label(&table);
        let mut fragments = TrafficIsland::collect_fragments(&g);
        let island = TrafficIsland::build(8, fragments.remove(&8).unwrap()).unwrap();
        (g, island)
    }

    #[test]
    fn reachable_island_centers_on_its_crossing() {
        let (g, island) = island_graph();
        assert!(island.is_closed());
        let crossings = BTreeSet::from([1]);
        let buffer = RoadBuffer::default();
        let op = GeneralizeIsland::new(&crossings, &buffer, &[], Linearizer::default(), 10.0);
        let shape = op.execute(&g, &island).unwrap();
        assert!(shape.is_reachable);
        assert!(shape.is_linear);
        assert_abs_diff_eq!(shape.center, Point2::new(0.0, 0.0), epsilon = 1e-12);
        let far = 401.0_f64.sqrt();
        assert_abs_diff_eq!(shape.radius, 2.0 * far / 3.0, epsilon = 1e-9);
        // No buffer nor inner ring to stop the spoke.
        assert!(shape.extremities.is_empty());
    }

    #[test]
    fn spoke_stops_on_the_inner_ring() {
        let (g, island) = island_graph();
        let crossings = BTreeSet::from([1]);
        let buffer = RoadBuffer::default();
        let ring = [
            Point2::new(30.0, -10.0),
            Point2::new(30.0, 10.0),
        ];
        let op = GeneralizeIsland::new(&crossings, &buffer, &ring, Linearizer::default(), 10.0);
        let shape = op.execute(&g, &island).unwrap();
        assert_eq!(shape.extremities.len(), 1);
        let tip = shape.extremities[0];
        assert_abs_diff_eq!(tip.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(tip.x, 30.0 - shape.radius / 4.0, epsilon = 1e-6);
    }

    #[test]
    fn unreachable_island_uses_all_nodes() {
        let (g, island) = island_graph();
        let crossings = BTreeSet::new();
        let buffer = RoadBuffer::default();
        let op = GeneralizeIsland::new(&crossings, &buffer, &[], Linearizer::default(), 10.0);
        let shape = op.execute(&g, &island).unwrap();
        assert!(!shape.is_reachable);
        assert!(!shape.is_linear);
        assert_abs_diff_eq!(shape.center.x, 40.0 / 3.0, epsilon = 1e-9);
    }

    /// Island 9: a long spike whose edge 1 → 2 traces the branch's medial
    /// axis and is missing from the graph.
    fn virtual_island_graph() -> (LabeledGraph, TrafficIsland) {
        let mut g = RoadGraph::new();
        g.add_node(NodeData::new(1, 0.0, 0.0));
        g.add_node(NodeData::new(2, 30.0, 0.0));
        g.add_node(NodeData::new(3, 2.0, -2.0));
        g.add_edge(2, 3, EdgeTags::highway("footway")).unwrap();
        g.add_edge(3, 1, EdgeTags::highway("footway")).unwrap();
        let table = DescriptionTable::from_entries([
            DescriptionEntry::edge(EntryKind::Way, 1, 2).islands(None, Some(9)),
            DescriptionEntry::edge(EntryKind::Way, 2, 3).islands(None, Some(9)),
            DescriptionEntry::edge(EntryKind::Way, 3, 1).islands(None, Some(9)),
        ])
        .unwrap();
        let g = g.label(&table);
        let mut fragments = TrafficIsland::collect_fragments(&g);
        let island = TrafficIsland::build(9, fragments.remove(&9).unwrap()).unwrap();
        (g, island)
    }

    #[test]
    fn virtual_fragment_makes_an_unreachable_island_linear() {
        let (g, island) = virtual_island_graph();
        assert!(island.has_virtual_edge(&g));
        let crossings = BTreeSet::new();
        let buffer = RoadBuffer::default();
        let op = GeneralizeIsland::new(&crossings, &buffer, &[], Linearizer::default(), 10.0);
        let shape = op.execute(&g, &island).unwrap();
        assert!(!shape.is_reachable);
        assert!(shape.is_linear);

        // An island drawn with real edges only.
        let (g, island) = island_graph();
        assert!(!island.has_virtual_edge(&g));
    }

    #[test]
    fn long_virtual_fragment_moves_the_split() {
        let (g, island) = virtual_island_graph();
        let crossings = BTreeSet::from([1]);
        let buffer = RoadBuffer::default();
        let sections = island.sections(&crossings);
        assert_eq!(sections.len(), 1);
        let section = &sections[0];
        let points = g.points(section).unwrap();

        let op = GeneralizeIsland::new(&crossings, &buffer, &[], Linearizer::default(), 10.0);
        let at = op.split_distance(&g, section, &points);
        assert_abs_diff_eq!(
            interpolate(&points, at).unwrap(),
            Point2::new(15.0, 0.0),
            epsilon = 1e-9
        );

        // The fragment is shorter than the threshold: plain midpoint.
        let op = GeneralizeIsland::new(&crossings, &buffer, &[], Linearizer::default(), 40.0);
        let at = op.split_distance(&g, section, &points);
        assert_abs_diff_eq!(at, length(&points) / 2.0, epsilon = 1e-9);

        // Real fragments never move the split.
        let (g, island) = island_graph();
        let section = &island.sections(&crossings)[0];
        let points = g.points(section).unwrap();
        let op = GeneralizeIsland::new(&crossings, &buffer, &[], Linearizer::default(), 1.0);
        let at = op.split_distance(&g, section, &points);
        assert_abs_diff_eq!(at, length(&points) / 2.0, epsilon = 1e-9);
    }
}
