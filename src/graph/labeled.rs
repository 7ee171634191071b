//! Read-only road graph view carrying the labels of the description table.

use std::collections::BTreeSet;

use slotmap::SecondaryMap;

use super::description::{DescriptionEntry, DescriptionKey, DescriptionTable, EntryKind};
use super::edge::{EdgeData, EdgeKey};
use super::node::{NodeData, NodeId};
use super::RoadGraph;
use crate::error::TopologyError;
use crate::math::Point2;

/// Role of an edge inside the crossroad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EdgeKind {
    /// Not described: free for branch extension.
    #[default]
    Unknown,
    Branch,
    Way,
}

impl From<EntryKind> for EdgeKind {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Branch => Self::Branch,
            EntryKind::Way => Self::Way,
            EntryKind::Other => Self::Unknown,
        }
    }
}

/// Label attached to an edge after reading the description table.
///
/// Sidewalk ids are expressed in the edge's storage orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeLabel {
    pub kind: EdgeKind,
    pub left_sidewalk: Option<i64>,
    pub right_sidewalk: Option<i64>,
}

impl EdgeLabel {
    fn from_entry(entry: &DescriptionEntry, same_orientation: bool) -> Self {
        let (left_sidewalk, right_sidewalk) = if same_orientation {
            (entry.left_sidewalk, entry.right_sidewalk)
        } else {
            (entry.right_sidewalk, entry.left_sidewalk)
        };
        Self {
            kind: entry.kind.into(),
            left_sidewalk,
            right_sidewalk,
        }
    }

    /// True if a sidewalk with this id borders the edge on either side.
    #[must_use]
    pub fn borders_sidewalk(&self, sidewalk_id: i64) -> bool {
        self.left_sidewalk == Some(sidewalk_id) || self.right_sidewalk == Some(sidewalk_id)
    }
}

/// Immutable road graph with edge labels, produced by [`RoadGraph::label`].
#[derive(Debug)]
pub struct LabeledGraph {
    graph: RoadGraph,
    table: DescriptionTable,
    labels: SecondaryMap<EdgeKey, EdgeLabel>,
    input_nodes: BTreeSet<NodeId>,
    virtual_edges: BTreeSet<(NodeId, NodeId)>,
}

impl RoadGraph {
    /// Consumes the graph and labels it from the description table.
    ///
    /// `branch` and `way` rows mark their edge and both endpoints as input
    /// elements; rows naming an edge absent from the graph are kept as
    /// virtual edges. Node rows mark their node as input.
    #[must_use]
    pub fn label(self, table: &DescriptionTable) -> LabeledGraph {
        let mut labels = SecondaryMap::new();
        let mut input_nodes = BTreeSet::new();
        let mut virtual_edges = BTreeSet::new();

        for (key, entry) in table.iter() {
            match key {
                DescriptionKey::Node(id) => {
                    if self.node(id).is_ok() {
                        input_nodes.insert(id);
                    }
                }
                DescriptionKey::Edge(a, b) => {
                    if !matches!(entry.kind, EntryKind::Branch | EntryKind::Way) {
                        continue;
                    }
                    let Some(edge_key) = self.edge_key(a, b) else {
                        tracing::debug!(%key, "description row names no graph edge, kept as virtual");
                        virtual_edges.insert((a.min(b), a.max(b)));
                        continue;
                    };
                    let (from, _) = self.endpoints(&self.edges[edge_key]);
                    labels.insert(edge_key, EdgeLabel::from_entry(entry, from == a));
                    input_nodes.insert(a);
                    input_nodes.insert(b);
                }
            }
        }

        tracing::info!(
            labeled_edges = labels.len(),
            virtual_edges = virtual_edges.len(),
            input_nodes = input_nodes.len(),
            "road graph labeled"
        );

        LabeledGraph {
            graph: self,
            table: table.clone(),
            labels,
            input_nodes,
            virtual_edges,
        }
    }
}

impl LabeledGraph {
    /// The underlying road graph.
    #[must_use]
    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    /// The description table the labels were read from.
    #[must_use]
    pub fn table(&self) -> &DescriptionTable {
        &self.table
    }

    /// # Errors
    ///
    /// Returns `TopologyError::NodeNotFound` if the id is unknown.
    pub fn node(&self, id: NodeId) -> Result<&NodeData, TopologyError> {
        self.graph.node(id)
    }

    /// Position of a node.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NodeNotFound` if the id is unknown.
    pub fn point(&self, id: NodeId) -> Result<Point2, TopologyError> {
        self.graph.node(id).map(|n| n.point)
    }

    /// Positions of a node path.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NodeNotFound` for the first unknown id.
    pub fn points(&self, path: &[NodeId]) -> Result<Vec<Point2>, TopologyError> {
        path.iter().map(|&id| self.point(id)).collect()
    }

    /// Neighbour ids of a node, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NodeNotFound` if the id is unknown.
    pub fn neighbors(&self, id: NodeId) -> Result<Vec<NodeId>, TopologyError> {
        Ok(self.graph.neighbors(id)?.into_iter().map(|(n, _)| n).collect())
    }

    /// Neighbours of a node together with the joining edge.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NodeNotFound` if the id is unknown.
    pub fn neighbor_edges(&self, id: NodeId) -> Result<Vec<(NodeId, &EdgeData)>, TopologyError> {
        self.graph.neighbors(id)
    }

    /// Number of neighbours of a node (0 for unknown nodes).
    #[must_use]
    pub fn degree(&self, id: NodeId) -> usize {
        self.graph.neighbors(id).map_or(0, |n| n.len())
    }

    /// The edge between two nodes, in either orientation.
    #[must_use]
    pub fn edge(&self, a: NodeId, b: NodeId) -> Option<&EdgeData> {
        self.graph.edge_between(a, b)
    }

    /// The edge between two nodes.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::EdgeNotFound` if the nodes are not adjacent.
    pub fn require_edge(&self, a: NodeId, b: NodeId) -> Result<&EdgeData, TopologyError> {
        self.edge(a, b)
            .ok_or(TopologyError::EdgeNotFound { from: a, to: b })
    }

    /// Label of the edge between two nodes, with sidewalk ids expressed in
    /// the `a → b` orientation. Unlabeled edges get the default label.
    #[must_use]
    pub fn edge_label(&self, a: NodeId, b: NodeId) -> Option<EdgeLabel> {
        let key = self.graph.edge_key(a, b)?;
        let label = self.labels.get(key).copied().unwrap_or_default();
        let (from, _) = self.graph.endpoints(&self.graph.edges[key]);
        if from == a {
            Some(label)
        } else {
            Some(EdgeLabel {
                left_sidewalk: label.right_sidewalk,
                right_sidewalk: label.left_sidewalk,
                ..label
            })
        }
    }

    /// Kind of the edge between two nodes, `None` if they are not adjacent.
    #[must_use]
    pub fn edge_kind(&self, a: NodeId, b: NodeId) -> Option<EdgeKind> {
        self.edge_label(a, b).map(|l| l.kind)
    }

    /// Description row of the edge `a → b` in either orientation, with a
    /// flag telling whether the row is stored as `a;b`.
    #[must_use]
    pub fn description(&self, a: NodeId, b: NodeId) -> Option<(&DescriptionEntry, bool)> {
        self.table.edge(a, b)
    }

    /// True if the node belongs to a described element.
    #[must_use]
    pub fn is_input_node(&self, id: NodeId) -> bool {
        self.input_nodes.contains(&id)
    }

    /// True if the described edge has no counterpart in the graph.
    #[must_use]
    pub fn is_virtual_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.virtual_edges.contains(&(a.min(b), a.max(b)))
    }

    /// True if the edge between two nodes is open to motor traffic.
    #[must_use]
    pub fn is_roadway(&self, a: NodeId, b: NodeId) -> bool {
        self.edge(a, b).is_some_and(|e| e.tags.is_roadway())
    }

    /// True if the edge between two nodes is a footway.
    #[must_use]
    pub fn is_footway(&self, a: NodeId, b: NodeId) -> bool {
        self.edge(a, b).is_some_and(|e| e.tags.is_footway())
    }

    /// True for a node tagged as a pedestrian crossing with at least one
    /// neighbour.
    #[must_use]
    pub fn is_crossing(&self, id: NodeId) -> bool {
        self.graph
            .node(id)
            .is_ok_and(|n| n.tags.is_crossing())
            && self.degree(id) > 0
    }

    /// Input `branch` edges in the stored orientation of their description
    /// row, sorted by `(min, max)` node pair.
    #[must_use]
    pub fn branch_edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges: Vec<(NodeId, NodeId)> = self
            .table
            .iter()
            .filter(|(_, entry)| entry.kind == EntryKind::Branch)
            .filter_map(|(key, _)| match key {
                DescriptionKey::Edge(a, b) if self.edge(a, b).is_some() => Some((a, b)),
                _ => None,
            })
            .collect();
        edges.sort_by_key(|&(a, b)| (a.min(b), a.max(b)));
        edges.dedup_by_key(|&mut (a, b)| (a.min(b), a.max(b)));
        edges
    }

    /// Roadway edges as node-id pairs in storage orientation.
    #[must_use]
    pub fn roadway_edges(&self) -> Vec<(NodeId, NodeId, &EdgeData)> {
        self.graph
            .edges()
            .filter(|(_, e)| e.tags.is_roadway())
            .map(|(_, e)| {
                let (a, b) = self.graph.endpoints(e);
                (a, b, e)
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::graph::{EdgeTags, NodeData, NodeTags};

    fn graph() -> RoadGraph {
        let mut g = RoadGraph::new();
        g.add_node(NodeData::new(1, 0.0, 0.0));
        g.add_node(NodeData::new(2, 10.0, 0.0));
        g.add_node(NodeData::new(3, 20.0, 0.0));
        g.add_node(NodeData::new(4, 10.0, 10.0).with_tags(NodeTags {
            crossing: Some("zebra".to_owned()),
            ..NodeTags::default()
        }));
        g.add_edge(1, 2, EdgeTags::highway("primary").named("Main")).unwrap();
        g.add_edge(2, 3, EdgeTags::highway("primary").named("Main")).unwrap();
        g.add_edge(2, 4, EdgeTags::highway("footway")).unwrap();
        g
    }

    fn table() -> DescriptionTable {
        DescriptionTable::from_entries([
            DescriptionEntry::edge(EntryKind::Branch, 2, 1)
                .named("Main")
                .sidewalks(Some(7), None)
                .islands(None, Some(3)),
            DescriptionEntry::edge(EntryKind::Way, 3, 9),
        ])
        .unwrap()
    }

    #[test]
    fn labels_follow_orientation() {
        let lg = graph().label(&table());
        let forward = lg.edge_label(2, 1).unwrap();
        assert_eq!(forward.kind, EdgeKind::Branch);
        assert_eq!(forward.left_sidewalk, Some(7));
        assert!(forward.borders_sidewalk(7));

        let backward = lg.edge_label(1, 2).unwrap();
        assert_eq!(backward.right_sidewalk, Some(7));
        assert_eq!(backward.left_sidewalk, None);
        assert!(!lg.edge_label(2, 3).unwrap().borders_sidewalk(7));
        assert_eq!(lg.edge_kind(2, 3), Some(EdgeKind::Unknown));
        assert!(lg.edge_kind(1, 3).is_none());
    }

    #[test]
    fn input_nodes_and_virtual_edges() {
        let lg = graph().label(&table());
        assert!(lg.is_input_node(1) && lg.is_input_node(2));
        assert!(!lg.is_input_node(3));
        assert!(lg.is_virtual_edge(9, 3));
        assert!(!lg.is_virtual_edge(1, 2));
        assert_eq!(lg.branch_edges(), vec![(2, 1)]);
    }

    #[test]
    fn crossing_and_classification() {
        let lg = graph().label(&table());
        assert!(lg.is_crossing(4));
        assert!(!lg.is_crossing(2));
        assert!(lg.is_footway(4, 2));
        assert!(lg.is_roadway(3, 2));
        assert_eq!(lg.roadway_edges().len(), 2);
    }
}
