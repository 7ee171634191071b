pub mod description;
pub mod edge;
pub mod labeled;
pub mod node;

pub use description::{DescriptionEntry, DescriptionKey, DescriptionTable, EntryKind};
pub use edge::{EdgeData, EdgeKey, EdgeTags};
pub use labeled::{EdgeKind, EdgeLabel, LabeledGraph};
pub use node::{NodeData, NodeId, NodeKey, NodeTags};

use std::collections::HashMap;

use serde::Deserialize;
use slotmap::{SecondaryMap, SlotMap};

use crate::error::{InputError, Result, TopologyError};

/// Arena that owns the nodes and undirected edges of the road network.
///
/// Nodes are addressed by their external [`NodeId`]; arena keys stay
/// internal to the graph module.
#[derive(Debug, Default)]
pub struct RoadGraph {
    nodes: SlotMap<NodeKey, NodeData>,
    edges: SlotMap<EdgeKey, EdgeData>,
    index: HashMap<NodeId, NodeKey>,
    adjacency: SecondaryMap<NodeKey, Vec<(NodeKey, EdgeKey)>>,
}

/// Serialized form of a road graph, as produced by the graph loader.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawRoadGraph {
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
}

/// Serialized node record.
#[derive(Debug, Deserialize)]
pub struct RawNode {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub tags: NodeTags,
}

/// Serialized edge record.
#[derive(Debug, Deserialize)]
pub struct RawEdge {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(default)]
    pub tags: EdgeTags,
}

impl RoadGraph {
    /// Creates a new, empty road graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from its serialized records.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NodeNotFound` if an edge references an unknown node.
    pub fn from_raw(raw: RawRoadGraph) -> Result<Self> {
        let mut graph = Self::new();
        for node in raw.nodes {
            graph.add_node(NodeData::new(node.id, node.x, node.y).with_tags(node.tags));
        }
        for edge in raw.edges {
            graph.add_edge(edge.from, edge.to, edge.tags)?;
        }
        Ok(graph)
    }

    /// Parses a graph from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an input error for malformed JSON, or a topology error for
    /// dangling edges.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawRoadGraph = serde_json::from_str(text).map_err(InputError::from)?;
        Self::from_raw(raw)
    }

    // --- Node operations ---

    /// Inserts a node and returns its key. Re-inserting a known id replaces
    /// its position and tags.
    pub fn add_node(&mut self, data: NodeData) -> NodeKey {
        if let Some(&key) = self.index.get(&data.id) {
            self.nodes[key] = data;
            return key;
        }
        let id = data.id;
        let key = self.nodes.insert(data);
        self.index.insert(id, key);
        self.adjacency.insert(key, Vec::new());
        key
    }

    /// Returns the node with the given external id.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NodeNotFound` if the id is unknown.
    pub fn node(&self, id: NodeId) -> std::result::Result<&NodeData, TopologyError> {
        self.key(id).map(|key| &self.nodes[key])
    }

    fn key(&self, id: NodeId) -> std::result::Result<NodeKey, TopologyError> {
        self.index
            .get(&id)
            .copied()
            .ok_or(TopologyError::NodeNotFound(id))
    }

    /// Iterates over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeData> {
        self.nodes.values()
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // --- Edge operations ---

    /// Inserts an undirected edge between two known nodes.
    ///
    /// A second edge between the same pair is ignored and the existing key
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NodeNotFound` if either endpoint is unknown.
    pub fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        tags: EdgeTags,
    ) -> std::result::Result<EdgeKey, TopologyError> {
        let a = self.key(from)?;
        let b = self.key(to)?;
        if let Some(existing) = self.edge_key(from, to) {
            tracing::debug!(from, to, "duplicate edge ignored");
            return Ok(existing);
        }
        let key = self.edges.insert(EdgeData { from: a, to: b, tags });
        if let Some(adj) = self.adjacency.get_mut(a) {
            adj.push((b, key));
        }
        if let Some(adj) = self.adjacency.get_mut(b) {
            adj.push((a, key));
        }
        Ok(key)
    }

    /// Key of the edge joining two nodes, in either orientation.
    #[must_use]
    pub fn edge_key(&self, a: NodeId, b: NodeId) -> Option<EdgeKey> {
        let ka = self.key(a).ok()?;
        let kb = self.key(b).ok()?;
        self.adjacency
            .get(ka)?
            .iter()
            .find(|(n, _)| *n == kb)
            .map(|(_, e)| *e)
    }

    /// The edge joining two nodes, in either orientation.
    #[must_use]
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<&EdgeData> {
        self.edge_key(a, b).map(|key| &self.edges[key])
    }

    /// External ids of the storage endpoints of an edge.
    #[must_use]
    pub fn endpoints(&self, edge: &EdgeData) -> (NodeId, NodeId) {
        (self.nodes[edge.from].id, self.nodes[edge.to].id)
    }

    /// Iterates over all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &EdgeData)> {
        self.edges.iter()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Neighbours of a node with the joining edge, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NodeNotFound` if the id is unknown.
    pub fn neighbors(
        &self,
        id: NodeId,
    ) -> std::result::Result<Vec<(NodeId, &EdgeData)>, TopologyError> {
        let key = self.key(id)?;
        Ok(self
            .adjacency
            .get(key)
            .map(|adj| {
                adj.iter()
                    .map(|(n, e)| (self.nodes[*n].id, &self.edges[*e]))
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn triangle() -> RoadGraph {
        let mut g = RoadGraph::new();
        g.add_node(NodeData::new(1, 0.0, 0.0));
        g.add_node(NodeData::new(2, 10.0, 0.0));
        g.add_node(NodeData::new(3, 0.0, 10.0));
        g.add_edge(1, 2, EdgeTags::highway("primary")).unwrap();
        g.add_edge(2, 3, EdgeTags::highway("footway")).unwrap();
        g.add_edge(3, 1, EdgeTags::highway("residential")).unwrap();
        g
    }

    #[test]
    fn edges_are_undirected() {
        let g = triangle();
        assert!(g.edge_between(1, 2).is_some());
        assert!(g.edge_between(2, 1).is_some());
        assert_eq!(g.edge_key(1, 2), g.edge_key(2, 1));
        let edge = g.edge_between(2, 1).unwrap();
        assert_eq!(g.endpoints(edge), (1, 2));
    }

    #[test]
    fn duplicate_edge_is_ignored() {
        let mut g = triangle();
        let first = g.edge_key(1, 2).unwrap();
        let again = g.add_edge(2, 1, EdgeTags::default()).unwrap();
        assert_eq!(first, again);
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn unknown_node_is_reported() {
        let mut g = triangle();
        assert!(matches!(
            g.add_edge(1, 99, EdgeTags::default()),
            Err(TopologyError::NodeNotFound(99))
        ));
        assert!(g.node(42).is_err());
    }

    #[test]
    fn neighbors_in_insertion_order() {
        let g = triangle();
        let ids: Vec<NodeId> = g.neighbors(1).unwrap().iter().map(|(n, _)| *n).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn parse_from_json() {
        let text = r#"{
            "nodes": [
                {"id": 1, "x": 0.0, "y": 0.0, "tags": {"crossing": "zebra"}},
                {"id": 2, "x": 5.0, "y": 0.0}
            ],
            "edges": [
                {"from": 1, "to": 2, "tags": {"highway": "primary", "lanes": 3, "name": "Main"}}
            ]
        }"#;
        let g = RoadGraph::from_json(text).unwrap();
        assert_eq!(g.node_count(), 2);
        assert!(g.node(1).unwrap().tags.is_crossing());
        let tags = &g.edge_between(1, 2).unwrap().tags;
        assert_eq!(tags.lanes, Some(3));
        assert_eq!(tags.name.as_deref(), Some("Main"));
    }
}
