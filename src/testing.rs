//! Synthetic crossroads shared by the tests.

#![allow(clippy::unwrap_used)]

use crate::graph::{
    DescriptionEntry, DescriptionTable, EdgeTags, EntryKind, NodeData, NodeId, NodeTags, RoadGraph,
};
use crate::model::TurningSidewalk;
use crate::pipeline::CrossroadSchematization;

/// Graph and description rows of a crossroad, rebuilt on demand since the
/// pipeline consumes its graph.
pub(crate) struct CrossroadFixture {
    nodes: Vec<NodeData>,
    edges: Vec<(NodeId, NodeId, EdgeTags)>,
    entries: Vec<DescriptionEntry>,
    table: DescriptionTable,
}

impl CrossroadFixture {
    fn new(
        nodes: Vec<NodeData>,
        edges: Vec<(NodeId, NodeId, EdgeTags)>,
        entries: Vec<DescriptionEntry>,
    ) -> Self {
        let table = DescriptionTable::from_entries(entries.clone()).unwrap();
        Self {
            nodes,
            edges,
            entries,
            table,
        }
    }

    pub(crate) fn graph(&self) -> RoadGraph {
        let mut g = RoadGraph::new();
        for node in &self.nodes {
            g.add_node(node.clone());
        }
        for (from, to, tags) in &self.edges {
            g.add_edge(*from, *to, tags.clone()).unwrap();
        }
        g
    }

    pub(crate) fn table(&self) -> &DescriptionTable {
        &self.table
    }

    /// Turning sidewalks of the default pipeline, by sidewalk id.
    pub(crate) fn turning_sidewalks(&self) -> Vec<TurningSidewalk> {
        CrossroadSchematization::default()
            .execute(self.graph(), &self.table)
            .unwrap()
            .sidewalks
    }

    /// Adds traffic island 7: a triangle east of the centre drawn by rows
    /// that name no graph edge, touching crossing node 1.
    pub(crate) fn with_island(mut self) -> Self {
        self.nodes.push(NodeData::new(11, 40.0, 2.0));
        self.nodes.push(NodeData::new(12, 40.0, -2.0));
        self.entries.extend([
            DescriptionEntry::edge(EntryKind::Way, 1, 11).islands(Some(7), None),
            DescriptionEntry::edge(EntryKind::Way, 11, 12).islands(Some(7), None),
            DescriptionEntry::edge(EntryKind::Way, 12, 1).islands(None, Some(7)),
        ]);
        Self::new(self.nodes, self.edges, self.entries)
    }

    /// Drops the description row stored under `key`.
    pub(crate) fn without_branch(mut self, key: &str) -> Self {
        self.entries.retain(|e| e.id != key);
        Self::new(self.nodes, self.edges, self.entries)
    }
}

/// Four-branch crossroad centred on node 0.
///
/// "Avenue" runs east (1, 5) and west (2, 6), "Boulevard" north (3, 7) and
/// south (4, 8); nodes 1 and 3 are zebra crossings 20 units from the centre.
/// Sidewalks 1 to 4 turn around the north-east, north-west, south-west and
/// south-east corners.
pub(crate) fn crossroad_fixture() -> CrossroadFixture {
    let zebra = NodeTags {
        crossing: Some("zebra".to_owned()),
        ..NodeTags::default()
    };
    let nodes = vec![
        NodeData::new(0, 0.0, 0.0),
        NodeData::new(1, 20.0, 0.0).with_tags(zebra.clone()),
        NodeData::new(2, -20.0, 0.0),
        NodeData::new(3, 0.0, 20.0).with_tags(zebra),
        NodeData::new(4, 0.0, -20.0),
        NodeData::new(5, 60.0, 0.0),
        NodeData::new(6, -60.0, 0.0),
        NodeData::new(7, 0.0, 60.0),
        NodeData::new(8, 0.0, -60.0),
    ];

    let avenue = EdgeTags::highway("residential").named("Avenue");
    let boulevard = EdgeTags::highway("residential").named("Boulevard");
    let edges = vec![
        (0, 1, avenue.clone()),
        (1, 5, avenue.clone()),
        (0, 2, avenue.clone()),
        (2, 6, avenue),
        (0, 3, boulevard.clone()),
        (3, 7, boulevard.clone()),
        (0, 4, boulevard.clone()),
        (4, 8, boulevard),
    ];

    let entries = vec![
        DescriptionEntry::edge(EntryKind::Branch, 0, 1)
            .named("east")
            .sidewalks(Some(1), Some(4)),
        DescriptionEntry::edge(EntryKind::Branch, 0, 3)
            .named("north")
            .sidewalks(Some(2), Some(1)),
        DescriptionEntry::edge(EntryKind::Branch, 0, 2)
            .named("west")
            .sidewalks(Some(3), Some(2)),
        DescriptionEntry::edge(EntryKind::Branch, 0, 4)
            .named("south")
            .sidewalks(Some(4), Some(3)),
    ];

    CrossroadFixture::new(nodes, edges, entries)
}
