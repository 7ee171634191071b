use serde::{Deserialize, Serialize};

use crate::math::Point2;

/// External (map data) identifier of a graph node.
pub type NodeId = i64;

slotmap::new_key_type! {
    /// Arena key of a node in the road graph.
    pub struct NodeKey;
}

/// Tags carried by a road graph node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeTags {
    pub highway: Option<String>,
    pub crossing: Option<String>,
    pub kerb: Option<String>,
    pub traffic_signals: Option<String>,
    pub tactile_paving: Option<String>,
    pub crossing_island: Option<String>,
}

impl NodeTags {
    /// True when the node is tagged as a pedestrian crossing (`crossing` set
    /// to anything but `no`).
    #[must_use]
    pub fn is_crossing(&self) -> bool {
        self.crossing.as_deref().is_some_and(|c| c != "no")
    }
}

/// Data associated with a road graph node.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// External identifier.
    pub id: NodeId,
    /// Planar position (projected, metric coordinates).
    pub point: Point2,
    pub tags: NodeTags,
}

impl NodeData {
    /// Creates an untagged node.
    #[must_use]
    pub fn new(id: NodeId, x: f64, y: f64) -> Self {
        Self {
            id,
            point: Point2::new(x, y),
            tags: NodeTags::default(),
        }
    }

    /// Sets the node tags.
    #[must_use]
    pub fn with_tags(mut self, tags: NodeTags) -> Self {
        self.tags = tags;
        self
    }
}
