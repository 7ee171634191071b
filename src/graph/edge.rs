use serde::{Deserialize, Serialize};

use super::node::NodeKey;

slotmap::new_key_type! {
    /// Arena key of an edge in the road graph.
    pub struct EdgeKey;
}

/// Highway classes open to motor traffic.
const ROADWAY_CLASSES: [&str; 9] = [
    "motorway",
    "trunk",
    "primary",
    "secondary",
    "tertiary",
    "unclassified",
    "residential",
    "service",
    "living_street",
];

/// Tags carried by a road graph edge.
///
/// `width` is kept as the raw tag value: only values parsing as a decimal
/// number are honoured by the width evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeTags {
    pub highway: Option<String>,
    pub name: Option<String>,
    pub lanes: Option<u32>,
    pub width: Option<String>,
    pub oneway: bool,
    pub cycleway: Option<String>,
    pub cycleway_left: Option<String>,
    pub cycleway_right: Option<String>,
}

impl EdgeTags {
    /// Creates tags for the given highway class.
    #[must_use]
    pub fn highway(class: &str) -> Self {
        Self {
            highway: Some(class.to_owned()),
            ..Self::default()
        }
    }

    /// Sets the street name.
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    /// True for edges open to motor traffic (including `_link` variants).
    #[must_use]
    pub fn is_roadway(&self) -> bool {
        self.highway.as_deref().is_some_and(|h| {
            let base = h.strip_suffix("_link").unwrap_or(h);
            ROADWAY_CLASSES.contains(&base)
        })
    }

    /// True for dedicated pedestrian edges.
    #[must_use]
    pub fn is_footway(&self) -> bool {
        self.highway.as_deref() == Some("footway")
    }

    /// True if a physically separated cycle track runs along the edge.
    #[must_use]
    pub fn has_cycle_track(&self) -> bool {
        [&self.cycleway, &self.cycleway_left, &self.cycleway_right]
            .iter()
            .any(|c| c.as_deref() == Some("track"))
    }

    /// True if a painted cycle lane runs on either side of the edge.
    #[must_use]
    pub fn has_cycle_lane(&self) -> bool {
        [&self.cycleway_left, &self.cycleway_right]
            .iter()
            .any(|c| c.as_deref() == Some("lane"))
    }
}

/// Data associated with an undirected road graph edge.
///
/// `from` and `to` record the storage orientation only.
#[derive(Debug, Clone)]
pub struct EdgeData {
    pub from: NodeKey,
    pub to: NodeKey,
    pub tags: EdgeTags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roadway_classification() {
        assert!(EdgeTags::highway("primary").is_roadway());
        assert!(EdgeTags::highway("primary_link").is_roadway());
        assert!(EdgeTags::highway("living_street").is_roadway());
        assert!(!EdgeTags::highway("footway").is_roadway());
        assert!(EdgeTags::highway("footway").is_footway());
        assert!(!EdgeTags::default().is_roadway());
    }

    #[test]
    fn cycleway_detection() {
        let mut tags = EdgeTags::highway("secondary");
        assert!(!tags.has_cycle_track() && !tags.has_cycle_lane());
        tags.cycleway = Some("track".to_owned());
        assert!(tags.has_cycle_track());
        tags.cycleway = Some("lane".to_owned());
        assert!(!tags.has_cycle_lane(), "bare cycleway=lane is not sided");
        tags.cycleway_right = Some("lane".to_owned());
        assert!(tags.has_cycle_lane());
    }
}
