use crate::error::{Result, TopologyError};
use crate::graph::{DescriptionEntry, DescriptionKey, LabeledGraph, NodeId};
use crate::math::Point2;
use crate::operations::{evaluate_width_way, Linearizer};

/// One side of a branch: the extended street path of a branch edge and its
/// straight approximation.
#[derive(Debug, Clone)]
pub struct StraightWay {
    polybranch: Vec<NodeId>,
    edge: [Point2; 2],
    description: Option<DescriptionEntry>,
    same_orientation: bool,
    is_crossing_interior_node: bool,
}

impl StraightWay {
    /// Builds a way from a node path starting at its interior node.
    ///
    /// # Errors
    ///
    /// Returns a topology error if the path is shorter than one edge or
    /// names unknown nodes, or a geometry error if it cannot be linearized.
    pub fn build(
        graph: &LabeledGraph,
        polybranch: Vec<NodeId>,
        linearizer: &Linearizer,
    ) -> Result<Self> {
        let (interior, exterior) = match polybranch.as_slice() {
            [a, b, ..] => (*a, *b),
            _ => {
                return Err(TopologyError::InvalidTopology(format!(
                    "branch path {polybranch:?} has no edge"
                ))
                .into())
            }
        };
        let points = graph.points(&polybranch)?;
        let edge = linearizer.execute(&points)?;
        let same_orientation = graph
            .table()
            .get(DescriptionKey::Edge(interior, exterior))
            .is_some();
        let description = graph.description(interior, exterior).map(|(e, _)| e.clone());

        Ok(Self {
            polybranch,
            edge,
            description,
            same_orientation,
            is_crossing_interior_node: graph.is_crossing(interior),
        })
    }

    /// Node path from the interior node outwards.
    #[must_use]
    pub fn polybranch(&self) -> &[NodeId] {
        &self.polybranch
    }

    #[must_use]
    pub fn interior_node(&self) -> NodeId {
        self.polybranch[0]
    }

    #[must_use]
    pub fn exterior_node(&self) -> NodeId {
        self.polybranch[1]
    }

    /// Straight approximation starting at the interior node.
    #[must_use]
    pub fn edge(&self) -> [Point2; 2] {
        self.edge
    }

    #[must_use]
    pub fn description(&self) -> Option<&DescriptionEntry> {
        self.description.as_ref()
    }

    /// True if the description row is stored interior-first.
    #[must_use]
    pub fn same_orientation(&self) -> bool {
        self.same_orientation
    }

    #[must_use]
    pub fn is_crossing_interior_node(&self) -> bool {
        self.is_crossing_interior_node
    }

    /// Key of the initial edge in the interior → exterior orientation.
    #[must_use]
    pub fn initial_edge_id(&self) -> DescriptionKey {
        DescriptionKey::Edge(self.interior_node(), self.exterior_node())
    }

    /// Positions of the initial (un-extended) edge.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NodeNotFound` if a node is unknown.
    pub fn initial_edge(&self, graph: &LabeledGraph) -> Result<[Point2; 2]> {
        Ok([
            graph.point(self.interior_node())?,
            graph.point(self.exterior_node())?,
        ])
    }

    /// Carriageway width of the initial edge.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::EdgeNotFound` if the initial edge is missing.
    pub fn evaluate_width(&self, graph: &LabeledGraph) -> Result<f64> {
        let edge = graph.require_edge(self.interior_node(), self.exterior_node())?;
        Ok(evaluate_width_way(&edge.tags))
    }

    /// Street name from the description row.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.description.as_ref().and_then(|d| d.name.as_deref())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::graph::{DescriptionTable, EdgeTags, EntryKind, NodeData, RoadGraph};

    fn graph(row: DescriptionEntry) -> LabeledGraph {
        let mut g = RoadGraph::new();
        g.add_node(NodeData::new(1, 0.0, 0.0));
        g.add_node(NodeData::new(2, 10.0, 0.0));
        g.add_edge(1, 2, EdgeTags::highway("motorway").named("A")).unwrap();
        g.label(&DescriptionTable::from_entries([row]).unwrap())
    }

    #[test]
    fn orientation_follows_description_row() {
        let g = graph(DescriptionEntry::edge(EntryKind::Branch, 1, 2).named("A"));
        let way = StraightWay::build(&g, vec![1, 2], &Linearizer::default()).unwrap();
        assert!(way.same_orientation());
        assert_eq!(way.initial_edge_id(), DescriptionKey::Edge(1, 2));
        assert_eq!(way.name(), Some("A"));
        assert_abs_diff_eq!(way.evaluate_width(&g).unwrap(), 7.0);

        let way = StraightWay::build(&g, vec![2, 1], &Linearizer::default()).unwrap();
        assert!(!way.same_orientation());
        assert_eq!(way.initial_edge_id(), DescriptionKey::Edge(2, 1));
        assert!(way.description().is_some());
        assert_abs_diff_eq!(way.edge()[0], Point2::new(10.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn path_without_edge_is_rejected() {
        let g = graph(DescriptionEntry::edge(EntryKind::Branch, 1, 2));
        assert!(StraightWay::build(&g, vec![1], &Linearizer::default()).is_err());
    }
}
