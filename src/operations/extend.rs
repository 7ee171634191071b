use std::collections::BTreeSet;

use serde::Deserialize;

use crate::error::TopologyError;
use crate::graph::{EdgeKind, LabeledGraph, NodeId};
use crate::math::vector_2d::{normalized_vector, signed_angle};

/// Absolute cosine below which two consecutive edges form a turn.
const TURN_COSINE: f64 = 0.5;

/// Tie-break between several acceptable continuations of a street.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuationPreference {
    /// Keep the candidate turning most counter-clockwise.
    Leftmost,
    /// Keep the candidate turning most clockwise.
    #[default]
    Rightmost,
}

/// Extends a branch edge into the node path ("polybranch") of its street.
///
/// The walk follows unlabeled edges carrying the same street name as long
/// as they do not turn. It is a pure query: the graph is left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchExtender {
    preference: ContinuationPreference,
}

impl BranchExtender {
    /// Creates a new `BranchExtender` with the given tie-break preference.
    #[must_use]
    pub fn new(preference: ContinuationPreference) -> Self {
        Self { preference }
    }

    /// Executes the extension of the seed edge `n1 → n2`.
    ///
    /// The walk leaves from `n2`; when `n2` has no continuation it leaves
    /// from `n1` instead. The returned path starts at the interior node.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::EdgeNotFound` if the seed nodes are not
    /// adjacent, or `TopologyError::NodeNotFound` for unknown nodes.
    pub fn execute(
        &self,
        graph: &LabeledGraph,
        n1: NodeId,
        n2: NodeId,
    ) -> Result<Vec<NodeId>, TopologyError> {
        graph.require_edge(n1, n2)?;

        let mut visited = BTreeSet::from([n1, n2]);
        let (mut prev, mut cur) = (n1, n2);
        let mut path = vec![n1, n2];

        if self.next_node(graph, n1, n2, &visited)?.is_none() {
            if self.next_node(graph, n2, n1, &visited)?.is_some() {
                (prev, cur) = (n2, n1);
                path = vec![n2, n1];
            } else {
                return Ok(path);
            }
        }

        while let Some(next) = self.next_node(graph, prev, cur, &visited)? {
            visited.insert(next);
            path.push(next);
            (prev, cur) = (cur, next);
        }

        tracing::debug!(n1, n2, nodes = path.len(), "branch extended");
        Ok(path)
    }

    /// Best continuation of the edge `prev → cur`, if any.
    fn next_node(
        &self,
        graph: &LabeledGraph,
        prev: NodeId,
        cur: NodeId,
        visited: &BTreeSet<NodeId>,
    ) -> Result<Option<NodeId>, TopologyError> {
        let name = graph
            .require_edge(prev, cur)?
            .tags
            .name
            .as_deref()
            .filter(|n| !n.is_empty());
        let Some(name) = name else {
            return Ok(None);
        };

        let p_prev = graph.point(prev)?;
        let p_cur = graph.point(cur)?;
        let mut candidates: Vec<(NodeId, f64)> = Vec::new();
        for (next, edge) in graph.neighbor_edges(cur)? {
            if next == prev || visited.contains(&next) {
                continue;
            }
            if graph.edge_kind(cur, next) != Some(EdgeKind::Unknown)
                || edge.tags.name.as_deref() != Some(name)
            {
                continue;
            }
            let p_next = graph.point(next)?;
            let (Ok(back), Ok(ahead)) = (
                normalized_vector(&p_cur, &p_prev),
                normalized_vector(&p_cur, &p_next),
            ) else {
                continue;
            };
            if back.dot(&ahead).abs() < TURN_COSINE {
                continue;
            }
            candidates.push((next, signed_angle(&-back, &ahead)));
        }

        candidates.sort_by_key(|&(id, _)| id);
        let best = match self.preference {
            ContinuationPreference::Leftmost => candidates
                .into_iter()
                .reduce(|a, b| if b.1 > a.1 { b } else { a }),
            ContinuationPreference::Rightmost => candidates
                .into_iter()
                .reduce(|a, b| if b.1 < a.1 { b } else { a }),
        };
        Ok(best.map(|(id, _)| id))
    }
}
