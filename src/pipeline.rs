//! End-to-end schematization of a crossroad.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::SchematizationConfig;
use crate::error::{CrossroadError, InputError, Result};
use crate::graph::{DescriptionTable, LabeledGraph, NodeId, RoadGraph};
use crate::model::{
    Branch, BuildInnerRegion, BuildTurningSidewalk, Crossing, GeneralizeIsland,
    IslandGeneralization, InnerRegion, StraightSidewalk, StraightWay, TrafficIsland,
    TurningSidewalk,
};
use crate::operations::{BranchExtender, Linearizer, RoadBuffer};

/// A reconstructed traffic island with its schematic summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficIslandRecord {
    pub island_id: i64,
    pub polygon: Vec<NodeId>,
    #[serde(flatten)]
    pub generalization: IslandGeneralization,
}

/// Output of a schematization run.
#[derive(Debug, Clone, Serialize)]
pub struct Schematization {
    pub inner_region: InnerRegion,
    /// Turning sidewalks by ascending sidewalk id.
    pub sidewalks: Vec<TurningSidewalk>,
    /// Branches by ascending name.
    pub branches: Vec<Branch>,
    pub traffic_islands: Vec<TrafficIslandRecord>,
    /// Crossings by ascending node id.
    pub crossings: Vec<Crossing>,
}

impl Schematization {
    /// Serializes the schematization as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `InputError::Json` if a value cannot be represented in JSON
    /// (non-finite coordinates).
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).map_err(InputError::from)?)
    }
}

/// Builds the schematic map of one crossroad.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossroadSchematization {
    config: SchematizationConfig,
}

impl CrossroadSchematization {
    /// Creates a new `CrossroadSchematization` with the given configuration.
    #[must_use]
    pub fn new(config: SchematizationConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SchematizationConfig {
        &self.config
    }

    /// Executes the whole pipeline.
    ///
    /// Entities that cannot be built (unsupported branches, lone sidewalks,
    /// unchainable islands, crossings) are logged and left out.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::BrokenSidewalkPath` if a turning sidewalk
    /// cannot follow the graph, `TopologyError::UnclosedInnerRegion` if the
    /// sidewalks do not form a ring, and `TopologyError::NodeNotFound` if the
    /// description table and the graph disagree on node ids.
    pub fn execute(&self, graph: RoadGraph, table: &DescriptionTable) -> Result<Schematization> {
        let graph = graph.label(table);
        let linearizer = Linearizer::new(self.config.linearization);

        let branches = self.build_branches(&graph, &linearizer);
        let straight_sidewalks = group_sidewalks(&branches);
        let crossings = build_crossings(&graph);
        let sidewalks = self.build_turning_sidewalks(&graph, &straight_sidewalks, &crossings)?;

        let inner_region =
            BuildInnerRegion::new(self.config.white_space_distance).execute(&sidewalks)?;
        let traffic_islands =
            self.build_traffic_islands(&graph, &crossings, &inner_region, linearizer)?;

        Ok(Schematization {
            inner_region,
            sidewalks,
            branches,
            traffic_islands,
            crossings,
        })
    }

    /// Extends every input branch edge into a straight way and pairs the
    /// ways by street name.
    fn build_branches(&self, graph: &LabeledGraph, linearizer: &Linearizer) -> Vec<Branch> {
        let extender = BranchExtender::new(self.config.continuation_preference);
        let mut groups: BTreeMap<String, Vec<StraightWay>> = BTreeMap::new();
        for (n1, n2) in graph.branch_edges() {
            let way = extender
                .execute(graph, n1, n2)
                .map_err(CrossroadError::from)
                .and_then(|path| StraightWay::build(graph, path, linearizer));
            let way = match way {
                Ok(way) => way,
                Err(err) => {
                    tracing::warn!(n1, n2, %err, "branch edge skipped");
                    continue;
                }
            };
            let Some(description) = way.description().filter(|d| d.has_sidewalk()) else {
                tracing::debug!(n1, n2, "branch way without sidewalk");
                continue;
            };
            let name = description
                .name
                .clone()
                .unwrap_or_else(|| description.id.clone());
            groups.entry(name).or_default().push(way);
        }

        let mut branches = Vec::new();
        for (name, ways) in groups {
            match Branch::build(name, ways, graph, self.config.kerb_footway_distance) {
                Ok(branch) => branches.push(branch),
                Err(err) => tracing::warn!(%err, "branch skipped"),
            }
        }
        tracing::info!(branches = branches.len(), "branches built");
        branches
    }

    fn build_turning_sidewalks(
        &self,
        graph: &LabeledGraph,
        straight_sidewalks: &BTreeMap<i64, Vec<StraightSidewalk>>,
        crossings: &[Crossing],
    ) -> Result<Vec<TurningSidewalk>> {
        let road_buffer = RoadBuffer::from_graph(graph, self.config.kerb_footway_distance)?;
        let crossings = (!self.config.ignore_crossings_for_sidewalks).then_some(crossings);
        let op = BuildTurningSidewalk::new(
            self.config.turn_shape,
            self.config.crossing_merge_epsilon,
            crossings,
            &road_buffer,
        );

        let mut sidewalks = Vec::new();
        for (&sidewalk_id, pair) in straight_sidewalks {
            match op.execute(graph, sidewalk_id, pair) {
                Ok(sidewalk) => sidewalks.push(sidewalk),
                Err(CrossroadError::Description(err)) => {
                    tracing::warn!(sidewalk_id, %err, "turning sidewalk skipped");
                }
                Err(err) => return Err(err),
            }
        }
        tracing::info!(sidewalks = sidewalks.len(), "turning sidewalks built");
        Ok(sidewalks)
    }

    fn build_traffic_islands(
        &self,
        graph: &LabeledGraph,
        crossings: &[Crossing],
        inner_region: &InnerRegion,
        linearizer: Linearizer,
    ) -> Result<Vec<TrafficIslandRecord>> {
        let road_buffer = RoadBuffer::from_graph(graph, self.config.road_buffer_margin)?;
        let crossing_nodes: BTreeSet<NodeId> = crossings.iter().map(|c| c.node_id).collect();
        let op = GeneralizeIsland::new(
            &crossing_nodes,
            &road_buffer,
            &inner_region.ring,
            linearizer,
            self.config.virtual_edge_length,
        );

        let mut islands = Vec::new();
        for (island_id, fragments) in TrafficIsland::collect_fragments(graph) {
            let shaped = TrafficIsland::build(island_id, fragments)
                .map_err(CrossroadError::from)
                .and_then(|island| Ok((op.execute(graph, &island)?, island)));
            let (generalization, island) = match shaped {
                Ok(shaped) => shaped,
                Err(err) => {
                    tracing::warn!(island_id, %err, "traffic island skipped");
                    continue;
                }
            };
            if self.config.only_reachable_islands && !generalization.is_reachable {
                tracing::debug!(island_id, "unreachable traffic island left out");
                continue;
            }
            islands.push(TrafficIslandRecord {
                island_id,
                polygon: island.polygon,
                generalization,
            });
        }
        tracing::info!(islands = islands.len(), "traffic islands built");
        Ok(islands)
    }
}

/// Straight sidewalks of all branches, by sidewalk id.
fn group_sidewalks(branches: &[Branch]) -> BTreeMap<i64, Vec<StraightSidewalk>> {
    let mut groups: BTreeMap<i64, Vec<StraightSidewalk>> = BTreeMap::new();
    for branch in branches {
        for sidewalk in branch.sidewalks() {
            match sidewalk.sidewalk_id() {
                Ok(id) => groups.entry(id).or_default().push(sidewalk),
                Err(err) => tracing::debug!(branch = branch.name(), %err, "no sidewalk on this side"),
            }
        }
    }
    tracing::info!(sidewalk_ids = groups.len(), "straight sidewalks built");
    groups
}

/// Crossings of the input nodes, by ascending node id.
fn build_crossings(graph: &LabeledGraph) -> Vec<Crossing> {
    let mut ids: Vec<NodeId> = graph
        .graph()
        .nodes()
        .map(|n| n.id)
        .filter(|&id| graph.is_input_node(id) && graph.is_crossing(id))
        .collect();
    ids.sort_unstable();

    let crossings: Vec<Crossing> = ids
        .into_iter()
        .filter_map(|id| match Crossing::build(graph, id) {
            Ok(crossing) => Some(crossing),
            Err(err) => {
                tracing::warn!(node_id = id, %err, "crossing skipped");
                None
            }
        })
        .collect();
    tracing::info!(crossings = crossings.len(), "crossings built");
    crossings
}
