use thiserror::Error;

use crate::graph::NodeId;

/// Top-level error type for crossroad schematization.
#[derive(Debug, Error)]
pub enum CrossroadError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Description(#[from] DescriptionError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Input(#[from] InputError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("zero-length vector")]
    ZeroVector,

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Errors raised while reading the crossroad description table.
#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("no description for key {key}")]
    MissingTagData { key: String },

    #[error("malformed description key {0:?}")]
    InvalidKey(String),

    #[error("unknown turn shape {0:?}")]
    InvalidTurnShape(String),

    #[error("unsupported configuration on branch {branch}: {reason}")]
    UnsupportedConfiguration { branch: String, reason: String },
}

/// Errors related to the road graph and the entities threaded through it.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("node {0} not found in the road graph")]
    NodeNotFound(NodeId),

    #[error("no edge between nodes {from} and {to}")]
    EdgeNotFound { from: NodeId, to: NodeId },

    #[error("sidewalk {sidewalk_id}: reference path breaks at node {at}")]
    BrokenSidewalkPath { sidewalk_id: i64, at: NodeId },

    #[error("inner region cannot be closed, {remaining} sidewalk(s) left unmatched")]
    UnclosedInnerRegion { remaining: usize },

    #[error("traffic island {island_id}: fragments cannot be merged into one ring")]
    IslandNotChainable { island_id: i64 },

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors raised while decoding boundary records.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot decode input: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for results using [`CrossroadError`].
pub type Result<T> = std::result::Result<T, CrossroadError>;
