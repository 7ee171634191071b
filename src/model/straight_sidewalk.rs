use serde::Serialize;

use crate::error::DescriptionError;
use crate::graph::{DescriptionEntry, NodeId};
use crate::math::intersect_2d::segment_segment_intersect_2d;
use crate::math::vector_2d::normalized_vector;
use crate::math::Point2;

/// Half-length added on both ends of a sidewalk when intersecting it with
/// its turn partner.
const EXTENSION_LENGTH: f64 = 200.0;

/// Length added before the interior end when the interior node is a
/// pedestrian crossing.
const CROSSING_EXTENSION: f64 = 1.0;

/// Side of a branch middle line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Straight sidewalk segment running along one side of a branch, oriented
/// from the crossroad outwards.
#[derive(Debug, Clone)]
pub struct StraightSidewalk {
    edge: [Point2; 2],
    side: Side,
    description: DescriptionEntry,
    same_orientation: bool,
    polybranch: Vec<NodeId>,
    branch_name: String,
}

impl StraightSidewalk {
    /// Creates a sidewalk along `edge`.
    ///
    /// When the interior node of the way is a crossing, the sidewalk start is
    /// pushed one unit further inside the crossroad.
    #[must_use]
    pub fn new(
        edge: [Point2; 2],
        side: Side,
        description: DescriptionEntry,
        same_orientation: bool,
        is_crossing_interior_node: bool,
        polybranch: Vec<NodeId>,
        branch_name: String,
    ) -> Self {
        let mut sidewalk = Self {
            edge,
            side,
            description,
            same_orientation,
            polybranch,
            branch_name,
        };
        if is_crossing_interior_node {
            sidewalk.extend_start(CROSSING_EXTENSION);
        }
        sidewalk
    }

    fn extend_start(&mut self, length: f64) {
        if let Ok(dir) = normalized_vector(&self.edge[0], &self.edge[1]) {
            self.edge[0] -= dir * length;
        }
    }

    /// Sidewalk id read from the description row, on this side of the way.
    ///
    /// # Errors
    ///
    /// Returns `DescriptionError::MissingTagData` if the row has no sidewalk
    /// on this side.
    pub fn sidewalk_id(&self) -> Result<i64, DescriptionError> {
        let side = if self.same_orientation {
            self.side
        } else {
            self.side.opposite()
        };
        let id = match side {
            Side::Left => self.description.left_sidewalk,
            Side::Right => self.description.right_sidewalk,
        };
        id.ok_or_else(|| DescriptionError::MissingTagData {
            key: format!("{}:{side:?}_sidewalk", self.description.id).to_lowercase(),
        })
    }

    #[must_use]
    pub fn edge(&self) -> [Point2; 2] {
        self.edge
    }

    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    #[must_use]
    pub fn description(&self) -> &DescriptionEntry {
        &self.description
    }

    /// Node path of the way the sidewalk follows, interior node first.
    #[must_use]
    pub fn polybranch(&self) -> &[NodeId] {
        &self.polybranch
    }

    #[must_use]
    pub fn branch_name(&self) -> &str {
        &self.branch_name
    }

    /// The sidewalk segment lengthened by `length` on both ends.
    ///
    /// Returns `None` for a zero-length sidewalk.
    #[must_use]
    pub fn extended(&self, length: f64) -> Option<[Point2; 2]> {
        let dir = normalized_vector(&self.edge[0], &self.edge[1]).ok()?;
        Some([self.edge[0] - dir * length, self.edge[1] + dir * length])
    }

    /// Intersection of the two sidewalk lines, each lengthened far beyond
    /// its real extent.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Point2> {
        let [a0, a1] = self.extended(EXTENSION_LENGTH)?;
        let [b0, b1] = other.extended(EXTENSION_LENGTH)?;
        segment_segment_intersect_2d(&a0, &a1, &b0, &b1).map(|(p, _, _)| p)
    }
}
