//! Corner resolution: the polyline joining the two straight sidewalks that
//! share an id across a branch corner.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::crossing::Crossing;
use super::straight_sidewalk::StraightSidewalk;
use crate::error::{DescriptionError, Result, TopologyError};
use crate::graph::{LabeledGraph, NodeId};
use crate::math::intersect_2d::segment_polyline_intersections;
use crate::math::polyline_2d::project;
use crate::math::Point2;
use crate::operations::RoadBuffer;

/// Half-length of the line drawn through a crossing to find where it meets
/// a sidewalk.
const CROSSING_REACH: f64 = 200.0;

/// Shape given to a sidewalk corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnShape {
    /// Straight connection between the sidewalk ends.
    Beveled,
    /// Corner point at the sidewalk lines' intersection, kept as is.
    StraightAngle,
    /// Corner point at the intersection, pulled back from the roadway.
    #[default]
    AdjustedAngle,
}

impl FromStr for TurnShape {
    type Err = DescriptionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "beveled" => Ok(Self::Beveled),
            "straight_angle" => Ok(Self::StraightAngle),
            "adjusted_angle" => Ok(Self::AdjustedAngle),
            _ => Err(DescriptionError::InvalidTurnShape(s.to_owned())),
        }
    }
}

impl fmt::Display for TurnShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Beveled => "beveled",
            Self::StraightAngle => "straight_angle",
            Self::AdjustedAngle => "adjusted_angle",
        })
    }
}

/// Position of a corner point, in the plane and along the reference path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointData {
    pub coord: Point2,
    pub curvilinear: f64,
}

/// A point of a turning sidewalk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnPoint {
    /// Sidewalk end or accepted line intersection.
    Fixed(PointData),
    /// Corner point that may move away from the roadway.
    Flexible(PointData),
    /// Where a pedestrian crossing meets the sidewalk.
    Crossing(PointData),
}

impl TurnPoint {
    fn fixed(coord: Point2) -> Self {
        Self::Fixed(PointData {
            coord,
            curvilinear: 0.0,
        })
    }

    fn data(&self) -> &PointData {
        match self {
            Self::Fixed(d) | Self::Flexible(d) | Self::Crossing(d) => d,
        }
    }

    fn data_mut(&mut self) -> &mut PointData {
        match self {
            Self::Fixed(d) | Self::Flexible(d) | Self::Crossing(d) => d,
        }
    }

    #[must_use]
    pub fn coord(&self) -> Point2 {
        self.data().coord
    }

    #[must_use]
    pub fn curvilinear(&self) -> f64 {
        self.data().curvilinear
    }

    #[must_use]
    pub fn is_flexible(&self) -> bool {
        matches!(self, Self::Flexible(_))
    }

    /// Moves a flexible point. Other points are immovable; returns whether
    /// the point moved.
    pub fn relocate(&mut self, coord: Point2) -> bool {
        match self {
            Self::Flexible(d) => {
                d.coord = coord;
                true
            }
            Self::Fixed(_) | Self::Crossing(_) => false,
        }
    }
}

/// Polyline joining two straight sidewalks around a corner.
#[derive(Debug, Clone, Serialize)]
pub struct TurningSidewalk {
    sidewalk_id: i64,
    #[serde(rename = "points")]
    way: Vec<TurnPoint>,
    reference_path: Vec<NodeId>,
    branch_names: [String; 2],
    source_ids: [String; 2],
}

impl TurningSidewalk {
    #[must_use]
    pub fn sidewalk_id(&self) -> i64 {
        self.sidewalk_id
    }

    #[must_use]
    pub fn points(&self) -> &[TurnPoint] {
        &self.way
    }

    /// Coordinates of the polyline.
    #[must_use]
    pub fn polyline(&self) -> Vec<Point2> {
        self.way.iter().map(TurnPoint::coord).collect()
    }

    /// Graph path followed by the sidewalk, from the first branch to the
    /// second.
    #[must_use]
    pub fn reference_path(&self) -> &[NodeId] {
        &self.reference_path
    }

    /// Names of the branches at the start and at the end of the polyline.
    #[must_use]
    pub fn branch_names(&self) -> [&str; 2] {
        [&self.branch_names[0], &self.branch_names[1]]
    }

    /// Description row ids of the two straight sidewalks.
    #[must_use]
    pub fn source_ids(&self) -> &[String; 2] {
        &self.source_ids
    }

    /// Sidewalk made of fixed points only, without a reference path.
    #[cfg(test)]
    pub(crate) fn from_polyline(
        sidewalk_id: i64,
        coords: &[Point2],
        branch_names: [&str; 2],
    ) -> Self {
        let mut way: Vec<TurnPoint> = coords.iter().copied().map(TurnPoint::fixed).collect();
        let reference = coords.to_vec();
        assign_curvilinear(&mut way, &reference);
        Self {
            sidewalk_id,
            way,
            reference_path: Vec::new(),
            branch_names: branch_names.map(str::to_owned),
            source_ids: [String::new(), String::new()],
        }
    }
}

/// Builds the [`TurningSidewalk`] of one sidewalk id.
#[derive(Debug, Clone, Copy)]
pub struct BuildTurningSidewalk<'a> {
    turn_shape: TurnShape,
    merge_epsilon: f64,
    crossings: Option<&'a [Crossing]>,
    road_buffer: &'a RoadBuffer,
}

impl<'a> BuildTurningSidewalk<'a> {
    /// Creates a new `BuildTurningSidewalk` operation.
    ///
    /// `crossings` are snapped onto the sidewalk when given. Flexible corner
    /// points are pulled out of `road_buffer`.
    #[must_use]
    pub fn new(
        turn_shape: TurnShape,
        merge_epsilon: f64,
        crossings: Option<&'a [Crossing]>,
        road_buffer: &'a RoadBuffer,
    ) -> Self {
        Self {
            turn_shape,
            merge_epsilon,
            crossings,
            road_buffer,
        }
    }

    /// Executes the construction from the two straight sidewalks sharing
    /// `sidewalk_id`.
    ///
    /// # Errors
    ///
    /// Returns `DescriptionError::UnsupportedConfiguration` unless exactly
    /// two sidewalks are given, and `TopologyError::BrokenSidewalkPath` when
    /// the graph path between them cannot be walked.
    pub fn execute(
        &self,
        graph: &LabeledGraph,
        sidewalk_id: i64,
        sidewalks: &[StraightSidewalk],
    ) -> Result<TurningSidewalk> {
        let [sw0, sw1] = sidewalks else {
            return Err(DescriptionError::UnsupportedConfiguration {
                branch: format!("sidewalk {sidewalk_id}"),
                reason: format!("{} straight sidewalk(s), expected 2", sidewalks.len()),
            }
            .into());
        };

        let mut way = self.initial_turn(sw0, sw1);
        let reference_path = reference_path(graph, sidewalk_id, sw0, sw1)?;
        let reference = graph.points(&reference_path)?;
        assign_curvilinear(&mut way, &reference);

        if let Some(crossings) = self.crossings {
            for crossing in crossings {
                if reference_path.contains(&crossing.node_id) {
                    self.insert_crossing(&mut way, &reference, crossing);
                }
            }
        }
        self.adjust_flexible_points(&mut way);

        Ok(TurningSidewalk {
            sidewalk_id,
            way,
            reference_path,
            branch_names: [sw0.branch_name().to_owned(), sw1.branch_name().to_owned()],
            source_ids: [sw0.description().id.clone(), sw1.description().id.clone()],
        })
    }

    /// Seed `[end0, start0, start1, end1]`, refined by the intersection of
    /// the two sidewalk lines when it lies inside the corner.
    fn initial_turn(&self, sw0: &StraightSidewalk, sw1: &StraightSidewalk) -> Vec<TurnPoint> {
        let e0 = sw0.edge();
        let e1 = sw1.edge();
        let mut way: Vec<TurnPoint> = [e0[1], e0[0], e1[0], e1[1]]
            .into_iter()
            .map(TurnPoint::fixed)
            .collect();
        if self.turn_shape == TurnShape::Beveled {
            return way;
        }
        let Some(p) = sw0.intersection(sw1) else {
            tracing::debug!(branches = ?[sw0.branch_name(), sw1.branch_name()], "parallel sidewalks, bevel kept");
            return way;
        };
        if !(before_end(&e0, &p) && before_end(&e1, &p)) {
            return way;
        }

        match (before_begin(&e0, &p), before_begin(&e1, &p)) {
            (false, inside_second) => {
                way[1] = TurnPoint::fixed(p);
                if !inside_second {
                    way.remove(2);
                }
            }
            (true, false) => way[2] = TurnPoint::fixed(p),
            (true, true) => {
                let corner = PointData {
                    coord: p,
                    curvilinear: 0.0,
                };
                let point = if self.turn_shape == TurnShape::StraightAngle {
                    TurnPoint::Fixed(corner)
                } else {
                    TurnPoint::Flexible(corner)
                };
                way.insert(2, point);
            }
        }
        way
    }

    fn insert_crossing(&self, way: &mut Vec<TurnPoint>, reference: &[Point2], crossing: &Crossing) {
        let Some(first) = way.first().map(TurnPoint::curvilinear) else {
            return;
        };
        let last = way.last().map_or(first, TurnPoint::curvilinear);
        let Some(projection) = project(reference, &crossing.location) else {
            return;
        };
        let position = projection.curvilinear;
        if position < first || position > last {
            return;
        }
        let polyline: Vec<Point2> = way.iter().map(TurnPoint::coord).collect();
        let Some(coord) = location_on_sidewalk(crossing, &polyline) else {
            return;
        };
        let point = TurnPoint::Crossing(PointData {
            coord,
            curvilinear: position,
        });

        let cid = way
            .iter()
            .position(|p| p.curvilinear() >= position)
            .unwrap_or(way.len());
        if cid > 0 && (position - way[cid - 1].curvilinear()).abs() < self.merge_epsilon {
            way[cid - 1] = point;
        } else if cid < way.len() && (position - way[cid].curvilinear()).abs() < self.merge_epsilon {
            way[cid] = point;
        } else {
            way.insert(cid, point);
        }
        tracing::debug!(node_id = crossing.node_id, position, "crossing snapped on sidewalk");
    }

    fn adjust_flexible_points(&self, way: &mut [TurnPoint]) {
        for i in 1..way.len().saturating_sub(1) {
            if !way[i].is_flexible() {
                continue;
            }
            let corner = way[i].coord();
            let pred = way[i - 1].coord();
            let next = way[i + 1].coord();
            let middle = Point2::from((pred.coords + next.coords) / 2.0);
            if !self.road_buffer.intersects_segment(&corner, &middle) {
                continue;
            }
            if let Some((coord, _)) = self
                .road_buffer
                .boundary_crossings(&middle, &corner)
                .first()
            {
                way[i].relocate(*coord);
                tracing::debug!(x = coord.x, y = coord.y, "flexible corner pulled off the roadway");
            }
        }
    }
}

/// True if `p` lies before the end of `edge`, seen from its start.
fn before_end(edge: &[Point2; 2], p: &Point2) -> bool {
    (edge[1] - edge[0]).dot(&(p - edge[1])) < 0.0
}

/// True if `p` lies before the start of `edge`.
fn before_begin(edge: &[Point2; 2], p: &Point2) -> bool {
    (edge[1] - edge[0]).dot(&(p - edge[0])) < 0.0
}

/// Walks the graph from the first sidewalk's branch to the second one,
/// following the edges bordered by this sidewalk.
fn reference_path(
    graph: &LabeledGraph,
    sidewalk_id: i64,
    sw0: &StraightSidewalk,
    sw1: &StraightSidewalk,
) -> std::result::Result<Vec<NodeId>, TopologyError> {
    let mut path: Vec<NodeId> = sw0.polybranch().iter().rev().copied().collect();
    let target = sw1.polybranch()[0];
    let limit = graph.graph().node_count();

    while path.last() != Some(&target) {
        let (last, previous) = match path.as_slice() {
            [.., previous, last] => (*last, Some(*previous)),
            [last] => (*last, None),
            [] => break,
        };
        if path.len() > limit + sw0.polybranch().len() {
            return Err(TopologyError::BrokenSidewalkPath { sidewalk_id, at: last });
        }
        let mut candidates: Vec<NodeId> = graph
            .neighbors(last)?
            .into_iter()
            .filter(|&n| Some(n) != previous)
            .filter(|&n| {
                graph
                    .edge_label(n, last)
                    .is_some_and(|label| label.borders_sidewalk(sidewalk_id))
            })
            .collect();
        candidates.sort_unstable();
        let Some(&next) = candidates.first() else {
            return Err(TopologyError::BrokenSidewalkPath { sidewalk_id, at: last });
        };
        path.push(next);
    }

    path.extend(sw1.polybranch().iter().skip(1));
    Ok(path)
}

/// Curvilinear position of every point on the reference polyline, forced
/// to be non-decreasing.
fn assign_curvilinear(way: &mut [TurnPoint], reference: &[Point2]) {
    let mut floor = 0.0_f64;
    for point in way.iter_mut() {
        let position = project(reference, &point.coord()).map_or(0.0, |p| p.curvilinear);
        floor = floor.max(position);
        point.data_mut().curvilinear = floor;
    }
}

/// Where the line through a crossing, along its bearing, meets a sidewalk:
/// the nearest intersection, or the nearest sidewalk point when there is none.
fn location_on_sidewalk(crossing: &Crossing, polyline: &[Point2]) -> Option<Point2> {
    let shift = crossing.direction() * CROSSING_REACH;
    let a = crossing.location - shift;
    let b = crossing.location + shift;
    segment_polyline_intersections(&a, &b, polyline)
        .into_iter()
        .map(|(p, _)| p)
        .min_by(|p, q| {
            (p - crossing.location)
                .norm()
                .total_cmp(&(q - crossing.location).norm())
        })
        .or_else(|| project(polyline, &crossing.location).map(|p| p.point))
}
