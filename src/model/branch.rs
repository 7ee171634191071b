use serde::Serialize;

use super::straight_sidewalk::{Side, StraightSidewalk};
use super::straight_way::StraightWay;
use crate::error::{DescriptionError, Result};
use crate::graph::LabeledGraph;
use crate::math::distance_2d::segment_to_segment_dist;
use crate::math::intersect_2d::project_on_segment;
use crate::math::vector_2d::{cross, left_normal, normalized_vector};
use crate::math::Point2;

/// One arm of the crossroad: one or two ways sharing a street name, reduced
/// to a middle line and a width.
#[derive(Debug, Clone, Serialize)]
pub struct Branch {
    name: String,
    #[serde(skip)]
    ways: Vec<StraightWay>,
    middle_line: [Point2; 2],
    width: f64,
    /// Indices into `ways` of the ways bordering the left and right sidewalks.
    #[serde(skip)]
    sides: [usize; 2],
}

impl Branch {
    /// Pairs the ways of a branch and computes its middle line and width.
    ///
    /// A single way must carry sidewalks on both sides; two ways must each
    /// carry at least one.
    ///
    /// # Errors
    ///
    /// Returns `DescriptionError::UnsupportedConfiguration` for any other
    /// configuration, or a geometry error for a degenerate middle line.
    pub fn build(
        name: String,
        ways: Vec<StraightWay>,
        graph: &LabeledGraph,
        kerb_footway_distance: f64,
    ) -> Result<Self> {
        let sidewalked = |w: &StraightWay| w.description().is_some_and(|d| d.has_sidewalk());

        let (middle_line, width, sides) = match ways.as_slice() {
            [way]
                if way
                    .description()
                    .is_some_and(|d| d.left_sidewalk.is_some() && d.right_sidewalk.is_some()) =>
            {
                let width = way.evaluate_width(graph)? + 2.0 * kerb_footway_distance;
                (way.edge(), width, [0, 0])
            }
            [w0, w1] if sidewalked(w0) && sidewalked(w1) => {
                let middle_line = middle_line(&w0.edge(), &w1.edge());
                let [a0, a1] = w0.initial_edge(graph)?;
                let [b0, b1] = w1.initial_edge(graph)?;
                let width = w0.evaluate_width(graph)? / 2.0
                    + w1.evaluate_width(graph)? / 2.0
                    + segment_to_segment_dist(&a0, &a1, &b0, &b1)
                    + 2.0 * kerb_footway_distance;
                let sides = if side_of(&middle_line, &w0.edge()) >= side_of(&middle_line, &w1.edge()) {
                    [0, 1]
                } else {
                    [1, 0]
                };
                (middle_line, width, sides)
            }
            _ => {
                return Err(DescriptionError::UnsupportedConfiguration {
                    branch: name,
                    reason: format!(
                        "{} way(s) without the expected sidewalk tagging",
                        ways.len()
                    ),
                }
                .into())
            }
        };
        normalized_vector(&middle_line[0], &middle_line[1])?;

        Ok(Self {
            name,
            ways,
            middle_line,
            width,
            sides,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn ways(&self) -> &[StraightWay] {
        &self.ways
    }

    #[must_use]
    pub fn middle_line(&self) -> [Point2; 2] {
        self.middle_line
    }

    /// Distance between the two sidewalks of the branch.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// The two sidewalks, middle line shifted by half the width on each
    /// side, both oriented like the middle line.
    #[must_use]
    pub fn sidewalks(&self) -> Vec<StraightSidewalk> {
        let [m0, m1] = self.middle_line;
        let Ok(dir) = normalized_vector(&m0, &m1) else {
            return Vec::new();
        };
        let shift = left_normal(&dir) * (self.width / 2.0);

        [(Side::Left, shift), (Side::Right, -shift)]
            .into_iter()
            .zip(self.sides)
            .filter_map(|((side, shift), index)| {
                let way = &self.ways[index];
                let description = way.description()?.clone();
                Some(StraightSidewalk::new(
                    [m0 + shift, m1 + shift],
                    side,
                    description,
                    way.same_orientation(),
                    way.is_crossing_interior_node(),
                    way.polybranch().to_vec(),
                    self.name.clone(),
                ))
            })
            .collect()
    }
}

/// Bisector between two edges: each end is the midpoint of the mutual
/// projections of the corresponding endpoints.
fn middle_line(e1: &[Point2; 2], e2: &[Point2; 2]) -> [Point2; 2] {
    let mid = |i: usize| {
        let (on_e2, _) = project_on_segment(&e1[i], &e2[0], &e2[1]);
        let (on_e1, _) = project_on_segment(&e2[i], &e1[0], &e1[1]);
        Point2::from((on_e2.coords + on_e1.coords) / 2.0)
    };
    [mid(0), mid(1)]
}

/// Positive when the midpoint of `edge` lies left of `line`.
fn side_of(line: &[Point2; 2], edge: &[Point2; 2]) -> f64 {
    let mid = Point2::from((edge[0].coords + edge[1].coords) / 2.0);
    cross(&(line[1] - line[0]), &(mid - line[0]))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::graph::{
        DescriptionEntry, DescriptionTable, EdgeTags, EntryKind, NodeData, RoadGraph,
    };
    use crate::operations::Linearizer;

    /// Dual carriageway heading east: 1 → 2 at y = 5 and 4 → 3 at y = -5.
    fn dual_carriageway() -> LabeledGraph {
        let mut g = RoadGraph::new();
        g.add_node(NodeData::new(1, 0.0, 5.0));
        g.add_node(NodeData::new(2, 40.0, 5.0));
        g.add_node(NodeData::new(3, 40.0, -5.0));
        g.add_node(NodeData::new(4, 0.0, -5.0));
        let mut oneway = EdgeTags::highway("primary").named("Main");
        oneway.oneway = true;
        g.add_edge(1, 2, oneway.clone()).unwrap();
        g.add_edge(3, 4, oneway).unwrap();
        let table = DescriptionTable::from_entries([
            DescriptionEntry::edge(EntryKind::Branch, 1, 2)
                .named("Main")
                .sidewalks(Some(1), None),
            DescriptionEntry::edge(EntryKind::Branch, 3, 4)
                .named("Main")
                .sidewalks(Some(2), None),
        ])
        .unwrap();
        g.label(&table)
    }

    #[test]
    fn two_sided_branch() {
        let g = dual_carriageway();
        let lz = Linearizer::default();
        let ways = vec![
            StraightWay::build(&g, vec![1, 2], &lz).unwrap(),
            StraightWay::build(&g, vec![4, 3], &lz).unwrap(),
        ];
        let branch = Branch::build("Main".to_owned(), ways, &g, 0.5).unwrap();

        let [m0, m1] = branch.middle_line();
        assert_abs_diff_eq!(m0, Point2::new(0.0, 0.0), epsilon = 1e-9);
        assert_abs_diff_eq!(m1.y, 0.0, epsilon = 1e-9);
        // 3.0 / 2 + 3.0 / 2 + 10 + 2 * 0.5
        assert_abs_diff_eq!(branch.width(), 14.0, epsilon = 1e-9);

        let sidewalks = branch.sidewalks();
        assert_eq!(sidewalks.len(), 2);
        let left = &sidewalks[0];
        assert_eq!(left.side(), Side::Left);
        assert_abs_diff_eq!(left.edge()[0].y, 7.0, epsilon = 1e-9);
        assert_eq!(left.sidewalk_id().unwrap(), 1);
        let right = &sidewalks[1];
        assert_abs_diff_eq!(right.edge()[0].y, -7.0, epsilon = 1e-9);
        // Row 3;4 runs westward, its left side is the southern one.
        assert_eq!(right.sidewalk_id().unwrap(), 2);
    }

    #[test]
    fn single_way_needs_both_sidewalks() {
        let g = dual_carriageway();
        let lz = Linearizer::default();
        let ways = vec![StraightWay::build(&g, vec![1, 2], &lz).unwrap()];
        let err = Branch::build("Main".to_owned(), ways, &g, 0.5).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CrossroadError::Description(
                DescriptionError::UnsupportedConfiguration { .. }
            )
        ));
    }
}
