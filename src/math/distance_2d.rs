use super::intersect_2d::{project_on_segment, segment_segment_intersect_2d};
use super::Point2;

/// Returns the minimum distance from point `p` to the line segment `a → b`.
#[must_use]
pub fn point_to_segment_dist(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let (closest, _) = project_on_segment(p, a, b);
    (p - closest).norm()
}

/// Returns the minimum distance between two line segments.
///
/// Zero when the segments cross; otherwise the smallest endpoint-to-segment
/// distance, which is where the minimum of two non-crossing segments lies.
#[must_use]
pub fn segment_to_segment_dist(a0: &Point2, a1: &Point2, b0: &Point2, b1: &Point2) -> f64 {
    if segment_segment_intersect_2d(a0, a1, b0, b1).is_some() {
        return 0.0;
    }
    point_to_segment_dist(a0, b0, b1)
        .min(point_to_segment_dist(a1, b0, b1))
        .min(point_to_segment_dist(b0, a0, a1))
        .min(point_to_segment_dist(b1, a0, a1))
}
