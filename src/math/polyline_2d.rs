//! Open polylines given as point slices.

use super::intersect_2d::project_on_segment;
use super::{Point2, TOLERANCE};

/// Nearest location on a polyline to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylineProjection {
    /// The projected point on the polyline.
    pub point: Point2,
    /// Arc length from the polyline start up to `point`.
    pub curvilinear: f64,
    /// Euclidean distance from the query point to `point`.
    pub distance: f64,
}

/// Total length of a polyline.
#[must_use]
pub fn length(points: &[Point2]) -> f64 {
    points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

/// Point located at arc length `distance` from the start.
///
/// `distance` is clamped to `[0, length]`. Returns `None` for an empty polyline.
#[must_use]
pub fn interpolate(points: &[Point2], distance: f64) -> Option<Point2> {
    let first = points.first()?;
    if distance <= 0.0 {
        return Some(*first);
    }
    let mut remaining = distance;
    for w in points.windows(2) {
        let seg = w[1] - w[0];
        let len = seg.norm();
        if remaining <= len {
            if len < TOLERANCE {
                return Some(w[0]);
            }
            return Some(w[0] + seg * (remaining / len));
        }
        remaining -= len;
    }
    points.last().copied()
}

/// Mean of the points (not the area centroid).
#[must_use]
pub fn centroid(points: &[Point2]) -> Option<Point2> {
    if points.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point2::new(sx / n, sy / n))
}

/// Projects a point onto the polyline, keeping the first nearest location.
#[must_use]
pub fn project(points: &[Point2], p: &Point2) -> Option<PolylineProjection> {
    let first = points.first()?;
    let mut best = PolylineProjection {
        point: *first,
        curvilinear: 0.0,
        distance: (p - first).norm(),
    };
    let mut walked = 0.0;
    for w in points.windows(2) {
        let (foot, t) = project_on_segment(p, &w[0], &w[1]);
        let seg_len = (w[1] - w[0]).norm();
        let distance = (p - foot).norm();
        if distance < best.distance - TOLERANCE {
            best = PolylineProjection {
                point: foot,
                curvilinear: walked + t * seg_len,
                distance,
            };
        }
        walked += seg_len;
    }
    Some(best)
}

/// Splits a polyline at arc length `distance` into two polylines sharing the
/// split point.
#[must_use]
pub fn split_at_length(points: &[Point2], distance: f64) -> (Vec<Point2>, Vec<Point2>) {
    let Some(split) = interpolate(points, distance) else {
        return (Vec::new(), Vec::new());
    };
    let mut head = Vec::new();
    let mut tail = Vec::new();
    let mut walked = 0.0;
    let mut in_tail = false;
    if let Some(first) = points.first() {
        head.push(*first);
    }
    for w in points.windows(2) {
        let seg_len = (w[1] - w[0]).norm();
        if !in_tail && walked + seg_len >= distance {
            head.push(split);
            tail.push(split);
            in_tail = true;
        } else if !in_tail {
            head.push(w[1]);
        }
        if in_tail {
            tail.push(w[1]);
        }
        walked += seg_len;
    }
    head.dedup_by(|a, b| (*a - *b).norm() < TOLERANCE);
    tail.dedup_by(|a, b| (*a - *b).norm() < TOLERANCE);
    (head, tail)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn l_shape() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 3.0),
        ]
    }

    #[test]
    fn length_of_l_shape() {
        assert_abs_diff_eq!(length(&l_shape()), 7.0, epsilon = 1e-12);
    }

    #[test]
    fn interpolate_clamps_and_walks() {
        let pts = l_shape();
        assert_eq!(interpolate(&pts, -1.0).unwrap(), Point2::new(0.0, 0.0));
        let p = interpolate(&pts, 5.0).unwrap();
        assert_abs_diff_eq!(p.x, 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 1.0, epsilon = 1e-12);
        assert_eq!(interpolate(&pts, 100.0).unwrap(), Point2::new(4.0, 3.0));
        assert!(interpolate(&[], 1.0).is_none());
    }

    #[test]
    fn projection_reports_curvilinear_position() {
        let proj = project(&l_shape(), &Point2::new(5.0, 2.0)).unwrap();
        assert_abs_diff_eq!(proj.point.x, 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(proj.point.y, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(proj.curvilinear, 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(proj.distance, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn split_at_midpoint() {
        let (head, tail) = split_at_length(&l_shape(), 3.5);
        assert_eq!(head.len(), 2);
        assert_abs_diff_eq!(head[1].x, 3.5, epsilon = 1e-12);
        assert_eq!(tail.len(), 3);
        assert_abs_diff_eq!(tail[0].x, 3.5, epsilon = 1e-12);
        assert_eq!(tail[2], Point2::new(4.0, 3.0));
    }

    #[test]
    fn centroid_of_points() {
        let c = centroid(&l_shape()).unwrap();
        assert_abs_diff_eq!(c.x, 8.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.y, 1.0, epsilon = 1e-12);
    }
}
