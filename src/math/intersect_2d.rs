use super::{Point2, Vector2, TOLERANCE};

/// Parametric 2D line-line intersection.
///
/// Given lines `p1 + t * d1` and `p2 + u * d2`, returns `(t, u)` if not parallel.
#[must_use]
pub fn line_line_intersect_2d(
    p1: &Point2,
    d1: &Vector2,
    p2: &Point2,
    d2: &Vector2,
) -> Option<(f64, f64)> {
    let cross = d1.x * d2.y - d1.y * d2.x;
    if cross.abs() < TOLERANCE {
        return None;
    }
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let t = (dx * d2.y - dy * d2.x) / cross;
    let u = (dx * d1.y - dy * d1.x) / cross;
    Some((t, u))
}

/// Bounded segment-segment intersection in 2D.
///
/// Returns `(intersection_point, t, u)` where `t` and `u` are in `[0, 1]`.
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
) -> Option<(Point2, f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;
    let (t, u) = line_line_intersect_2d(a0, &da, b0, &db)?;

    // Use a small epsilon to include endpoints.
    let eps = TOLERANCE;
    if t >= -eps && t <= 1.0 + eps && u >= -eps && u <= 1.0 + eps {
        let t_clamped = t.clamp(0.0, 1.0);
        Some((point_at(a0, &da, t_clamped), t_clamped, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Linear interpolation: `origin + dir * t`.
#[must_use]
pub fn point_at(origin: &Point2, dir: &Vector2, t: f64) -> Point2 {
    origin + dir * t
}

/// Orthogonal projection of `p` onto the segment `a → b`.
///
/// Returns the projected point and its parameter, clamped to `[0, 1]`.
#[must_use]
pub fn project_on_segment(p: &Point2, a: &Point2, b: &Point2) -> (Point2, f64) {
    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq < TOLERANCE * TOLERANCE {
        return (*a, 0.0);
    }
    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    (point_at(a, &d, t), t)
}

/// All crossings between the segment `a → b` and an open polyline.
///
/// Returns `(point, t)` pairs sorted by the parameter `t` along `a → b`.
#[must_use]
pub fn segment_polyline_intersections(
    a: &Point2,
    b: &Point2,
    polyline: &[Point2],
) -> Vec<(Point2, f64)> {
    let mut hits: Vec<(Point2, f64)> = polyline
        .windows(2)
        .filter_map(|w| segment_segment_intersect_2d(a, b, &w[0], &w[1]))
        .map(|(pt, t, _)| (pt, t))
        .collect();
    hits.sort_by(|x, y| x.1.total_cmp(&y.1));
    hits.dedup_by(|x, y| (x.1 - y.1).abs() < TOLERANCE);
    hits
}
