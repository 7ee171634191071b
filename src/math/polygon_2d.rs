use super::intersect_2d::line_line_intersect_2d;
use super::vector_2d::{left_normal, normalize};
use super::{Point2, TOLERANCE};
use crate::error::GeometryError;

/// Maximum miter distance as a multiple of the offset distance. Beyond it,
/// a bevel (two points) is used instead.
const MITER_LIMIT: f64 = 4.0;

/// Computes the signed area of a polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise. A repeated closing
/// vertex does not change the result.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Strips the repeated closing vertex and consecutive duplicates of a ring.
#[must_use]
pub fn open_ring(points: &[Point2]) -> Vec<Point2> {
    let mut open: Vec<Point2> = points.to_vec();
    open.dedup_by(|a, b| (*a - *b).norm() < TOLERANCE);
    while open.len() > 1 {
        let (first, last) = (open[0], open[open.len() - 1]);
        if (first - last).norm() < TOLERANCE {
            open.pop();
        } else {
            break;
        }
    }
    open
}

/// Offsets a closed ring towards its interior by `distance`.
///
/// Each edge is moved along its inward normal and consecutive offset edges
/// are joined by their intersection (miter), or by a bevel when the miter
/// would exceed [`MITER_LIMIT`]. The result is closed by repeating its first
/// point. Self-intersections produced by a too large distance are not trimmed.
///
/// # Errors
///
/// Returns `GeometryError::Degenerate` if the ring has fewer than 3 distinct
/// vertices or zero area.
pub fn inset_ring(points: &[Point2], distance: f64) -> Result<Vec<Point2>, GeometryError> {
    let ring = open_ring(points);
    let n = ring.len();
    if n < 3 {
        return Err(GeometryError::Degenerate(format!(
            "ring with {n} distinct vertices"
        )));
    }
    let area = signed_area_2d(&ring);
    if area.abs() < TOLERANCE {
        return Err(GeometryError::Degenerate("ring with zero area".to_owned()));
    }
    // Interior lies left of CCW edges and right of CW ones.
    let side = area.signum();

    // Phase A: offset every edge along its inward normal.
    let mut offset_edges = Vec::with_capacity(n);
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let dir = normalize(&(b - a))?;
        let shift = left_normal(&dir) * (distance * side);
        offset_edges.push((a + shift, b + shift, dir));
    }

    // Phase B: join consecutive offset edges.
    let mut result = Vec::with_capacity(n + 1);
    for i in 0..n {
        let (_, prev_end, prev_dir) = offset_edges[(i + n - 1) % n];
        let (next_start, _, next_dir) = offset_edges[i];
        match line_line_intersect_2d(&prev_end, &prev_dir, &next_start, &next_dir) {
            Some((t, _)) => {
                let miter = prev_end + prev_dir * t;
                if (miter - ring[i]).norm() > MITER_LIMIT * distance.abs() {
                    result.push(prev_end);
                    result.push(next_start);
                } else {
                    result.push(miter);
                }
            }
            // Collinear edges: both offset endpoints coincide.
            None => result.push(next_start),
        }
    }
    result.push(result[0]);
    Ok(result)
}
