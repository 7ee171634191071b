use std::f64::consts::TAU;

use super::{Point2, Vector2, TOLERANCE};
use crate::error::GeometryError;

/// Returns the vector from `a` to `b`.
#[must_use]
pub fn vector(a: &Point2, b: &Point2) -> Vector2 {
    b - a
}

/// Normalizes a vector to unit length.
///
/// # Errors
///
/// Returns `GeometryError::ZeroVector` if the vector has (near) zero length,
/// instead of producing NaN components.
pub fn normalize(v: &Vector2) -> Result<Vector2, GeometryError> {
    let len = v.norm();
    if len < TOLERANCE || !len.is_finite() {
        return Err(GeometryError::ZeroVector);
    }
    Ok(v / len)
}

/// Computes the unit direction from point `a` to point `b`.
///
/// # Errors
///
/// Returns `GeometryError::ZeroVector` if both points coincide.
pub fn normalized_vector(a: &Point2, b: &Point2) -> Result<Vector2, GeometryError> {
    normalize(&vector(a, b))
}

/// Z component of the 3D cross product of two planar vectors.
#[must_use]
pub fn cross(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Returns the left-pointing normal of a direction vector.
#[must_use]
pub fn left_normal(dir: &Vector2) -> Vector2 {
    Vector2::new(-dir.y, dir.x)
}

/// Signed angle in `(-π, π]` turning `from` onto `to`, positive counter-clockwise.
#[must_use]
pub fn signed_angle(from: &Vector2, to: &Vector2) -> f64 {
    cross(from, to).atan2(from.dot(to))
}

/// Polar angle of a vector.
#[must_use]
pub fn bearing(v: &Vector2) -> f64 {
    v.y.atan2(v.x)
}

/// Wraps an angle into `[0, 2π)`.
#[must_use]
pub fn angle_modulo(a: f64) -> f64 {
    let r = a.rem_euclid(TAU);
    // rem_euclid may round up to exactly TAU for tiny negative inputs.
    if r >= TAU {
        0.0
    } else {
        r
    }
}

/// Circular mean of two angles, wrapped into `[0, 2π)`.
///
/// When the angles are diametrically opposed the mean is undefined and the
/// first angle is returned.
#[must_use]
pub fn circular_mean(a1: f64, a2: f64) -> f64 {
    let s = a1.sin() + a2.sin();
    let c = a1.cos() + a2.cos();
    if s.hypot(c) < TOLERANCE {
        return angle_modulo(a1);
    }
    angle_modulo(s.atan2(c))
}
