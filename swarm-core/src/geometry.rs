//! Plane and sphere intersection primitives.
//!
//! Pure functions over [`Vec3`]; the boundary model builds its facet queries
//! on top of these.

use crate::types::{constants, Vec3};

/// Signed distance of `point` from the plane through `plane_point` with unit `normal`.
///
/// Positive on the side the normal points to.
pub fn distance_from_plane(point: Vec3, normal: Vec3, plane_point: Vec3) -> f64 {
    (point - plane_point).dot(&normal)
}

/// Parameter `t` along `p1 → p2` where the line meets the plane.
///
/// Returns `None` when the line is parallel to the plane.
pub fn line_plane_parameter(plane_point: Vec3, normal: Vec3, p1: Vec3, p2: Vec3) -> Option<f64> {
    let line = p2 - p1;
    let denom = line.dot(&normal);
    if denom.abs() < constants::EPSILON {
        return None;
    }
    Some((plane_point - p1).dot(&normal) / denom)
}

/// Point where the line through `p1` and `p2` crosses the plane.
///
/// Uses the ratio of signed distances; `None` for a (near-)parallel line.
pub fn line_plane_intersection(plane_point: Vec3, normal: Vec3, p1: Vec3, p2: Vec3) -> Option<Vec3> {
    line_plane_parameter(plane_point, normal, p1, p2).map(|t| p1 + (p2 - p1) * t)
}

/// Parameters `(t_enter, t_exit)` where the line `p1 + t * (p2 - p1)` meets a sphere.
///
/// `t_enter <= t_exit`; the segment itself is `0 <= t <= 1`. Returns `None`
/// when the line misses the sphere or `p1 == p2`.
pub fn line_sphere_parameters(p1: Vec3, p2: Vec3, center: Vec3, radius: f64) -> Option<(f64, f64)> {
    let d = p2 - p1;
    let a = d.magnitude_squared();
    if a == 0.0 {
        return None;
    }
    let f = p1 - center;
    let b = f.dot(&d);
    let c = f.magnitude_squared() - radius * radius;
    let discriminant = b * b - a * c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    Some(((-b - root) / a, (-b + root) / a))
}

// =============================================================================
// Tests
// =============================================================================
