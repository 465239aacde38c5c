//! Static containment geometry.
//!
//! A boundary is a set of facets. Every facet has a normal pointing **into**
//! the valid region, so a signed distance `>= 0` means the point is on the
//! collision-free side and `< 0` means it has penetrated.
//!
//! ```text
//! Box facet order:
//!   0: +X  1: +Y  2: +Z   (plane through the min corner)
//!   3: -X  4: -Y  5: -Z   (plane through the max corner)
//! ```
//!
//! A sphere has a single facet whose normal depends on where it is queried.

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::geometry::{distance_from_plane, line_plane_parameter, line_sphere_parameters};
use crate::types::{constants, Vec3};

/// Axis-aligned box between two corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxBoundary {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoxBoundary {
    pub const FACETS: usize = 6;

    pub fn new(min: Vec3, max: Vec3) -> Result<Self, SimError> {
        let boundary = Self { min, max };
        boundary.validate()?;
        Ok(boundary)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let ordered = self.min.x < self.max.x && self.min.y < self.max.y && self.min.z < self.max.z;
        if !ordered || !self.min.is_finite() || !self.max.is_finite() {
            return Err(SimError::DegenerateBox {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    fn normal(facet: usize) -> Vec3 {
        match facet {
            0 => Vec3::X,
            1 => Vec3::Y,
            2 => Vec3::Z,
            3 => -Vec3::X,
            4 => -Vec3::Y,
            5 => -Vec3::Z,
            _ => panic!("box facet index {facet} out of range 0..6"),
        }
    }

    fn point_on_facet(&self, facet: usize) -> Vec3 {
        assert!(facet < Self::FACETS, "box facet index {facet} out of range 0..6");
        if facet < 3 {
            self.min
        } else {
            self.max
        }
    }
}

/// Solid sphere; particles live inside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereBoundary {
    pub center: Vec3,
    pub radius: f64,
}

impl SphereBoundary {
    pub fn new(center: Vec3, radius: f64) -> Result<Self, SimError> {
        let boundary = Self { center, radius };
        boundary.validate()?;
        Ok(boundary)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.radius > 0.0 && self.radius.is_finite()) || !self.center.is_finite() {
            return Err(SimError::NonPositiveRadius(self.radius));
        }
        Ok(())
    }
}

/// Containment geometry for a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Boundary {
    Box(BoxBoundary),
    Sphere(SphereBoundary),
}

impl Boundary {
    pub fn cube(min: Vec3, max: Vec3) -> Result<Self, SimError> {
        BoxBoundary::new(min, max).map(Boundary::Box)
    }

    pub fn sphere(center: Vec3, radius: f64) -> Result<Self, SimError> {
        SphereBoundary::new(center, radius).map(Boundary::Sphere)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        match self {
            Boundary::Box(b) => b.validate(),
            Boundary::Sphere(s) => s.validate(),
        }
    }

    /// Number of facets collisions are tested against.
    pub fn facet_count(&self) -> usize {
        match self {
            Boundary::Box(_) => BoxBoundary::FACETS,
            Boundary::Sphere(_) => 1,
        }
    }

    /// Inward unit normal of `facet`, evaluated at `at`.
    ///
    /// `at` only matters for the sphere. Panics on an out-of-range facet.
    pub fn normal(&self, facet: usize, at: Vec3) -> Vec3 {
        match self {
            Boundary::Box(_) => BoxBoundary::normal(facet),
            Boundary::Sphere(s) => {
                assert_eq!(facet, 0, "sphere has a single facet");
                (s.center - at).normalized()
            }
        }
    }

    /// Reference point of `facet`: a box corner, or the sphere center.
    pub fn point_on_facet(&self, facet: usize) -> Vec3 {
        match self {
            Boundary::Box(b) => b.point_on_facet(facet),
            Boundary::Sphere(s) => {
                assert_eq!(facet, 0, "sphere has a single facet");
                s.center
            }
        }
    }

    /// Signed distance of `point` from `facet`; negative means penetrating.
    pub fn signed_distance(&self, point: Vec3, facet: usize) -> f64 {
        match self {
            Boundary::Box(b) => {
                distance_from_plane(point, BoxBoundary::normal(facet), b.point_on_facet(facet))
            }
            Boundary::Sphere(s) => {
                assert_eq!(facet, 0, "sphere has a single facet");
                s.radius - point.distance(&s.center)
            }
        }
    }

    /// Where the segment `from → to` leaves the valid side of `facet`.
    ///
    /// `None` when `to` is still on the valid side (penetrations within
    /// [`constants::CONTACT_TOLERANCE`] count as touching), or when the segment
    /// runs parallel to a box face. The returned point lies on the segment; a
    /// segment starting outside reports its own start.
    pub fn crossing(&self, facet: usize, from: Vec3, to: Vec3) -> Option<Vec3> {
        if self.signed_distance(to, facet) >= -constants::CONTACT_TOLERANCE {
            return None;
        }

        let t = match self {
            Boundary::Box(b) => line_plane_parameter(
                b.point_on_facet(facet),
                BoxBoundary::normal(facet),
                from,
                to,
            )?,
            Boundary::Sphere(s) => {
                if self.signed_distance(from, facet) < -constants::CONTACT_TOLERANCE {
                    return Some(from);
                }
                // A start on the surface with a grazing line may miss by rounding
                line_sphere_parameters(from, to, s.center, s.radius).map_or(0.0, |(_, exit)| exit)
            }
        };
        Some(from + (to - from) * t.clamp(0.0, 1.0))
    }

    /// Time until a straight path leaving `point` on `facet` with `velocity`
    /// reaches the facet again.
    ///
    /// `None` for flat box faces, which a path never meets twice. On a sphere
    /// this is the chord time, zero when the path does not head inward.
    pub fn revisit_time(&self, facet: usize, point: Vec3, velocity: Vec3) -> Option<f64> {
        match self {
            Boundary::Box(_) => None,
            Boundary::Sphere(s) => {
                assert_eq!(facet, 0, "sphere has a single facet");
                let inward = (s.center - point).dot(&velocity);
                if inward <= 0.0 {
                    return Some(0.0);
                }
                Some(2.0 * inward / velocity.magnitude_squared())
            }
        }
    }

    /// Closest valid point to `point`; `point` itself when already inside.
    pub fn project_inside(&self, point: Vec3) -> Vec3 {
        match self {
            Boundary::Box(b) => Vec3::new(
                point.x.clamp(b.min.x, b.max.x),
                point.y.clamp(b.min.y, b.max.y),
                point.z.clamp(b.min.z, b.max.z),
            ),
            Boundary::Sphere(s) => {
                let offset = point - s.center;
                let dist = offset.magnitude();
                if dist <= s.radius {
                    point
                } else {
                    s.center + offset * (s.radius / dist)
                }
            }
        }
    }

    /// Smallest signed distance over all facets.
    pub fn min_signed_distance(&self, point: Vec3) -> f64 {
        (0..self.facet_count())
            .map(|facet| self.signed_distance(point, facet))
            .fold(f64::INFINITY, f64::min)
    }

    /// How far `point` has penetrated past the boundary (0 when inside).
    pub fn violation(&self, point: Vec3) -> f64 {
        (-self.min_signed_distance(point)).max(0.0)
    }

    pub fn contains(&self, point: Vec3, tolerance: f64) -> bool {
        self.min_signed_distance(point) >= -tolerance
    }
}

// =============================================================================
// Tests
// =============================================================================
