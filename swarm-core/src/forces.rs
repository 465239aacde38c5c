//! Force models acting on particles.
//!
//! Each particle carries one [`ForceModel`] variant with its own parameters:
//!
//! - **Flocking**: separation, alignment and cohesion steering plus a soft
//!   repulsion from every boundary facet
//! - **FieldAndAttractors**: uniform gravity, linear drag and inverse-cube
//!   pulls toward active attractor points
//! - **PairwiseRepulsion**: inverse-square push away from every other particle
//!
//! ## Steering
//!
//! Flocking terms are first accumulated as a raw "where I want to go" vector,
//! then turned into a force:
//!
//! ```text
//! steer = clamp(normalize(raw) * max_speed - velocity, max_force)
//! ```
//!
//! A zero raw vector gives a zero force.
//!
//! Forces are evaluated for an explicit `(position, velocity)` pair rather
//! than the particle's stored state, so the collision resolver can
//! re-evaluate them at a crossing point.

use serde::{Deserialize, Serialize};

use crate::boundary::Boundary;
use crate::error::SimError;
use crate::registry::Neighbor;
use crate::types::{constants, ParticleId, ParticleState, Vec3};

/// Facets closer than this push with a constant strong force instead of `1/d²`.
const BOUNDARY_NEAR_DISTANCE: f64 = 1e-2;

/// Push strength used for facets inside [`BOUNDARY_NEAR_DISTANCE`].
const BOUNDARY_NEAR_PUSH: f64 = 100.0;

/// Separation ignores neighbors closer than this (coincident points have no direction).
const SEPARATION_MIN_DISTANCE: f64 = 1e-6;

// =============================================================================
// Attractors
// =============================================================================

/// A point source pulling particles toward it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attractor {
    pub position: Vec3,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Attractor {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            active: true,
        }
    }
}

/// All attractors of a simulation, sharing one strength coefficient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttractorField {
    pub strength: f64,
    #[serde(default)]
    pub points: Vec<Attractor>,
}

impl AttractorField {
    pub fn new(strength: f64) -> Self {
        Self {
            strength,
            points: Vec::new(),
        }
    }

    pub fn with_attractor(mut self, attractor: Attractor) -> Self {
        self.points.push(attractor);
        self
    }

    pub fn active(&self) -> impl Iterator<Item = &Attractor> {
        self.points.iter().filter(|a| a.active)
    }

    /// Sum of `strength * d / (|d|³ + ε)` over active attractors, `d = attractor - position`.
    pub fn pull(&self, position: Vec3) -> Vec3 {
        let mut total = Vec3::ZERO;
        for attractor in self.active() {
            let d = attractor.position - position;
            let dist = d.magnitude();
            total += d * (self.strength / (dist * dist * dist + constants::KERNEL_EPSILON));
        }
        total
    }
}

// =============================================================================
// Force model parameters
// =============================================================================

/// Boid steering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockingParams {
    pub max_speed: f64,
    pub max_force: f64,
    /// How quickly the cosmetic heading turns toward the velocity (1/s)
    pub rotate_speed: f64,
    pub separation_coeff: f64,
    pub alignment_coeff: f64,
    pub cohesion_coeff: f64,
    pub boundaries_coeff: f64,
    pub desired_separation: f64,
    pub neighbor_dist: f64,
}

impl Default for FlockingParams {
    fn default() -> Self {
        Self {
            max_speed: 2.0,
            max_force: 0.5,
            rotate_speed: 4.0,
            separation_coeff: 1.5,
            alignment_coeff: 1.0,
            cohesion_coeff: 1.0,
            boundaries_coeff: 2.0,
            desired_separation: 0.5,
            neighbor_dist: 1.5,
        }
    }
}

/// Gravity, drag and attractor parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldParams {
    #[serde(default)]
    pub drag: f64,
    #[serde(default = "default_gravity")]
    pub gravity: Vec3,
}

fn default_gravity() -> Vec3 {
    Vec3::new(0.0, -constants::GRAVITY, 0.0)
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            drag: 0.0,
            gravity: default_gravity(),
        }
    }
}

/// Mutual inverse-square repulsion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RepulsionParams {
    pub coeff: f64,
}

/// The force law a particle obeys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForceModel {
    Flocking(FlockingParams),
    FieldAndAttractors(FieldParams),
    PairwiseRepulsion(RepulsionParams),
}

/// Everything outside the particle itself that a force model may read.
#[derive(Debug, Clone, Copy)]
pub struct ForceContext<'a> {
    pub neighbors: &'a [Neighbor],
    pub attractors: &'a AttractorField,
    pub boundary: &'a Boundary,
}

impl ForceModel {
    /// Net force on particle `id` in `state`.
    pub fn force(&self, id: ParticleId, state: &ParticleState, mass: f64, ctx: &ForceContext<'_>) -> Vec3 {
        match self {
            ForceModel::Flocking(params) => flocking_force(params, id, state, ctx),
            ForceModel::FieldAndAttractors(params) => {
                params.gravity * mass - state.vel * params.drag + ctx.attractors.pull(state.pos)
            }
            ForceModel::PairwiseRepulsion(params) => repulsion_force(params, id, state.pos, ctx.neighbors),
        }
    }

    /// Heading turn rate, for models that carry one.
    pub fn rotate_speed(&self) -> Option<f64> {
        match self {
            ForceModel::Flocking(params) => Some(params.rotate_speed),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let check = |name: &'static str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(SimError::InvalidParameter { name, value })
            }
        };

        match self {
            ForceModel::Flocking(p) => {
                check("max_speed", p.max_speed)?;
                check("max_force", p.max_force)?;
                check("rotate_speed", p.rotate_speed)?;
                check("desired_separation", p.desired_separation)?;
                check("neighbor_dist", p.neighbor_dist)
            }
            ForceModel::FieldAndAttractors(p) => {
                check("drag", p.drag)?;
                if p.gravity.is_finite() {
                    Ok(())
                } else {
                    Err(SimError::InvalidParameter {
                        name: "gravity",
                        value: p.gravity.magnitude(),
                    })
                }
            }
            ForceModel::PairwiseRepulsion(p) => {
                if p.coeff.is_finite() {
                    Ok(())
                } else {
                    Err(SimError::InvalidParameter {
                        name: "coeff",
                        value: p.coeff,
                    })
                }
            }
        }
    }
}

// =============================================================================
// Flocking
// =============================================================================

/// Turns a desired direction into a force bounded by `max_force`.
pub fn steering_force(desired: Vec3, velocity: Vec3, max_speed: f64, max_force: f64) -> Vec3 {
    let mag = desired.magnitude();
    if mag == 0.0 {
        return Vec3::ZERO;
    }
    (desired / mag * max_speed - velocity).clamp_magnitude(max_force)
}

fn flocking_force(params: &FlockingParams, id: ParticleId, state: &ParticleState, ctx: &ForceContext<'_>) -> Vec3 {
    separation(params, id, state, ctx.neighbors) * params.separation_coeff
        + alignment(params, id, state, ctx.neighbors) * params.alignment_coeff
        + cohesion(params, id, state, ctx.neighbors) * params.cohesion_coeff
        + boundary_repulsion(params, state, ctx.boundary) * params.boundaries_coeff
}

fn others(id: ParticleId, neighbors: &[Neighbor]) -> impl Iterator<Item = &Neighbor> {
    neighbors.iter().filter(move |n| n.id != id)
}

fn separation(params: &FlockingParams, id: ParticleId, state: &ParticleState, neighbors: &[Neighbor]) -> Vec3 {
    let mut dir = Vec3::ZERO;
    for other in others(id, neighbors) {
        let dist = state.pos.distance(&other.pos);
        if dist < SEPARATION_MIN_DISTANCE || dist >= params.desired_separation {
            continue;
        }
        // Nearer neighbors push harder
        dir += (state.pos - other.pos).normalized() / dist;
    }
    steering_force(dir, state.vel, params.max_speed, params.max_force)
}

fn alignment(params: &FlockingParams, id: ParticleId, state: &ParticleState, neighbors: &[Neighbor]) -> Vec3 {
    let mut heading = Vec3::ZERO;
    for other in others(id, neighbors) {
        let dist = state.pos.distance(&other.pos);
        if dist == 0.0 || dist >= params.neighbor_dist {
            continue;
        }
        heading += other.vel;
    }
    steering_force(heading, state.vel, params.max_speed, params.max_force)
}

fn cohesion(params: &FlockingParams, id: ParticleId, state: &ParticleState, neighbors: &[Neighbor]) -> Vec3 {
    let mut center = Vec3::ZERO;
    let mut count = 0usize;
    for other in others(id, neighbors) {
        let dist = state.pos.distance(&other.pos);
        if dist == 0.0 || dist >= params.neighbor_dist {
            continue;
        }
        center += other.pos;
        count += 1;
    }
    if count == 0 {
        return Vec3::ZERO;
    }
    let center = center / count as f64;
    steering_force(center - state.pos, state.vel, params.max_speed, params.max_force)
}

fn boundary_repulsion(params: &FlockingParams, state: &ParticleState, boundary: &Boundary) -> Vec3 {
    let mut push = Vec3::ZERO;
    for facet in 0..boundary.facet_count() {
        let normal = boundary.normal(facet, state.pos);
        let dist = boundary.signed_distance(state.pos, facet);
        if dist > BOUNDARY_NEAR_DISTANCE {
            push += normal / (dist * dist);
        } else {
            push += normal * BOUNDARY_NEAR_PUSH;
        }
    }
    steering_force(push, state.vel, params.max_speed, params.max_force)
}

// =============================================================================
// Pairwise repulsion
// =============================================================================

/// Repulsion exerted on a particle at `pos` by a single other particle at `other`.
pub fn repulsion_kernel(coeff: f64, pos: Vec3, other: Vec3) -> Vec3 {
    let d = pos - other;
    d * (coeff / (d.magnitude_squared() + constants::KERNEL_EPSILON))
}

fn repulsion_force(params: &RepulsionParams, id: ParticleId, pos: Vec3, neighbors: &[Neighbor]) -> Vec3 {
    let mut total = Vec3::ZERO;
    for other in others(id, neighbors) {
        total += repulsion_kernel(params.coeff, pos, other.pos);
    }
    total
}

// =============================================================================
// Per-particle force field
// =============================================================================

/// Source of acceleration for the integrator.
///
/// Implementations provide the physics model for one particle.
pub trait ForceField {
    /// Acceleration of the particle when it is in `state`.
    fn acceleration(&self, state: &ParticleState) -> Vec3;
}

/// A particle's force model bound to its mass and the current neighbor context.
pub struct ParticleForces<'a> {
    pub id: ParticleId,
    pub mass: f64,
    pub model: &'a ForceModel,
    pub ctx: ForceContext<'a>,
}

impl ForceField for ParticleForces<'_> {
    fn acceleration(&self, state: &ParticleState) -> Vec3 {
        self.model.force(self.id, state, self.mass, &self.ctx) / self.mass
    }
}

// =============================================================================
// Tests
// =============================================================================
