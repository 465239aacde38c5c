//! Particle storage.
//!
//! The registry is owned by the [`Simulation`](crate::simulation::Simulation)
//! and handed to force models as an immutable snapshot of [`Neighbor`] rows.
//! Iteration order is insertion order, which is also the update order.

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::forces::ForceModel;
use crate::types::{ParticleId, ParticleState, Vec3};

/// What a force model may observe about another particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: ParticleId,
    pub pos: Vec3,
    pub vel: Vec3,
}

/// Description of a particle before it is registered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleSpec {
    pub position: Vec3,
    #[serde(default)]
    pub velocity: Vec3,
    pub mass: f64,
    /// Bounce coefficient; `None` (YAML `null`) disables hard wall collisions
    #[serde(default = "default_restitution")]
    pub restitution: Option<f64>,
    pub model: ForceModel,
}

fn default_restitution() -> Option<f64> {
    Some(1.0)
}

impl ParticleSpec {
    pub fn new(position: Vec3, velocity: Vec3, mass: f64, model: ForceModel) -> Self {
        Self {
            position,
            velocity,
            mass,
            restitution: default_restitution(),
            model,
        }
    }

    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = Some(restitution);
        self
    }

    /// No hard collisions: the particle is kept inside by its force model alone.
    pub fn soft_only(mut self) -> Self {
        self.restitution = None;
        self
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.mass > 0.0 && self.mass.is_finite()) {
            return Err(SimError::NonPositiveMass(self.mass));
        }
        if let Some(e) = self.restitution {
            if !(e >= 0.0 && e.is_finite()) {
                return Err(SimError::InvalidRestitution(e));
            }
        }
        self.model.validate()
    }
}

/// A live particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: ParticleId,
    pub state: ParticleState,
    pub mass: f64,
    pub restitution: Option<f64>,
    /// Cosmetic facing direction; has no effect on the physics
    pub heading: Vec3,
    pub model: ForceModel,
}

impl Particle {
    fn from_spec(id: ParticleId, spec: ParticleSpec) -> Self {
        let heading = match spec.velocity.normalized() {
            v if v == Vec3::ZERO => Vec3::Z,
            v => v,
        };
        Self {
            id,
            state: ParticleState::new(spec.position, spec.velocity),
            mass: spec.mass,
            restitution: spec.restitution,
            heading,
            model: spec.model,
        }
    }

    pub fn as_neighbor(&self) -> Neighbor {
        Neighbor {
            id: self.id,
            pos: self.state.pos,
            vel: self.state.vel,
        }
    }
}

/// Ordered collection of live particles.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    particles: Vec<Particle>,
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and registers a particle, returning its new id.
    pub fn insert(&mut self, spec: ParticleSpec) -> Result<ParticleId, SimError> {
        spec.validate()?;
        let id = ParticleId(self.next_id);
        self.next_id += 1;
        self.particles.push(Particle::from_spec(id, spec));
        Ok(id)
    }

    pub fn remove(&mut self, id: ParticleId) -> Option<Particle> {
        let index = self.index_of(id)?;
        Some(self.particles.remove(index))
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.iter_mut().find(|p| p.id == id)
    }

    pub fn index_of(&self, id: ParticleId) -> Option<usize> {
        self.particles.iter().position(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Position and velocity of every particle, in registry order.
    pub fn snapshot(&self) -> Vec<Neighbor> {
        self.particles.iter().map(Particle::as_neighbor).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
