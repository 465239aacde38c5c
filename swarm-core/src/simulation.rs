//! Simulation driver.
//!
//! Owns the boundary, the attractors and the particle registry, and advances
//! every particle by one increment per [`Simulation::step`] call, in registry
//! order.
//!
//! ## Neighbor reads
//!
//! Force models that look at other particles read a snapshot taken at the
//! start of the tick. With [`NeighborReads::Sequential`] a particle's row in
//! that snapshot is overwritten as soon as it has been advanced, so particles
//! later in the order see its current-tick state:
//!
//! ```text
//! Snapshot:   p0 p1 p2 all read tick-start rows
//! Sequential: p1 reads p0(new) p2(old); p2 reads p0(new) p1(new)
//! ```

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::boundary::Boundary;
use crate::collision::{CollisionEvent, CollisionResolver};
use crate::error::SimError;
use crate::forces::{AttractorField, ForceContext, ParticleForces};
use crate::registry::{Particle, ParticleSpec, Registry};
use crate::types::{ParticleId, ParticleState, Vec3};

/// Which state of other particles a force model observes during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborReads {
    /// Everyone reads the state from the start of the tick
    #[default]
    Snapshot,
    /// Particles see the already-advanced state of those updated before them
    Sequential,
}

/// Per-particle output handed to observers after each step.
#[derive(Debug, Clone, Copy)]
pub struct ParticleReport<'a> {
    pub id: ParticleId,
    pub state: ParticleState,
    pub acceleration: Vec3,
    /// Acceleration along the direction of travel
    pub forward_acceleration: f64,
    pub heading: Vec3,
    pub collisions: &'a [CollisionEvent],
}

/// Receives per-particle output; animation or audio cue policies live here.
pub trait StepObserver {
    fn on_particle_step(&mut self, report: &ParticleReport<'_>);
}

impl<F: FnMut(&ParticleReport<'_>)> StepObserver for F {
    fn on_particle_step(&mut self, report: &ParticleReport<'_>) {
        self(report)
    }
}

/// Aggregate result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepSummary {
    pub tick: u64,
    pub dt: f64,
    pub collisions: usize,
    /// Particles whose resolution stopped at the iteration cap
    pub capped: usize,
    /// Deepest penetration past the boundary after the tick
    pub max_violation: f64,
}

/// A bounded particle simulation.
#[derive(Debug, Clone)]
pub struct Simulation {
    boundary: Boundary,
    attractors: AttractorField,
    registry: Registry,
    resolver: CollisionResolver,
    neighbor_reads: NeighborReads,
    time: f64,
    ticks: u64,
}

impl Simulation {
    pub fn new(boundary: Boundary, attractors: AttractorField) -> Result<Self, SimError> {
        boundary.validate()?;
        Ok(Self {
            boundary,
            attractors,
            registry: Registry::new(),
            resolver: CollisionResolver::default(),
            neighbor_reads: NeighborReads::default(),
            time: 0.0,
            ticks: 0,
        })
    }

    pub fn with_neighbor_reads(mut self, neighbor_reads: NeighborReads) -> Self {
        self.neighbor_reads = neighbor_reads;
        self
    }

    /// Registers a particle. Its starting position must be inside the boundary.
    pub fn spawn(&mut self, spec: ParticleSpec) -> Result<ParticleId, SimError> {
        if !self.boundary.contains(spec.position, 0.0) {
            return Err(SimError::OutsideBoundary(spec.position));
        }
        let id = self.registry.insert(spec)?;
        trace!("spawned particle {} at {}", id, spec.position);
        Ok(id)
    }

    pub fn despawn(&mut self, id: ParticleId) -> Result<Particle, SimError> {
        self.registry.remove(id).ok_or(SimError::UnknownParticle(id))
    }

    /// Advance every particle by `dt`.
    pub fn step(&mut self, dt: f64) -> Result<StepSummary, SimError> {
        self.step_observed(dt, &mut |_: &ParticleReport<'_>| {})
    }

    /// Advance every particle by `dt`, reporting each one to `observer`.
    pub fn step_observed<O: StepObserver + ?Sized>(
        &mut self,
        dt: f64,
        observer: &mut O,
    ) -> Result<StepSummary, SimError> {
        if !(dt >= 0.0 && dt.is_finite()) {
            return Err(SimError::InvalidTimeStep(dt));
        }

        let mut summary = StepSummary {
            tick: self.ticks + 1,
            dt,
            ..StepSummary::default()
        };

        let boundary = &self.boundary;
        let attractors = &self.attractors;
        let resolver = self.resolver;
        let sequential = self.neighbor_reads == NeighborReads::Sequential;
        let mut snapshot = self.registry.snapshot();

        for (index, particle) in self.registry.particles_mut().iter_mut().enumerate() {
            let outcome = {
                let forces = ParticleForces {
                    id: particle.id,
                    mass: particle.mass,
                    model: &particle.model,
                    ctx: ForceContext {
                        neighbors: &snapshot,
                        attractors,
                        boundary,
                    },
                };
                match particle.restitution {
                    Some(restitution) => resolver.step(boundary, &particle.state, restitution, &forces, dt),
                    None => CollisionResolver::advance_free(&particle.state, &forces, dt),
                }
            };

            particle.state = outcome.state;
            if let Some(rate) = particle.model.rotate_speed() {
                particle.heading = turn_heading(particle.heading, particle.state.vel, rate * dt);
            }
            if sequential {
                snapshot[index] = particle.as_neighbor();
            }

            summary.collisions += outcome.collisions.len();
            if outcome.capped {
                summary.capped += 1;
            }
            summary.max_violation = summary.max_violation.max(boundary.violation(particle.state.pos));

            observer.on_particle_step(&ParticleReport {
                id: particle.id,
                state: particle.state,
                acceleration: outcome.acceleration,
                forward_acceleration: outcome.acceleration.dot(&particle.state.vel.normalized()),
                heading: particle.heading,
                collisions: &outcome.collisions,
            });
        }

        self.time += dt;
        self.ticks += 1;

        debug!(
            "tick {} (t={:.4}): {} particles, {} bounces, {} capped, max violation {:e}",
            summary.tick,
            self.time,
            self.registry.len(),
            summary.collisions,
            summary.capped,
            summary.max_violation
        );

        Ok(summary)
    }

    /// Run `ticks` increments of `dt`.
    pub fn run(&mut self, dt: f64, ticks: usize) -> Result<Vec<StepSummary>, SimError> {
        (0..ticks).map(|_| self.step(dt)).collect()
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.registry.get(id)
    }

    pub fn attractors(&self) -> &AttractorField {
        &self.attractors
    }

    /// Attractors may be moved or toggled between ticks.
    pub fn attractors_mut(&mut self) -> &mut AttractorField {
        &mut self.attractors
    }

    pub fn neighbor_reads(&self) -> NeighborReads {
        self.neighbor_reads
    }

    pub fn set_neighbor_reads(&mut self, neighbor_reads: NeighborReads) {
        self.neighbor_reads = neighbor_reads;
    }

    pub fn set_resolver(&mut self, resolver: CollisionResolver) {
        self.resolver = resolver;
    }
}

/// Turn `heading` toward the direction of `velocity` by interpolation factor `t`.
fn turn_heading(heading: Vec3, velocity: Vec3, t: f64) -> Vec3 {
    let target = velocity.normalized();
    if target == Vec3::ZERO {
        return heading;
    }
    match heading.lerp(&target, t.clamp(0.0, 1.0)).normalized() {
        // Exactly opposite directions cancel halfway; snap instead
        v if v == Vec3::ZERO => target,
        v => v,
    }
}

// =============================================================================
// Tests
// =============================================================================
