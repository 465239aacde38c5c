//! Collision resolution.
//!
//! Computes the post-bounce velocity and finishes the time increment from
//! the crossing point.
//!
//! ## Model Assumptions
//!
//! - **Static boundary**: walls never move and absorb no momentum.
//! - **Frictionless contact**: the tangential velocity survives the bounce
//!   unchanged; only the normal part is flipped and scaled by the particle's
//!   restitution coefficient.
//! - **Instantaneous bounce**: the particle spends no time in contact.
//!
//! ```text
//!     v_before = v_n + v_t
//!     v_after  = -e * v_n + v_t
//! ```
//!
//! ## Resting contact
//!
//! On a curved wall an inelastic particle can bounce ever closer together
//! without reaching the end of the increment (it also happens for a particle
//! sliding along the sphere under gravity). When the bounces still possible
//! within the iteration cap cannot cover the time left, or a bounce happens at
//! the very start of a segment, a re-advanced state that is still outside the
//! same facet is settled: projected back onto the boundary with its outward
//! normal velocity removed. The same settling is applied when the cap is hit
//! with a crossing still pending, so a committed state is never left outside.

use log::warn;

use crate::boundary::Boundary;
use crate::collision::detection::{CollisionDetector, Crossing};
use crate::forces::ForceField;
use crate::integrator::Euler;
use crate::types::{constants, ParticleState, Vec3};

/// Reflect `velocity` off a surface with unit inward `normal`.
///
/// Only a velocity heading into the surface is reflected; one already moving
/// away is returned unchanged.
pub fn reflect(velocity: Vec3, normal: Vec3, restitution: f64) -> Vec3 {
    let (normal_part, tangent_part) = velocity.decompose(&normal);
    if velocity.dot(&normal) >= 0.0 {
        return velocity;
    }
    normal_part * (-restitution) + tangent_part
}

/// Put `state` back on the valid side of `facet` and drop any velocity
/// still pointing out through it.
fn settle(boundary: &Boundary, facet: usize, state: &ParticleState) -> ParticleState {
    let pos = boundary.project_inside(state.pos);
    let normal = boundary.normal(facet, pos);
    let outward = state.vel.dot(&normal);
    let vel = if outward < 0.0 {
        state.vel - normal * outward
    } else {
        state.vel
    };
    ParticleState::new(pos, vel)
}

/// One bounce resolved during a particle step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub facet: usize,
    pub point: Vec3,
    pub normal: Vec3,
    /// Time from the start of the sub-step that produced this bounce
    pub time: f64,
    /// Time from the start of the whole increment
    pub elapsed: f64,
    pub velocity_before: Vec3,
    pub velocity_after: Vec3,
    /// State after re-advancing from the crossing over the remaining time,
    /// settled onto the boundary if it stayed outside
    pub resumed: ParticleState,
}

/// Everything that happened to one particle in one increment.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Committed state
    pub state: ParticleState,
    /// Acceleration of the initial tentative advance
    pub acceleration: Vec3,
    pub collisions: Vec<CollisionEvent>,
    pub iterations: usize,
    /// The iteration cap stopped the resolver with a crossing still pending
    pub capped: bool,
}

/// Iterative collision resolver.
#[derive(Debug, Clone, Copy)]
pub struct CollisionResolver {
    pub max_iterations: usize,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self {
            max_iterations: constants::MAX_COLLISION_ITERATIONS,
        }
    }
}

impl CollisionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    /// Advance a particle by `dt`, resolving every boundary crossing on the way.
    ///
    /// # Arguments
    /// * `boundary` - Containment geometry
    /// * `start` - State at the beginning of the increment
    /// * `restitution` - Fraction of normal speed kept after a bounce
    /// * `forces` - Force field, re-evaluated at each crossing state
    /// * `dt` - Time increment
    ///
    /// # Returns
    /// The committed state with the list of bounces. Hitting the iteration cap
    /// is not an error: the last tentative state is settled onto the boundary
    /// and accepted.
    pub fn step<F: ForceField + ?Sized>(
        &self,
        boundary: &Boundary,
        start: &ParticleState,
        restitution: f64,
        forces: &F,
        dt: f64,
    ) -> StepOutcome {
        let mut outcome = Self::advance_free(start, forces, dt);

        let mut from = start.pos;
        let mut remaining = dt;
        let mut elapsed = 0.0;

        while outcome.iterations < self.max_iterations {
            let Some(crossing) = CollisionDetector::detect(boundary, from, outcome.state.pos, remaining) else {
                return outcome;
            };

            let mut event = Self::bounce(&crossing, from, &outcome.state, remaining, elapsed, restitution, forces);
            outcome.iterations += 1;

            let left = (remaining - crossing.time).max(0.0);
            let still_outside = boundary.signed_distance(event.resumed.pos, crossing.facet) < -constants::CONTACT_TOLERANCE;
            if still_outside
                && (crossing.time <= 0.0
                    || !Self::bounces_cover(boundary, &event, restitution, left, self.max_iterations - outcome.iterations))
            {
                event.resumed = settle(boundary, crossing.facet, &event.resumed);
            }

            from = crossing.point;
            remaining = left;
            elapsed = event.elapsed;
            outcome.state = event.resumed;
            outcome.collisions.push(event);
        }

        if let Some(pending) = CollisionDetector::detect(boundary, from, outcome.state.pos, remaining) {
            outcome.capped = true;
            warn!(
                "collision resolution hit the {} iteration cap; settling state at {} (violation {:e})",
                self.max_iterations,
                outcome.state.pos,
                boundary.violation(outcome.state.pos)
            );
            outcome.state = settle(boundary, pending.facet, &outcome.state);
        }

        outcome
    }

    /// Advance by `dt` with no boundary handling at all.
    ///
    /// Used for particles without hard collisions, which are kept inside by
    /// their force model alone.
    pub fn advance_free<F: ForceField + ?Sized>(start: &ParticleState, forces: &F, dt: f64) -> StepOutcome {
        let tentative = Euler::step(start, forces, dt);
        StepOutcome {
            state: tentative.state,
            acceleration: tentative.acceleration,
            collisions: Vec::new(),
            iterations: 0,
            capped: false,
        }
    }

    /// Whether the bounces left in the budget can carry the particle through
    /// `left` seconds after `event`.
    ///
    /// Each bounce off a curved facet comes one chord time after the last,
    /// shrinking by the restitution factor. Flat facets never need this.
    fn bounces_cover(
        boundary: &Boundary,
        event: &CollisionEvent,
        restitution: f64,
        left: f64,
        budget: usize,
    ) -> bool {
        let Some(chord) = boundary.revisit_time(event.facet, event.point, event.velocity_after) else {
            return true;
        };
        let bounces = budget as f64;
        let span = if (restitution - 1.0).abs() < constants::EPSILON {
            chord * bounces
        } else {
            chord * (1.0 - restitution.powf(bounces)) / (1.0 - restitution)
        };
        span >= left
    }

    /// Reflect at `crossing` and re-advance over what is left of `remaining`.
    fn bounce<F: ForceField + ?Sized>(
        crossing: &Crossing,
        from: Vec3,
        tentative: &ParticleState,
        remaining: f64,
        elapsed: f64,
        restitution: f64,
        forces: &F,
    ) -> CollisionEvent {
        // Velocity actually travelled along the segment
        let velocity_before = (tentative.pos - from) / remaining;
        let velocity_after = reflect(velocity_before, crossing.normal, restitution);

        let at_crossing = ParticleState::new(crossing.point, velocity_after);
        let left = (remaining - crossing.time).max(0.0);
        let resumed = Euler::step(&at_crossing, forces, left).state;

        CollisionEvent {
            facet: crossing.facet,
            point: crossing.point,
            normal: crossing.normal,
            time: crossing.time,
            elapsed: elapsed + crossing.time,
            velocity_before,
            velocity_after,
            resumed,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
