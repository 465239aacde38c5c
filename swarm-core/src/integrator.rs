//! Tentative advance of a particle over one time increment.
//!
//! ## Algorithm
//!
//! A single force evaluation per advance:
//!
//! ```text
//! 1. a = F(x, v) / m
//! 2. x_new = x + v*dt
//! 3. v_new = v + a*dt
//! ```
//!
//! The position uses the velocity from the start of the increment. The result
//! is only tentative: the collision resolver may cut it short at a boundary
//! and re-advance from the crossing state.

use crate::forces::ForceField;
use crate::types::{ParticleState, Vec3};

/// Result of an integration step, containing the new state and the acceleration used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationResult {
    pub state: ParticleState,
    pub acceleration: Vec3,
}

/// Euler integrator.
pub struct Euler;

impl Euler {
    /// Advance `state` by `dt` under `forces`.
    pub fn step<F: ForceField + ?Sized>(state: &ParticleState, forces: &F, dt: f64) -> IntegrationResult {
        let acceleration = forces.acceleration(state);

        IntegrationResult {
            state: ParticleState {
                pos: state.pos + state.vel * dt,
                vel: state.vel + acceleration * dt,
            },
            acceleration,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Simple gravity-only force field for testing
    struct GravityOnly;

    impl ForceField for GravityOnly {
        fn acceleration(&self, _state: &ParticleState) -> Vec3 {
            Vec3::new(0.0, -9.807, 0.0)
        }
    }

    /// Linear spring toward the origin
    struct Spring(f64);

    impl ForceField for Spring {
        fn acceleration(&self, state: &ParticleState) -> Vec3 {
            -state.pos * self.0
        }
    }

    #[test]
    fn test_position_uses_old_velocity() {
        let initial = ParticleState::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let result = Euler::step(&initial, &GravityOnly, 0.5);

        assert_relative_eq!(result.state.pos.x, 1.0);
        assert_relative_eq!(result.state.pos.y, 1.0); // gravity not yet applied to position
        assert_relative_eq!(result.state.vel.y, -9.807 * 0.5);
        assert_relative_eq!(result.acceleration.y, -9.807);
    }

    #[test]
    fn test_zero_dt_is_identity() {
        let initial = ParticleState::new(Vec3::new(0.1, 0.2, 0.3), Vec3::new(-4.0, 5.0, 6.0));
        let result = Euler::step(&initial, &Spring(3.0), 0.0);
        assert_eq!(result.state, initial);
    }

    #[test]
    fn test_free_fall_converges() {
        // Euler lags the exact parabola by v*dt/2 per unit time; small steps get close
        let initial = ParticleState::at_rest(Vec3::new(0.0, 1.0, 0.0));
        let state = (0..400).fold(initial, |state, _| Euler::step(&state, &GravityOnly, 0.001).state);

        let t: f64 = 0.4;
        let exact_y = 1.0 - 0.5 * 9.807 * t * t;
        assert_relative_eq!(state.pos.y, exact_y, epsilon = 5e-3);
        assert_relative_eq!(state.vel.y, -9.807 * t, epsilon = 1e-9);
    }

    #[test]
    fn test_force_evaluated_once_at_start() {
        let initial = ParticleState::at_rest(Vec3::new(2.0, 0.0, 0.0));
        let result = Euler::step(&initial, &Spring(1.0), 1.0);
        assert_relative_eq!(result.acceleration.x, -2.0);
        assert_relative_eq!(result.state.vel.x, -2.0);
        assert_relative_eq!(result.state.pos.x, 2.0);
    }
}
