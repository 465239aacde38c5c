//! # Swarm Core
//!
//! Point-particle swarms inside a bounded domain.
//!
//! ## Architecture
//!
//! - `types`: Core data structures (Vec3, particle state, constants)
//! - `geometry`: Line/plane and line/sphere intersection
//! - `boundary`: Box and sphere containment, facet queries
//! - `forces`: Flocking, gravity/drag/attractor and pairwise repulsion models
//! - `registry`: Particle storage and neighbor snapshots
//! - `integrator`: Single-evaluation Euler advance
//! - `collision`: Continuous detection and iterative bounce resolution
//! - `simulation`: Per-tick driver, neighbor-read policy, observers
//! - `config`: YAML scenario presets
//! - `error`: Input validation errors

pub mod boundary;
pub mod collision;
pub mod config;
pub mod error;
pub mod forces;
pub mod geometry;
pub mod integrator;
pub mod registry;
pub mod simulation;
pub mod types;

pub use boundary::Boundary;
pub use config::{PresetLoader, SimulationConfig};
pub use error::{ConfigError, SimError};
pub use forces::{Attractor, AttractorField, ForceModel};
pub use registry::{Particle, ParticleSpec, Registry};
pub use simulation::{NeighborReads, ParticleReport, Simulation, StepObserver, StepSummary};
pub use types::{ParticleId, ParticleState, Vec3};
