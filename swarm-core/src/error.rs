//! Error types.
//!
//! Numerical degeneracies inside a step are guarded in place and never show
//! up here. These errors cover inputs handed to the core from outside:
//! geometry, particle parameters, time increments and preset files.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{ParticleId, Vec3};

/// Invalid simulation input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("particle mass must be positive and finite, got {0}")]
    NonPositiveMass(f64),

    #[error("restitution coefficient must be non-negative and finite, got {0}")]
    InvalidRestitution(f64),

    #[error("box corners must satisfy min < max on every axis, got min {min} max {max}")]
    DegenerateBox { min: Vec3, max: Vec3 },

    #[error("sphere radius must be positive and finite, got {0}")]
    NonPositiveRadius(f64),

    #[error("time increment must be non-negative and finite, got {0}")]
    InvalidTimeStep(f64),

    #[error("initial position {0} lies outside the boundary")]
    OutsideBoundary(Vec3),

    #[error("force model parameter `{name}` is invalid: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("no particle with id {0}")]
    UnknownParticle(ParticleId),
}

/// Failure loading a scenario preset.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("preset not found: {0}")]
    NotFound(String),

    #[error("invalid preset: {0}")]
    Invalid(#[from] SimError),
}
