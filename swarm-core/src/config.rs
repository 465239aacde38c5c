//! Scenario preset loader.
//!
//! Loads complete simulation setups from YAML files, so boundary geometry,
//! attractors and particle coefficients can be changed without recompiling.
//!
//! ## Directory Structure
//!
//! ```text
//! presets/
//! ├── flocking.yaml
//! ├── cube.yaml
//! └── sphere.yaml
//! ```
//!
//! ## Format
//!
//! ```yaml
//! boundary: { kind: box, min: {x: -1, y: -1, z: -1}, max: {x: 1, y: 1, z: 1} }
//! neighbor_reads: snapshot
//! attractors:
//!   strength: 5.0
//!   points:
//!     - position: {x: 0, y: 0, z: 0}
//! particles:
//!   - position: {x: 0, y: 0.5, z: 0}
//!     velocity: {x: 0, y: -10, z: 0}
//!     mass: 1.0
//!     restitution: 0.5
//!     model: { kind: field_and_attractors, drag: 0.1 }
//! ```
//!
//! `restitution` defaults to 1.0; `restitution: null` turns hard wall
//! collisions off for that particle.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::boundary::Boundary;
use crate::error::{ConfigError, SimError};
use crate::forces::AttractorField;
use crate::registry::ParticleSpec;
use crate::simulation::{NeighborReads, Simulation};

/// A complete simulation setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub boundary: Boundary,
    #[serde(default)]
    pub neighbor_reads: NeighborReads,
    #[serde(default)]
    pub attractors: AttractorField,
    #[serde(default)]
    pub particles: Vec<ParticleSpec>,
}

impl SimulationConfig {
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate the setup and build a simulation with every particle registered.
    pub fn build(&self) -> Result<Simulation, SimError> {
        let mut sim = Simulation::new(self.boundary, self.attractors.clone())?
            .with_neighbor_reads(self.neighbor_reads);
        for spec in &self.particles {
            sim.spawn(*spec)?;
        }
        Ok(sim)
    }
}

impl Simulation {
    pub fn from_config(config: &SimulationConfig) -> Result<Self, SimError> {
        config.build()
    }
}

/// Preset loader with configurable base directory.
pub struct PresetLoader {
    base_path: PathBuf,
}

impl PresetLoader {
    /// Create a new loader with the given base path.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Load a preset by name (without .yaml extension).
    ///
    /// # Example
    /// ```ignore
    /// let loader = PresetLoader::new("presets");
    /// let cube = loader.load("cube")?;
    /// ```
    pub fn load(&self, name: &str) -> Result<SimulationConfig, ConfigError> {
        let path = self.base_path.join(format!("{}.yaml", name));
        if !path.exists() {
            return Err(ConfigError::NotFound(name.to_string()));
        }
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = SimulationConfig::from_yaml(&contents)?;
        info!(
            "loaded preset '{}' ({} particles) from {}",
            name,
            config.particles.len(),
            path.display()
        );
        Ok(config)
    }

    /// Load a preset and build the simulation it describes.
    pub fn load_simulation(&self, name: &str) -> Result<Simulation, ConfigError> {
        Ok(self.load(name)?.build()?)
    }

    /// List all available presets.
    pub fn list(&self) -> Result<Vec<String>, ConfigError> {
        if !self.base_path.exists() {
            return Ok(vec![]);
        }

        let io_err = |source| ConfigError::Io {
            path: self.base_path.clone(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_path).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".yaml") {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

// =============================================================================
// Tests
// =============================================================================
