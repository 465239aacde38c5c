//! Python bindings for the swarm-core particle simulation.
//!
//! Provides a simple Python API:
//!
//! ```python
//! from swarm_physics import Simulation, Vec3
//!
//! sim = Simulation.box(Vec3(-1, -1, -1), Vec3(1, 1, 1))
//! sim.add_particle(Vec3(0, 0.5, 0), Vec3(0, -10, 0), 1.0, "field_and_attractors", restitution=0.5)
//!
//! for _ in range(100):
//!     sim.step(1 / 60)
//!     for pos in sim.positions():
//!         print(f"Particle at ({pos.x}, {pos.y}, {pos.z})")
//! ```

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use swarm_core::forces::{FieldParams, FlockingParams, RepulsionParams};
use swarm_core::{
    Attractor, AttractorField, Boundary, ForceModel, NeighborReads, ParticleId, ParticleSpec,
    PresetLoader, Simulation as CoreSimulation, Vec3 as CoreVec3,
};

/// 3D vector for positions, velocities, etc.
#[pyclass]
#[derive(Clone, Copy)]
pub struct Vec3 {
    #[pyo3(get, set)]
    pub x: f64,
    #[pyo3(get, set)]
    pub y: f64,
    #[pyo3(get, set)]
    pub z: f64,
}

#[pymethods]
impl Vec3 {
    #[new]
    fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn __repr__(&self) -> String {
        format!("Vec3({:.4}, {:.4}, {:.4})", self.x, self.y, self.z)
    }

    fn magnitude(&self) -> f64 {
        CoreVec3::from(*self).magnitude()
    }

    fn to_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }
}

impl From<CoreVec3> for Vec3 {
    fn from(v: CoreVec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vec3> for CoreVec3 {
    fn from(v: Vec3) -> Self {
        CoreVec3::new(v.x, v.y, v.z)
    }
}

fn value_error<E: std::fmt::Display>(err: E) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Bounded particle simulation.
///
/// Wraps the core driver; every particle is advanced and kept inside the
/// boundary on each `step`.
#[pyclass]
pub struct Simulation {
    inner: CoreSimulation,
    last_collisions: usize,
}

impl Simulation {
    fn wrap(inner: CoreSimulation) -> Self {
        Self {
            inner,
            last_collisions: 0,
        }
    }
}

#[pymethods]
impl Simulation {
    /// Load a YAML preset `name` from directory `dir`.
    #[staticmethod]
    fn from_preset(dir: &str, name: &str) -> PyResult<Self> {
        PresetLoader::new(dir)
            .load_simulation(name)
            .map(Self::wrap)
            .map_err(value_error)
    }

    /// Empty simulation inside an axis-aligned box.
    #[staticmethod]
    #[pyo3(name = "box")]
    fn in_box(min: Vec3, max: Vec3) -> PyResult<Self> {
        let boundary = Boundary::cube(min.into(), max.into()).map_err(value_error)?;
        CoreSimulation::new(boundary, AttractorField::default())
            .map(Self::wrap)
            .map_err(value_error)
    }

    /// Empty simulation inside a sphere.
    #[staticmethod]
    fn sphere(center: Vec3, radius: f64) -> PyResult<Self> {
        let boundary = Boundary::sphere(center.into(), radius).map_err(value_error)?;
        CoreSimulation::new(boundary, AttractorField::default())
            .map(Self::wrap)
            .map_err(value_error)
    }

    /// Current simulation time in seconds.
    #[getter]
    fn time(&self) -> f64 {
        self.inner.time()
    }

    /// Number of live particles.
    fn __len__(&self) -> usize {
        self.inner.registry().len()
    }

    /// Add a particle; returns its id.
    ///
    /// `model` is one of "flocking", "field_and_attractors" or
    /// "pairwise_repulsion". `drag` only applies to the field model and
    /// `coeff` only to pairwise repulsion; flocking uses default steering.
    /// `restitution=None` turns hard wall collisions off.
    #[pyo3(signature = (position, velocity, mass, model, restitution = Some(1.0), drag = 0.0, coeff = 1.0))]
    #[allow(clippy::too_many_arguments)]
    fn add_particle(
        &mut self,
        position: Vec3,
        velocity: Vec3,
        mass: f64,
        model: &str,
        restitution: Option<f64>,
        drag: f64,
        coeff: f64,
    ) -> PyResult<u64> {
        let model = match model {
            "flocking" => ForceModel::Flocking(FlockingParams::default()),
            "field_and_attractors" => ForceModel::FieldAndAttractors(FieldParams {
                drag,
                ..FieldParams::default()
            }),
            "pairwise_repulsion" => ForceModel::PairwiseRepulsion(RepulsionParams { coeff }),
            other => return Err(PyValueError::new_err(format!("unknown force model '{other}'"))),
        };
        let mut spec = ParticleSpec::new(position.into(), velocity.into(), mass, model);
        spec.restitution = restitution;
        self.inner.spawn(spec).map(|id| id.0).map_err(value_error)
    }

    /// Remove a particle by id.
    fn remove_particle(&mut self, id: u64) -> PyResult<()> {
        self.inner
            .despawn(ParticleId(id))
            .map(|_| ())
            .map_err(value_error)
    }

    /// Add an active attractor; returns its index.
    fn add_attractor(&mut self, position: Vec3) -> usize {
        let attractors = self.inner.attractors_mut();
        attractors.points.push(Attractor::new(position.into()));
        attractors.points.len() - 1
    }

    /// Move or toggle an attractor between steps.
    #[pyo3(signature = (index, position = None, active = None))]
    fn set_attractor(&mut self, index: usize, position: Option<Vec3>, active: Option<bool>) -> PyResult<()> {
        let attractor = self
            .inner
            .attractors_mut()
            .points
            .get_mut(index)
            .ok_or_else(|| PyValueError::new_err(format!("no attractor at index {index}")))?;
        if let Some(position) = position {
            attractor.position = position.into();
        }
        if let Some(active) = active {
            attractor.active = active;
        }
        Ok(())
    }

    #[setter]
    fn set_attractor_strength(&mut self, strength: f64) {
        self.inner.attractors_mut().strength = strength;
    }

    /// Let particles see neighbors already advanced in the same step.
    #[setter]
    fn set_sequential(&mut self, sequential: bool) {
        let reads = if sequential {
            NeighborReads::Sequential
        } else {
            NeighborReads::Snapshot
        };
        self.inner.set_neighbor_reads(reads);
    }

    /// Advance simulation by dt seconds; returns the number of bounces.
    fn step(&mut self, dt: f64) -> PyResult<usize> {
        let summary = self.inner.step(dt).map_err(value_error)?;
        self.last_collisions = summary.collisions;
        Ok(summary.collisions)
    }

    /// Run multiple steps at once (more efficient).
    fn step_n(&mut self, dt: f64, steps: usize) -> PyResult<usize> {
        let summaries = self.inner.run(dt, steps).map_err(value_error)?;
        self.last_collisions = summaries.last().map_or(0, |s| s.collisions);
        Ok(summaries.iter().map(|s| s.collisions).sum())
    }

    fn ids(&self) -> Vec<u64> {
        self.inner.registry().iter().map(|p| p.id.0).collect()
    }

    fn positions(&self) -> Vec<Vec3> {
        self.inner.registry().iter().map(|p| p.state.pos.into()).collect()
    }

    fn velocities(&self) -> Vec<Vec3> {
        self.inner.registry().iter().map(|p| p.state.vel.into()).collect()
    }

    fn headings(&self) -> Vec<Vec3> {
        self.inner.registry().iter().map(|p| p.heading.into()).collect()
    }

    /// Get current state as dict for easy inspection.
    fn state_dict(&self) -> PyResult<PyObject> {
        Python::with_gil(|py| {
            let dict = pyo3::types::PyDict::new(py);
            dict.set_item("time", self.inner.time())?;
            dict.set_item("ticks", self.inner.ticks())?;
            dict.set_item("particles", self.inner.registry().len())?;
            dict.set_item("last_collisions", self.last_collisions)?;
            dict.set_item(
                "positions",
                self.inner
                    .registry()
                    .iter()
                    .map(|p| p.state.pos.to_array())
                    .collect::<Vec<_>>(),
            )?;
            dict.set_item(
                "velocities",
                self.inner
                    .registry()
                    .iter()
                    .map(|p| p.state.vel.to_array())
                    .collect::<Vec<_>>(),
            )?;
            Ok(dict.into_any().unbind())
        })
    }
}

/// Python module definition.
#[pymodule]
fn swarm_physics(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Vec3>()?;
    m.add_class::<Simulation>()?;
    Ok(())
}
