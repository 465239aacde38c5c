//! The shipped YAML presets load, validate and stay contained.

use std::path::PathBuf;

use swarm_core::{Boundary, ConfigError, NeighborReads, PresetLoader, SimulationConfig};

fn presets_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../presets")
}

#[test]
fn test_list_presets() {
    let names = PresetLoader::new(presets_dir()).list().unwrap();
    assert_eq!(names, vec!["cube", "flocking", "sphere"]);
}

#[test]
fn test_load_all_presets() {
    let loader = PresetLoader::new(presets_dir());
    for name in loader.list().unwrap() {
        let config = loader.load(&name).unwrap();
        assert!(!config.particles.is_empty(), "{name} has no particles");
        assert!(config.build().is_ok(), "{name} does not validate");
    }
}

#[test]
fn test_preset_boundaries() {
    let loader = PresetLoader::new(presets_dir());
    assert!(matches!(loader.load("cube").unwrap().boundary, Boundary::Box(_)));
    assert!(matches!(loader.load("sphere").unwrap().boundary, Boundary::Sphere(_)));

    let flocking = loader.load("flocking").unwrap();
    assert_eq!(flocking.neighbor_reads, NeighborReads::Snapshot);
}

#[test]
fn test_unknown_preset() {
    let loader = PresetLoader::new(presets_dir());
    assert!(matches!(loader.load("tornado"), Err(ConfigError::NotFound(_))));
}

#[test]
fn test_presets_stay_contained() {
    let loader = PresetLoader::new(presets_dir());
    for name in ["cube", "flocking", "sphere"] {
        let mut sim = loader.load_simulation(name).unwrap();
        for summary in sim.run(1.0 / 60.0, 600).unwrap() {
            assert!(
                summary.max_violation < 1e-9,
                "{name}: tick {} violation {}",
                summary.tick,
                summary.max_violation
            );
            assert_eq!(summary.capped, 0, "{name}: tick {} hit the iteration cap", summary.tick);
        }
        for p in sim.registry().iter() {
            assert!(p.state.pos.is_finite() && p.state.vel.is_finite());
        }
    }
}

#[test]
fn test_sequential_reads_also_contained() {
    let mut sim = PresetLoader::new(presets_dir()).load_simulation("sphere").unwrap();
    sim.set_neighbor_reads(NeighborReads::Sequential);
    for summary in sim.run(0.01, 300).unwrap() {
        assert!(summary.max_violation < 1e-9);
    }
}

#[test]
fn test_preset_yaml_round_trip() {
    let config = PresetLoader::new(presets_dir()).load("cube").unwrap();
    let yaml = config.to_yaml().unwrap();
    assert_eq!(SimulationConfig::from_yaml(&yaml).unwrap(), config);
}
