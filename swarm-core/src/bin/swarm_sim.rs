//! Headless runner for scenario presets.
//!
//! ```text
//! RUST_LOG=debug swarm-sim cube --ticks 300 --dt 0.01
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};

use swarm_core::{NeighborReads, PresetLoader};

const DEFAULT_PRESETS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../presets");

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let matches = Command::new("swarm-sim")
        .about("Run a particle swarm preset headless")
        .arg(
            Arg::new("preset")
                .value_name("PRESET")
                .help("Preset name (file stem under the presets directory)")
                .required_unless_present("list"),
        )
        .arg(
            Arg::new("presets-dir")
                .long("presets-dir")
                .value_name("DIR")
                .help("Directory holding the preset YAML files")
                .default_value(DEFAULT_PRESETS_DIR),
        )
        .arg(
            Arg::new("dt")
                .long("dt")
                .value_name("SECONDS")
                .help("Time increment per tick")
                .default_value("0.016666666666666666"),
        )
        .arg(
            Arg::new("ticks")
                .short('n')
                .long("ticks")
                .value_name("COUNT")
                .help("Number of ticks to run")
                .default_value("600"),
        )
        .arg(
            Arg::new("sequential")
                .long("sequential")
                .help("Let particles see neighbors already advanced in the same tick")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .help("List available presets and exit")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let presets_dir = matches
        .get_one::<String>("presets-dir")
        .map(PathBuf::from)
        .context("missing presets directory")?;
    let loader = PresetLoader::new(&presets_dir);

    if matches.get_flag("list") {
        for name in loader.list()? {
            println!("{name}");
        }
        return Ok(());
    }

    let preset = matches
        .get_one::<String>("preset")
        .context("no preset given")?;
    let dt: f64 = matches
        .get_one::<String>("dt")
        .context("missing dt")?
        .parse()
        .context("Invalid time increment")?;
    let ticks: usize = matches
        .get_one::<String>("ticks")
        .context("missing tick count")?
        .parse()
        .context("Invalid tick count")?;

    let mut sim = loader
        .load_simulation(preset)
        .with_context(|| format!("loading preset '{preset}' from {}", presets_dir.display()))?;
    if matches.get_flag("sequential") {
        sim.set_neighbor_reads(NeighborReads::Sequential);
    }

    let mut bounces = 0;
    let mut capped = 0;
    let mut worst_violation: f64 = 0.0;
    for _ in 0..ticks {
        let summary = sim.step(dt)?;
        bounces += summary.collisions;
        capped += summary.capped;
        worst_violation = worst_violation.max(summary.max_violation);
    }

    log::info!(
        "ran {} ticks ({:.3}s simulated): {} bounces, {} capped resolutions, worst violation {:e}",
        sim.ticks(),
        sim.time(),
        bounces,
        capped,
        worst_violation
    );

    for particle in sim.registry().iter() {
        println!(
            "{} pos {} vel {} speed {:.4}",
            particle.id,
            particle.state.pos,
            particle.state.vel,
            particle.state.vel.magnitude()
        );
    }

    Ok(())
}
