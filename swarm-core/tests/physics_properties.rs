//! Whole-simulation properties: containment, bounce laws, split steps and
//! the reference floor-bounce scenario.

use approx::assert_relative_eq;

use swarm_core::collision::CollisionResolver;
use swarm_core::forces::{FieldParams, FlockingParams, ForceField, RepulsionParams};
use swarm_core::{AttractorField, Attractor, Boundary, ForceModel, ParticleSpec, ParticleState, Simulation, Vec3};

struct NoForces;

impl ForceField for NoForces {
    fn acceleration(&self, _state: &ParticleState) -> Vec3 {
        Vec3::ZERO
    }
}

fn unit_box() -> Boundary {
    Boundary::cube(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)).unwrap()
}

fn weightless() -> ForceModel {
    ForceModel::FieldAndAttractors(FieldParams {
        drag: 0.0,
        gravity: Vec3::ZERO,
    })
}

/// Deterministic spread of starting states without pulling in an RNG.
fn scattered(i: usize) -> (Vec3, Vec3) {
    let f = i as f64;
    let pos = Vec3::new(
        (f * 0.37).sin() * 0.9,
        (f * 0.53).cos() * 0.9,
        (f * 0.71).sin() * 0.9,
    );
    let vel = Vec3::new((f * 1.3).cos() * 12.0, (f * 0.9).sin() * 15.0, (f * 2.1).cos() * 9.0);
    (pos, vel)
}

#[test]
fn test_reference_floor_bounce() {
    let mut sim = Simulation::new(unit_box(), AttractorField::default()).unwrap();
    let id = sim
        .spawn(
            ParticleSpec::new(Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, -10.0, 0.0), 1.0, weightless())
                .with_restitution(0.5),
        )
        .unwrap();

    let mut events = Vec::new();
    sim.step_observed(1.0, &mut |report: &swarm_core::ParticleReport<'_>| {
        events.extend_from_slice(report.collisions);
    })
    .unwrap();

    let floor = events[0];
    assert_eq!(floor.facet, 1);
    assert_eq!(floor.normal, Vec3::Y);
    assert_eq!(sim.boundary().point_on_facet(floor.facet), Vec3::new(-1.0, -1.0, -1.0));
    assert_relative_eq!(floor.time, 0.15, epsilon = 1e-12);
    assert_relative_eq!(floor.point.y, -1.0, epsilon = 1e-12);
    assert_relative_eq!(floor.velocity_before.y, -10.0, epsilon = 1e-12);
    assert_relative_eq!(floor.velocity_after.y, 5.0, epsilon = 1e-12);
    assert_relative_eq!(floor.resumed.pos.y, 3.25, epsilon = 1e-12);

    let committed = sim.particle(id).unwrap().state;
    assert_relative_eq!(committed.pos.y, -0.125, epsilon = 1e-12);
    assert_relative_eq!(committed.vel.y, -2.5, epsilon = 1e-12);
}

#[test]
fn test_restitution_law_single_bounce() {
    let resolver = CollisionResolver::new();
    for restitution in [0.0, 0.3, 0.75, 1.0, 1.2] {
        let start = ParticleState::new(Vec3::new(0.0, -0.5, 0.0), Vec3::new(1.5, -4.0, -0.5));
        let outcome = resolver.step(&unit_box(), &start, restitution, &NoForces, 0.2);

        assert_eq!(outcome.collisions.len(), 1);
        let event = outcome.collisions[0];
        let n = event.normal;
        let (before_n, before_t) = event.velocity_before.decompose(&n);
        let (after_n, after_t) = event.velocity_after.decompose(&n);

        assert_relative_eq!(after_n.dot(&n), -restitution * before_n.dot(&n), epsilon = 1e-12);
        assert_relative_eq!(after_t.x, before_t.x, epsilon = 1e-12);
        assert_relative_eq!(after_t.z, before_t.z, epsilon = 1e-12);
    }
}

#[test]
fn test_corner_shot_matches_split_steps() {
    let start = ParticleState::new(Vec3::ZERO, Vec3::new(2.0, 3.0, 0.0));
    let resolver = CollisionResolver::new();

    let whole = resolver.step(&unit_box(), &start, 1.0, &NoForces, 0.9);
    assert_eq!(whole.collisions.len(), 2);
    assert_eq!(whole.collisions[0].facet, 4); // ceiling first
    assert_eq!(whole.collisions[1].facet, 3); // then the +X wall

    let half = resolver.step(&unit_box(), &start, 1.0, &NoForces, 0.45);
    let halves = resolver.step(&unit_box(), &half.state, 1.0, &NoForces, 0.45);
    assert_eq!(half.collisions.len() + halves.collisions.len(), 2);

    assert_relative_eq!(whole.state.pos.x, halves.state.pos.x, epsilon = 1e-9);
    assert_relative_eq!(whole.state.pos.y, halves.state.pos.y, epsilon = 1e-9);
    assert_relative_eq!(whole.state.vel.x, halves.state.vel.x, epsilon = 1e-9);
    assert_relative_eq!(whole.state.vel.y, halves.state.vel.y, epsilon = 1e-9);
    assert_relative_eq!(whole.state.pos.x, 0.2, epsilon = 1e-9);
    assert_relative_eq!(whole.state.pos.y, -0.7, epsilon = 1e-9);
}

#[test]
fn test_zero_dt_leaves_state_untouched() {
    let mut sim = Simulation::new(unit_box(), AttractorField::new(3.0).with_attractor(Attractor::new(Vec3::ZERO)))
        .unwrap();
    let models = [
        ForceModel::Flocking(FlockingParams::default()),
        ForceModel::FieldAndAttractors(FieldParams::default()),
        ForceModel::PairwiseRepulsion(RepulsionParams { coeff: 1.0 }),
    ];
    for i in 0..9 {
        let (pos, vel) = scattered(i);
        sim.spawn(ParticleSpec::new(pos, vel, 1.0, models[i % 3])).unwrap();
    }
    let before: Vec<ParticleState> = sim.registry().iter().map(|p| p.state).collect();

    let summary = sim.step(0.0).unwrap();

    let after: Vec<ParticleState> = sim.registry().iter().map(|p| p.state).collect();
    assert_eq!(before, after);
    assert_eq!(summary.collisions, 0);
}

#[test]
fn test_containment_box_with_gravity_and_attractors() {
    let attractors = AttractorField::new(0.5)
        .with_attractor(Attractor::new(Vec3::new(0.0, 0.5, 0.0)))
        .with_attractor(Attractor::new(Vec3::new(-0.6, -0.2, 0.4)));
    let mut sim = Simulation::new(unit_box(), attractors).unwrap();
    for i in 0..16 {
        let (pos, vel) = scattered(i);
        let model = ForceModel::FieldAndAttractors(FieldParams {
            drag: 0.05,
            ..FieldParams::default()
        });
        sim.spawn(ParticleSpec::new(pos, vel, 1.0, model).with_restitution(0.9))
            .unwrap();
    }

    for _ in 0..500 {
        let summary = sim.step(1.0 / 60.0).unwrap();
        assert!(summary.max_violation < 1e-9, "violation {}", summary.max_violation);
    }
    for p in sim.registry().iter() {
        assert!(sim.boundary().contains(p.state.pos, 1e-9), "escaped: {}", p.state.pos);
    }
}

#[test]
fn test_containment_sphere_with_repulsion() {
    let mut sim = Simulation::new(Boundary::sphere(Vec3::ZERO, 2.0).unwrap(), AttractorField::default()).unwrap();
    for i in 0..12 {
        let (pos, vel) = scattered(i);
        let model = ForceModel::PairwiseRepulsion(RepulsionParams { coeff: 0.3 });
        sim.spawn(ParticleSpec::new(pos, vel, 1.0, model)).unwrap();
    }

    for _ in 0..400 {
        let summary = sim.step(0.02).unwrap();
        assert!(summary.max_violation < 1e-9, "violation {}", summary.max_violation);
    }
}

#[test]
fn test_inelastic_sphere_under_gravity_stays_inside() {
    // Bounces shrink toward the bottom of the sphere and the particle ends up
    // sliding along it, which must neither leak out nor exhaust the cap
    let ticks = 2000;
    for restitution in [0.0, 0.3, 0.7] {
        let mut sim = Simulation::new(Boundary::sphere(Vec3::ZERO, 1.0).unwrap(), AttractorField::default()).unwrap();
        let id = sim
            .spawn(
                ParticleSpec::new(
                    Vec3::new(0.5, 0.0, 0.0),
                    Vec3::new(0.0, 0.0, 1.0),
                    1.0,
                    ForceModel::FieldAndAttractors(FieldParams::default()),
                )
                .with_restitution(restitution),
            )
            .unwrap();

        let mut capped = 0;
        for summary in sim.run(1.0 / 60.0, ticks).unwrap() {
            assert!(
                summary.max_violation < 1e-9,
                "e = {restitution}: tick {} violation {}",
                summary.tick,
                summary.max_violation
            );
            capped += summary.capped;
        }
        assert!(capped < ticks / 10, "e = {restitution}: {capped} capped ticks");

        let p = sim.particle(id).unwrap();
        assert!(p.state.pos.is_finite() && p.state.vel.is_finite());
        assert!(p.state.pos.magnitude() <= 1.0 + 1e-9, "e = {restitution}: ended at {}", p.state.pos);
    }
}

#[test]
fn test_soft_only_particle_ignores_walls() {
    let mut sim = Simulation::new(unit_box(), AttractorField::default()).unwrap();
    let id = sim
        .spawn(ParticleSpec::new(Vec3::new(0.9, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 1.0, weightless()).soft_only())
        .unwrap();

    let summaries = sim.run(0.1, 5).unwrap();

    assert!(summaries.iter().all(|s| s.collisions == 0));
    assert_relative_eq!(sim.particle(id).unwrap().state.pos.x, 1.4, epsilon = 1e-12);
    assert_relative_eq!(summaries[4].max_violation, 0.4, epsilon = 1e-12);
}

#[test]
fn test_containment_flocking() {
    let mut sim = Simulation::new(unit_box(), AttractorField::default()).unwrap();
    for i in 0..10 {
        let (pos, vel) = scattered(i);
        sim.spawn(ParticleSpec::new(pos, vel * 0.2, 1.0, ForceModel::Flocking(FlockingParams::default())))
            .unwrap();
    }

    for _ in 0..300 {
        let summary = sim.step(1.0 / 30.0).unwrap();
        assert!(summary.max_violation < 1e-9, "violation {}", summary.max_violation);
    }
}

#[test]
fn test_inelastic_particle_settles_on_floor() {
    let mut sim = Simulation::new(unit_box(), AttractorField::default()).unwrap();
    let id = sim
        .spawn(
            ParticleSpec::new(
                Vec3::new(0.0, 0.8, 0.0),
                Vec3::ZERO,
                1.0,
                ForceModel::FieldAndAttractors(FieldParams::default()),
            )
            .with_restitution(0.0),
        )
        .unwrap();

    sim.run(0.01, 200).unwrap();

    let p = sim.particle(id).unwrap();
    assert_relative_eq!(p.state.pos.y, -1.0, epsilon = 1e-9);
    // Only the gravity picked up since the last bounce remains
    assert!(p.state.vel.y.abs() <= swarm_core::types::constants::GRAVITY * 0.01 + 1e-9);
}

#[test]
fn test_elastic_bounce_preserves_speed() {
    let mut sim = Simulation::new(unit_box(), AttractorField::default()).unwrap();
    let id = sim
        .spawn(ParticleSpec::new(Vec3::ZERO, Vec3::new(7.0, -5.0, 3.0), 1.0, weightless()))
        .unwrap();
    let speed = sim.particle(id).unwrap().state.vel.magnitude();

    sim.run(0.05, 200).unwrap();

    assert_relative_eq!(sim.particle(id).unwrap().state.vel.magnitude(), speed, epsilon = 1e-9);
}

#[test]
fn test_repulsion_momentum_conserved_away_from_walls() {
    let mut sim = Simulation::new(Boundary::sphere(Vec3::ZERO, 10.0).unwrap(), AttractorField::default()).unwrap();
    let model = ForceModel::PairwiseRepulsion(RepulsionParams { coeff: 0.5 });
    sim.spawn(ParticleSpec::new(Vec3::new(-0.2, 0.1, 0.0), Vec3::ZERO, 1.0, model)).unwrap();
    sim.spawn(ParticleSpec::new(Vec3::new(0.3, -0.1, 0.2), Vec3::ZERO, 1.0, model)).unwrap();
    sim.spawn(ParticleSpec::new(Vec3::new(0.0, 0.4, -0.3), Vec3::ZERO, 1.0, model)).unwrap();

    sim.run(0.01, 50).unwrap();

    let momentum = sim
        .registry()
        .iter()
        .fold(Vec3::ZERO, |acc, p| acc + p.state.vel * p.mass);
    assert_relative_eq!(momentum.magnitude(), 0.0, epsilon = 1e-9);
}
