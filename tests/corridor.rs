//! Tests that drive a whole traffic system around a moving reference point.

use std::collections::HashSet;

use corridor_traffic::math::Point3d;
use corridor_traffic::{
    ActivationCommand, Category, ConfigError, EntityId, Heading, Prefab, PrefabCatalog,
    TrafficConfig, TrafficSystem,
};

const DT: f64 = 0.02;

fn catalog() -> PrefabCatalog {
    PrefabCatalog {
        generic: vec![
            Prefab::with_box("hatchback", 1.8, 1.5, 4.0),
            Prefab::with_box("sedan", 1.9, 1.4, 4.6),
        ],
        heavy_vehicles: vec![
            Prefab::with_box("truck", 2.5, 3.5, 9.0),
            Prefab::with_box("bus", 2.5, 3.2, 12.0),
        ],
        characters: vec![
            Prefab::with_box("ice cream van", 2.0, 2.6, 5.5),
            Prefab::with_box("tractor", 2.2, 2.8, 4.0),
        ],
    }
}

fn config() -> TrafficConfig {
    TrafficConfig {
        seed: Some(42),
        generic_pool_size: 12,
        ..Default::default()
    }
}

fn origin() -> Point3d {
    Point3d::new(0.0, 0.2, 0.0)
}

/// Runs the system with the reference point moving at `speed`,
/// calling `check` after every tick, before the controllers run.
fn drive(
    sim: &mut TrafficSystem,
    frames: usize,
    speed: f64,
    sink: &mut Vec<ActivationCommand>,
    mut check: impl FnMut(&TrafficSystem, Point3d),
) {
    let mut reference = origin();
    for _ in 0..frames {
        reference.z += speed * DT;
        sim.tick(DT, reference, sink);
        check(sim, reference);
        let snapshot = sim.snapshot();
        sim.update_controllers(DT, &snapshot, sink);
        sim.integrate(DT, sink);
    }
}

/// Extracts `(id, lane offset, z)` for every spawn, in order.
fn spawns(commands: &[ActivationCommand]) -> Vec<(EntityId, f64, f64)> {
    commands
        .windows(3)
        .filter_map(|cmds| match cmds {
            [ActivationCommand::SetTransform(id, pos, _), ActivationCommand::SetVelocity(..), ActivationCommand::SetActive(active_id, true)]
                if id == active_id =>
            {
                Some((*id, pos.x, pos.z))
            }
            _ => None,
        })
        .collect()
}

#[test]
fn pools_are_conserved() {
    let mut sim = TrafficSystem::new(config(), &catalog(), origin()).unwrap();
    let mut sink = vec![];
    drive(&mut sim, 3000, 35.0, &mut sink, |sim, _| {
        for category in Category::ALL {
            let active = sim.iter_active().filter(|e| e.category() == category).count();
            assert_eq!(
                active + sim.available_count(category),
                sim.total_count(category)
            );
        }
        assert!(sim.iter_active().all(|e| e.is_active()));
        assert_eq!(sim.snapshot().colliders().len(), sim.active_count());
        let inactive = sim.iter_entities().filter(|e| !e.is_active()).count();
        assert_eq!(inactive + sim.active_count(), sim.iter_entities().count());
    });
    assert_eq!(sim.total_count(Category::Generic), 12);
    assert_eq!(sim.total_count(Category::HeavyVehicle), 2);
    assert_eq!(sim.total_count(Category::Character), 2);
}

#[test]
fn unique_entities_are_never_duplicated() {
    let config = TrafficConfig {
        p_generic: 0.2,
        p_heavy: 0.4,
        generic_pool_size: 2,
        ..config()
    };
    let mut sim = TrafficSystem::new(config, &catalog(), origin()).unwrap();
    let mut sink = vec![];
    let mut seen_unique = false;
    drive(&mut sim, 2000, 30.0, &mut sink, |sim, _| {
        for category in [Category::Character, Category::HeavyVehicle] {
            let indices = sim
                .iter_active()
                .filter(|e| e.category() == category)
                .map(|e| e.unique_index().unwrap())
                .collect::<Vec<_>>();
            let distinct = indices.iter().collect::<HashSet<_>>();
            assert_eq!(indices.len(), distinct.len());
            seen_unique |= !indices.is_empty();
        }
        assert!(sim
            .iter_active()
            .filter(|e| e.category() == Category::Generic)
            .all(|e| e.unique_index().is_none()));
    });
    assert!(seen_unique);
}

#[test]
fn entities_stay_inside_window() {
    let config = config();
    let (behind, limit) = (config.behind, config.ahead + config.extra_ahead_despawn);
    let mut sim = TrafficSystem::new(config, &catalog(), origin()).unwrap();
    let mut sink = vec![];
    drive(&mut sim, 3000, 40.0, &mut sink, |sim, reference| {
        for entity in sim.iter_active() {
            assert!(entity.axial() >= reference.z - behind);
            assert!(entity.axial() <= reference.z + limit);
        }
    });
    assert!(sim.active_count() > 0);
}

#[test]
fn spawns_respect_lane_gaps() {
    let config = config();
    let (min_gap, min_gap_heavy) = (config.min_gap, config.min_gap_heavy);
    let mut sim = TrafficSystem::new(config, &catalog(), origin()).unwrap();
    let offsets = sim.lanes().offsets().collect::<Vec<_>>();
    let mut sink = vec![];
    drive(&mut sim, 3000, 30.0, &mut sink, |_, _| {});

    let spawns = spawns(&sink);
    assert!(spawns.len() > 20);
    let mut last = vec![f64::NEG_INFINITY; offsets.len()];
    for (id, x, z) in spawns {
        let lane = offsets.iter().position(|o| *o == x).unwrap();
        let gap = match sim.get_entity(id).category() {
            Category::HeavyVehicle => min_gap_heavy,
            _ => min_gap,
        };
        assert!(z - last[lane] >= gap, "lane {} spawn at {} too close", lane, z);
        last[lane] = z;
    }
}

#[test]
fn velocities_never_reverse() {
    let mut sim = TrafficSystem::new(config(), &catalog(), origin()).unwrap();
    let mut sink = vec![];
    drive(&mut sim, 2000, 25.0, &mut sink, |sim, _| {
        for entity in sim.iter_active() {
            assert!(entity.velocity().z * entity.heading().sign() >= 0.0);
        }
    });
}

#[test]
fn density_increases_with_distance() {
    let mut sim = TrafficSystem::new(config(), &catalog(), origin()).unwrap();
    let mut sink = vec![];
    let mut prev = f64::INFINITY;
    drive(&mut sim, 4000, 50.0, &mut sink, |sim, _| {
        assert!(sim.spawn_step() <= prev);
        prev = sim.spawn_step();
    });
    assert_eq!(sim.spawn_step(), 8.0);
}

#[test]
fn stationary_reference_fills_window_once() {
    let config = TrafficConfig {
        min_gap: 25.0,
        ahead: 120.0,
        ..config()
    };
    let mut sim = TrafficSystem::new(config, &catalog(), origin()).unwrap();
    let mut sink = vec![];
    for _ in 0..50 {
        sim.tick(DT, origin(), &mut sink);
    }

    let spawns = spawns(&sink);
    assert!(!spawns.is_empty());
    for (_, _, z) in &spawns {
        // Attempts happen exactly one spawn step (18 m at zero distance) apart
        assert_eq!(z % 18.0, 0.0);
        assert!(*z < 120.0);
    }
    assert_eq!(sim.next_spawn_z(), 126.0);
    assert_eq!(sim.active_count(), spawns.len());
}

#[test]
fn exhausted_pool_aborts_spawn() {
    let config = TrafficConfig {
        generic_pool_size: 1,
        p_generic: 1.0,
        p_heavy: 0.0,
        min_gap: 0.0,
        ..config()
    };
    let catalog = PrefabCatalog {
        generic: vec![Prefab::with_box("sedan", 1.9, 1.4, 4.6)],
        ..Default::default()
    };
    let mut sim = TrafficSystem::new(config, &catalog, origin()).unwrap();
    sim.tick(DT, origin(), &mut ());
    assert_eq!(sim.active_count(), 1);
    assert_eq!(sim.available_count(Category::Generic), 0);
}

#[test]
fn falls_back_to_other_categories() {
    let config = TrafficConfig {
        p_generic: 1.0,
        p_heavy: 0.0,
        generic_pool_size: 0,
        min_gap: 0.0,
        min_gap_heavy: 0.0,
        ..config()
    };
    let mut sim = TrafficSystem::new(config, &catalog(), origin()).unwrap();
    sim.tick(DT, origin(), &mut ());
    assert_eq!(sim.active_count(), 4);
    assert_eq!(sim.available_count(Category::HeavyVehicle), 0);
    assert_eq!(sim.available_count(Category::Character), 0);
}

#[test]
fn despawned_entities_are_reused() {
    let mut sim = TrafficSystem::new(config(), &catalog(), origin()).unwrap();
    let mut sink = vec![];
    drive(&mut sim, 3000, 40.0, &mut sink, |_, _| {});

    let despawned = sink
        .iter()
        .filter(|cmd| matches!(cmd, ActivationCommand::SetActive(_, false)))
        .count();
    let spawned = spawns(&sink).len();
    assert!(despawned > 0);
    assert_eq!(spawned - despawned, sim.active_count());
    assert!(spawned > sim.iter_entities().count());
}

#[test]
fn spawned_entities_rest_on_road_and_face_their_lane() {
    let config = config();
    let road_y = config.road_y;
    let headings = config.lane_headings.clone();
    let offsets = config.lane_offsets.clone();
    let mut sim = TrafficSystem::new(config, &catalog(), origin()).unwrap();
    let mut sink = vec![];
    sim.tick(DT, origin(), &mut sink);

    for cmd in &sink {
        if let ActivationCommand::SetTransform(id, pos, heading) = cmd {
            let entity = sim.get_entity(*id);
            let lane = offsets.iter().position(|o| *o == pos.x).unwrap();
            assert_eq!(*heading, headings[lane]);
            assert_eq!(entity.lane(), lane);
            assert_eq!(pos.y, entity.grounded_y(road_y));
            assert!(entity.controller().target_speed() >= 10.0);
            assert!(entity.controller().target_speed() <= 28.0);
        }
    }
}

#[test]
fn traffic_gets_moving() {
    let mut sim = TrafficSystem::new(config(), &catalog(), origin()).unwrap();
    for _ in 0..100 {
        sim.step(DT, origin(), &mut ());
    }
    assert!(sim
        .iter_active()
        .any(|e| e.heading() == Heading::Forward && e.velocity().z > 5.0));
    assert!(sim
        .iter_active()
        .any(|e| e.heading() == Heading::Oncoming && e.velocity().z < -5.0));
}

#[test]
fn empty_configurations_degrade() {
    let no_lanes = TrafficConfig {
        lane_offsets: vec![],
        ..config()
    };
    assert!(matches!(
        TrafficSystem::new(no_lanes, &catalog(), origin()),
        Err(ConfigError::NoLanes)
    ));

    let mut sim = TrafficSystem::new(config(), &PrefabCatalog::default(), origin()).unwrap();
    let mut sink = vec![];
    drive(&mut sim, 500, 30.0, &mut sink, |sim, _| {
        assert_eq!(sim.active_count(), 0);
    });
    assert!(sink.is_empty());
}

#[test]
fn seeded_runs_are_deterministic() {
    let run = || {
        let mut sim = TrafficSystem::new(config(), &catalog(), origin()).unwrap();
        let mut sink = vec![];
        drive(&mut sim, 500, 30.0, &mut sink, |_, _| {});
        sink
    };
    assert_eq!(run(), run());
}

#[test]
fn teleported_reference_restarts_spawning_behind_it() {
    let config = config();
    let behind = config.behind;
    let ahead = config.ahead;
    let mut sim = TrafficSystem::new(config, &catalog(), origin()).unwrap();
    let mut sink = vec![];
    sim.tick(DT, origin(), &mut sink);
    assert!(sim.active_count() > 0);

    sink.clear();
    let reference = Point3d::new(0.0, 0.2, 1000.0);
    sim.tick(DT, reference, &mut sink);

    let step = sim.spawn_step();
    let start = reference.z - behind;
    let spawns = spawns(&sink);
    assert!(!spawns.is_empty());
    for (_, _, z) in &spawns {
        assert!(*z >= start);
        let attempts = (z - start) / step;
        assert!((attempts - attempts.round()).abs() < 1e-6);
    }
    assert!(sim.next_spawn_z() >= reference.z + ahead);
    assert!(sim.next_spawn_z() < reference.z + ahead + step);

    // Everything spawned near the old position has been despawned
    assert!(sim.iter_active().all(|e| e.axial() >= start));
    for category in Category::ALL {
        let active = sim.iter_active().filter(|e| e.category() == category).count();
        assert_eq!(
            active + sim.available_count(category),
            sim.total_count(category)
        );
    }
}

#[test]
fn fallback_category_takes_the_lane_with_its_gap() {
    let config = TrafficConfig {
        p_generic: 1.0,
        p_heavy: 0.0,
        generic_pool_size: 0,
        min_gap: 0.0,
        min_gap_heavy: 40.0,
        ..config()
    };
    let catalog = PrefabCatalog {
        heavy_vehicles: catalog().heavy_vehicles,
        ..Default::default()
    };
    let mut sim = TrafficSystem::new(config, &catalog, origin()).unwrap();
    let mut sink = vec![];
    sim.tick(DT, origin(), &mut sink);

    // Generic is wanted but empty, so trucks spawn at 0 and 18 m on different lanes
    let spawns = spawns(&sink);
    assert_eq!(spawns.len(), 2);
    assert_eq!(spawns[0].2, 0.0);
    assert_eq!(spawns[1].2, 18.0);
    assert_ne!(spawns[0].1, spawns[1].1);
    assert!(sim
        .iter_active()
        .all(|e| e.category() == Category::HeavyVehicle));
}
