use std::time::Instant;

use corridor_traffic::math::Point3d;
use corridor_traffic::{
    layers, Collider, FollowParams, Interval, Prefab, PrefabCatalog, TrafficConfig, TrafficSystem,
};

fn main() {
    let catalog = PrefabCatalog {
        generic: vec![
            Prefab::with_box("hatchback", 1.8, 1.5, 4.0),
            Prefab::with_box("sedan", 1.9, 1.4, 4.6),
            Prefab::with_box("van", 2.0, 2.1, 5.2),
        ],
        heavy_vehicles: vec![
            Prefab::with_box("truck", 2.5, 3.5, 9.0),
            Prefab::with_box("bus", 2.5, 3.2, 12.0),
        ],
        characters: vec![
            Prefab::with_box("ice cream van", 2.0, 2.6, 5.5),
            Prefab::with_box("tractor", 2.2, 2.8, 4.0),
        ],
    };
    let config = TrafficConfig {
        seed: Some(1),
        follow: FollowParams {
            layer_mask: layers::TRAFFIC | layers::PLAYER,
            ..Default::default()
        },
        ..Default::default()
    };

    let mut reference = Point3d::new(1.625, 0.2, 0.0);
    let mut sim = match TrafficSystem::new(config, &catalog, reference) {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    println!("Simulating...");
    const NUM_FRAMES: u32 = 1000;
    const DT: f64 = 0.02;
    const PLAYER_SPEED: f64 = 30.0;
    loop {
        let start = Instant::now();
        for _ in 0..NUM_FRAMES {
            reference.z += PLAYER_SPEED * DT;
            sim.tick(DT, reference, &mut ());

            // Traffic also follows the player's car
            let mut snapshot = sim.snapshot();
            snapshot.push(Collider {
                owner: None,
                layer: layers::PLAYER,
                lateral: Interval::disc(reference.x, 0.9),
                vertical: Interval::new(reference.y, reference.y + 1.4),
                axial: Interval::disc(reference.z, 2.2),
                axial_velocity: Some(PLAYER_SPEED),
            });
            sim.update_controllers(DT, &snapshot, &mut ());
            sim.integrate(DT, &mut ());
        }
        let frame = start.elapsed() / NUM_FRAMES;
        println!(
            "Avg. frame: {:?} ({} active, {:.0} m travelled, spawn step {:.1} m)",
            frame,
            sim.active_count(),
            sim.distance_traveled(),
            sim.spawn_step(),
        );
        if sim.distance_traveled() > 5000.0 {
            break;
        }
    }
}
