//! gamelib demo
//!
//! Scatters a few crates inside a walled box, lets them fall and bounce
//! for a few seconds of simulated time, then casts a ray across the box.
//!
//! Usage: `gamelib-demo [settings.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use gamelib::sim::{Entity, EntityData, RigidBody, World};
    use gamelib::{Bindable, Event, Settings, Vector2};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    const SEED: u64 = 0x5eed;
    const FRAMES: u32 = 300;
    const BOX_SIZE: f64 = 200.0;

    env_logger::init();
    log::info!("gamelib demo starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };

    let mut world = match World::with_settings(settings) {
        Ok(world) => world,
        Err(err) => {
            log::error!("Could not build the world: {}", err);
            std::process::exit(1);
        }
    };

    world
        .classes_mut()
        .register("Crate", |id, mut data, modules| {
            data.solid = true;
            data.elasticity = 0.6;
            data.acceleration = Vector2::new(0.0, 0.4);
            data.max_speed = Some(8.0);
            data.included_modules.extend(["movable".to_string(), "collidable".to_string()]);
            Entity::new(id, data, modules)
        })
        .register("Wall", |id, mut data, modules| {
            data.solid = true;
            data.immovable = true;
            data.included_modules.push("collidable".to_string());
            Entity::with_setup(id, data, modules, |wall| {
                wall.bind(Event::Create, |wall: &mut Entity, _| {
                    log::debug!("Wall {} at ({}, {})", wall.id(), wall.data.x, wall.data.y);
                });
                Ok(())
            })
        });

    let half = BOX_SIZE / 2.0;
    let walls = [
        (half, BOX_SIZE + 5.0, BOX_SIZE, 10.0),
        (half, -5.0, BOX_SIZE, 10.0),
        (-5.0, half, 10.0, BOX_SIZE),
        (BOX_SIZE + 5.0, half, 10.0, BOX_SIZE),
    ];
    for (x, y, width, height) in walls {
        if let Err(err) = world.add(EntityData::at(x, y).sized(width, height).with_class("Wall")) {
            log::error!("Could not add wall: {}", err);
            std::process::exit(1);
        }
    }

    let mut rng = Pcg32::seed_from_u64(SEED);
    for _ in 0..12 {
        let data = EntityData::at(rng.random_range(20.0..180.0), rng.random_range(20.0..120.0))
            .sized(12.0, 12.0)
            .with_velocity(rng.random_range(-3.0..3.0), 0.0)
            .with_class("Crate");
        if let Err(err) = world.add(data) {
            log::error!("Could not add crate: {}", err);
            std::process::exit(1);
        }
    }
    log::info!("Seeded {} entities (seed {:#x})", world.entities().len(), SEED);

    world.bind(Event::AfterUpdate, |w: &mut World, _| {
        let resolved = w.separate_all();
        if resolved > 0 {
            log::trace!("Resolved {} contacts at age {}", resolved, w.age());
        }
    });

    // Pretend a display refreshes at 60 Hz
    world.start();
    let frame_ms = 1000.0 / 60.0;
    let mut stepped = 0;
    let mut frame = 0u32;
    while stepped < FRAMES {
        if world.run_frame(frame as f64 * frame_ms) {
            stepped += 1;
        }
        frame += 1;
    }
    world.stop();

    let resting = world
        .entities()
        .iter()
        .filter(|e| e.class() == Some("Crate") && !e.touching().is_empty())
        .count();
    log::info!(
        "Ran {} steps over {} display frames; {} crates in contact",
        world.age(),
        frame,
        resting
    );

    match world.ray_collides(Vector2::new(1.0, half), Vector2::X, None) {
        Some(hit) => log::info!(
            "Ray hit entity {} at ({:.1}, {:.1}), distance {:.1}",
            hit.entity,
            hit.point.x,
            hit.point.y,
            hit.distance
        ),
        None => log::info!("Ray hit nothing"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page on the web
}
