//! Entity Hierarchies — headless solar system.
//!
//! Planets orbit the sun; moons orbit their planet, all via hierarchy. Each
//! orbit is a pivot entity whose rotation carries its child around. The demo
//! runs a fixed number of frames and logs where everything ended up.
//!
//! Run with: `RUST_LOG=info cargo run -p kjarni --example orbit`

use kjarni::prelude::*;

// ── Markers ──────────────────────────────────────────────────────────────

struct Sun;
impl Component for Sun {}

struct Planet(&'static str);
impl Component for Planet {}

struct Moon;
impl Component for Moon {}

// ── Orbit component ─────────────────────────────────────────────────────

/// Rotates the entity's `LocalTransform` about Z at `speed` radians/second.
struct Orbit {
    speed: f32,
}
impl Component for Orbit {}

struct OrbitSystem;

impl System for OrbitSystem {
    fn update(&mut self, world: &mut World, dt: f32) {
        let spins: Vec<(Entity, f32)> = world
            .query::<(Orbit, LocalTransform)>()
            .map(|(entity, orbit, _)| (entity, orbit.speed * dt))
            .collect();

        for (entity, angle) in spins {
            if let Some(transform) = world.get_component_mut::<LocalTransform>(entity) {
                transform.rotation *= Quat::from_rotation_z(angle);
            }
        }
    }
}

fn spawn_planet(
    world: &mut World,
    sun: Entity,
    name: &'static str,
    distance: f32,
    speed: f32,
    moon_speed: Option<f32>,
) -> Result<(), EcsError> {
    // Rotating the pivot makes the offset child orbit.
    let pivot = world.spawn_child(sun, (LocalTransform::IDENTITY, Orbit { speed }))?;
    let planet = world.spawn_child(
        pivot,
        (LocalTransform::from_xyz(distance, 0.0, 0.0), Planet(name)),
    )?;

    if let Some(moon_speed) = moon_speed {
        let moon_pivot =
            world.spawn_child(planet, (LocalTransform::IDENTITY, Orbit { speed: moon_speed }))?;
        world.spawn_child(
            moon_pivot,
            (LocalTransform::from_xyz(distance * 0.1 + 8.0, 0.0, 0.0).with_scale(0.3), Moon),
        )?;
    }
    Ok(())
}

fn report(world: &World) {
    let mut planets: Vec<_> = world
        .query::<(Planet, WorldTransform)>()
        .map(|(_, planet, transform)| (planet.0, transform.translation()))
        .collect();
    planets.sort_by(|a, b| a.0.cmp(b.0));
    for (name, position) in planets {
        log::info!("{name:>8} at ({:7.1}, {:7.1})", position.x, position.y);
    }

    let moonless = world
        .query_builder()
        .with::<Planet>()
        .without::<Children>()
        .execute()
        .map(|(_, planet)| planet.0)
        .collect::<Vec<_>>();
    log::info!("planets without moons: {moonless:?}");
}

fn main() -> Result<(), EcsError> {
    env_logger::init();

    let config = EcsConfig {
        entity_capacity: 64,
        log_schedule: true,
        ..EcsConfig::default()
    };
    let mut world = World::with_config(&config);
    let mut scheduler = Scheduler::with_config(&config);

    scheduler.add_system(&mut world, OrbitSystem, &[])?;
    scheduler.add_system(
        &mut world,
        TransformPropagation::with_config(&config),
        &[SystemId::of::<OrbitSystem>()],
    )?;

    let sun = world.spawn((LocalTransform::IDENTITY, Sun));
    spawn_planet(&mut world, sun, "mercury", 120.0, 1.0, None)?;
    spawn_planet(&mut world, sun, "earth", 200.0, 0.6, Some(2.5))?;
    spawn_planet(&mut world, sun, "mars", 300.0, 0.4, Some(3.0))?;
    spawn_planet(&mut world, sun, "jupiter", 400.0, 0.25, Some(1.8))?;

    let dt = 1.0 / 60.0;
    for _ in 0..120 {
        scheduler.update(&mut world, dt);
    }
    log::info!("after 2s: {} entities", world.entity_count());
    report(&world);

    // Remove mars with its moon by destroying its orbit pivot.
    let mars = world
        .query::<(Planet,)>()
        .find(|(_, planet)| planet.0 == "mars")
        .map(|(entity, _)| entity);
    if let Some(pivot) = mars.and_then(|mars| world.parent_of(mars)) {
        let removed = world.destroy_recursive(pivot);
        log::info!("destroyed mars system ({removed} entities)");
    }

    for _ in 0..60 {
        scheduler.update(&mut world, dt);
    }
    log::info!("after 3s: {} entities", world.entity_count());
    report(&world);

    let moons = world.query::<(Moon, WorldTransform)>().count();
    log::info!("{moons} moons still orbiting");

    scheduler.shutdown(&mut world);
    Ok(())
}
