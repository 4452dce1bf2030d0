//! System Scheduling — dependency-ordered frame loop.
//!
//! Registers systems out of order with `runs_after` constraints, shows the
//! resolved order, demonstrates how a dependency cycle is rejected, and
//! logs per-system timings.
//!
//! Run with: `RUST_LOG=debug cargo run -p kjarni --example scheduling`

use kjarni::prelude::*;

// ── Components ───────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
struct Velocity(Vec3);
impl Component for Velocity {}

struct Frozen;
impl Component for Frozen {}

// ── Resources ────────────────────────────────────────────────────────────

struct Gravity(f32);

#[derive(Default)]
struct FrameCount(u64);

// ── Systems ──────────────────────────────────────────────────────────────

struct Spawner {
    per_frame: usize,
}

impl System for Spawner {
    fn update(&mut self, world: &mut World, _dt: f32) {
        for i in 0..self.per_frame {
            let e = world.spawn((
                LocalTransform::from_xyz(i as f32, 10.0, 0.0),
                Velocity(Vec3::new(1.0, 0.0, 0.0)),
            ));
            if i % 4 == 0 {
                world.set_component(e, Frozen);
            }
        }
    }
}

struct ApplyGravity;

impl System for ApplyGravity {
    fn initialize(&mut self, world: &mut World) {
        world.insert_resource(Gravity(-9.81));
    }

    fn update(&mut self, world: &mut World, dt: f32) {
        let g = world.resource::<Gravity>().0;
        let falling: Vec<Entity> = world
            .query_builder()
            .with::<Velocity>()
            .without::<Frozen>()
            .entities()
            .collect();
        for e in falling {
            if let Some(v) = world.get_component_mut::<Velocity>(e) {
                v.0.y += g * dt;
            }
        }
    }

    fn shutdown(&mut self, world: &mut World) {
        world.remove_resource::<Gravity>();
    }
}

struct Integrate;

impl System for Integrate {
    fn update(&mut self, world: &mut World, dt: f32) {
        let moved: Vec<_> = world
            .query::<(LocalTransform, Velocity)>()
            .map(|(e, t, v)| (e, t.translation + v.0 * dt))
            .collect();
        for (e, translation) in moved {
            if let Some(t) = world.get_component_mut::<LocalTransform>(e) {
                t.translation = translation;
            }
        }
    }
}

struct Cleanup;

impl System for Cleanup {
    fn update(&mut self, world: &mut World, _dt: f32) {
        let fallen: Vec<Entity> = world
            .query::<(WorldTransform,)>()
            .filter(|(_, t)| t.translation().y < 0.0)
            .map(|(e, _)| e)
            .collect();
        world.destroy_entities(fallen);
        world.resource_mut::<FrameCount>().0 += 1;
    }
}

fn main() -> Result<(), EcsError> {
    env_logger::init();

    let config = EcsConfig::from_json_str(r#"{ "entity_capacity": 1024, "log_schedule": true }"#)?;
    let mut world = World::with_config(&config);
    world.insert_resource(FrameCount::default());
    let mut scheduler = Scheduler::with_config(&config);

    // Registered back to front; the constraints decide the order.
    scheduler.add_system(&mut world, Cleanup, &[SystemId::of::<TransformPropagation>()])?;
    scheduler.add_system(
        &mut world,
        TransformPropagation::with_config(&config),
        &[SystemId::of::<Integrate>()],
    )?;
    scheduler.add_system(&mut world, Integrate, &[SystemId::of::<ApplyGravity>()])?;
    scheduler.add_system(&mut world, ApplyGravity, &[SystemId::of::<Spawner>()])?;
    scheduler.add_system(&mut world, Spawner { per_frame: 8 }, &[])?;
    log::info!("order: {}", scheduler.order().join(" → "));

    // Spawner after Paradox and Paradox after Spawner: no valid order exists.
    struct Paradox;
    impl System for Paradox {
        fn update(&mut self, _world: &mut World, _dt: f32) {}
    }
    let mut sandbox = Scheduler::new();
    sandbox.add_system(&mut world, Spawner { per_frame: 0 }, &[SystemId::of::<Paradox>()])?;
    if let Err(err) = sandbox.add_system(&mut world, Paradox, &[SystemId::of::<Spawner>()]) {
        log::info!("rejected: {err}");
    }
    sandbox.shutdown(&mut world);

    for _ in 0..90 {
        scheduler.update(&mut world, 1.0 / 60.0);
    }

    log::info!(
        "after {} frames: {} entities alive, {} frozen",
        world.resource::<FrameCount>().0,
        world.entity_count(),
        world.component_count::<Frozen>()
    );
    for timing in scheduler.timings() {
        log::info!("{:>22}: {:8.1} µs", timing.name, timing.duration_us);
    }

    scheduler.shutdown(&mut world);
    Ok(())
}
