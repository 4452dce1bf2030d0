//! # System — Logic That Runs Every Frame
//!
//! A system is a stateful unit of logic with three lifecycle hooks:
//!
//! ```text
//! add_system ──► initialize ──► update, update, update, … ──► shutdown
//!                (once)         (every frame, in order)        (remove_system
//!                                                               or Scheduler::shutdown)
//! ```
//!
//! ## Ordering
//!
//! Systems declare which systems they must run *after* when they are
//! registered. The [`Scheduler`] turns those constraints into one execution
//! order with Kahn's algorithm:
//!
//! ```text
//! add_system(Input,    [])
//! add_system(Movement, [Input])
//! add_system(Physics,  [Movement])
//! add_system(Audio,    [])
//!
//! edges:  Input → Movement → Physics
//! ready:  [Input, Audio]          ← seeded in registration order
//! order:  Input, Audio, Movement, Physics
//! ```
//!
//! The ready queue is FIFO and seeded in registration order, so the same
//! registration sequence always produces the same order. Resolution is
//! O(V + E).
//!
//! A dependency on a system that is not registered is ignored until that
//! system is registered. A registration that closes a cycle is rejected with
//! [`EcsError::CyclicDependency`], naming the systems on the cycle; the
//! rejected system is never initialized and the previous order stays in
//! effect.
//!
//! ## Comparison
//!
//! - **bevy_ecs**: ordering via `.after()`/`.before()` labels, parallel
//!   execution with access-conflict detection.
//! - **This scheduler**: explicit `runs_after` lists, strictly sequential.

use std::any::{TypeId, type_name};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};

use super::component::short_type_name;
use super::world::World;
use crate::config::EcsConfig;
use crate::error::EcsError;

/// A unit of per-frame logic driven by the [`Scheduler`].
///
/// Only [`update`](System::update) is required.
///
/// ```ignore
/// struct Movement;
///
/// impl System for Movement {
///     fn update(&mut self, world: &mut World, dt: f32) {
///         let moved: Vec<_> = world
///             .query::<(LocalTransform, Velocity)>()
///             .map(|(e, t, v)| (e, t.translation + v.0 * dt))
///             .collect();
///         for (e, translation) in moved {
///             if let Some(t) = world.get_component_mut::<LocalTransform>(e) {
///                 t.translation = translation;
///             }
///         }
///     }
/// }
/// ```
pub trait System: 'static {
    /// Called once when the system is registered.
    fn initialize(&mut self, _world: &mut World) {}

    /// Called once per frame, in resolved order.
    fn update(&mut self, world: &mut World, dt: f32);

    /// Called once when the system is removed or the scheduler shuts down.
    fn shutdown(&mut self, _world: &mut World) {}
}

/// Identifies a system by its type. Used to declare `runs_after`
/// dependencies and to remove systems.
#[derive(Clone, Copy)]
pub struct SystemId {
    type_id: TypeId,
    name: &'static str,
}

impl SystemId {
    pub fn of<S: System>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            name: short_type_name(type_name::<S>()),
        }
    }

    /// Type name without the module path.
    pub fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for SystemId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for SystemId {}

impl Hash for SystemId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SystemId({})", self.name)
    }
}

/// Wall time of one system during the most recent [`Scheduler::update`].
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone)]
pub struct SystemTiming {
    pub name: &'static str,
    pub duration_us: f64,
}

struct ScheduledSystem {
    id: SystemId,
    runs_after: Vec<SystemId>,
    system: Box<dyn System>,
}

/// Owns the registered systems and runs them in dependency order.
pub struct Scheduler {
    /// Registration order.
    systems: Vec<ScheduledSystem>,
    /// Execution order, as indices into `systems`.
    order: Vec<usize>,
    log_schedule: bool,
    /// Per-system timings from the most recent `update()` call.
    #[cfg(feature = "diagnostics")]
    timings: Vec<SystemTiming>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            order: Vec::new(),
            log_schedule: false,
            #[cfg(feature = "diagnostics")]
            timings: Vec::new(),
        }
    }

    pub fn with_config(config: &EcsConfig) -> Self {
        let mut scheduler = Self::new();
        scheduler.log_schedule = config.log_schedule;
        scheduler
    }

    /// Register `system`, which must run after every system in `runs_after`.
    ///
    /// The execution order is resolved first. If it fails the system is
    /// dropped without being initialized and the scheduler is unchanged.
    /// Otherwise [`System::initialize`] runs and the new order takes effect.
    pub fn add_system<S: System>(
        &mut self,
        world: &mut World,
        system: S,
        runs_after: &[SystemId],
    ) -> Result<(), EcsError> {
        let id = SystemId::of::<S>();
        if self.contains(id) {
            return Err(EcsError::DuplicateSystem(id.name));
        }

        let mut nodes = self.nodes();
        nodes.push((id, runs_after));

        for dep in runs_after {
            if !nodes.iter().any(|(node, _)| node == dep) {
                log::debug!(
                    "`{}` runs after `{}`, which is not registered yet",
                    id.name,
                    dep.name
                );
            }
        }

        let order = resolve_order(&nodes).inspect_err(|err| {
            log::error!("rejected system `{}`: {err}", id.name);
        })?;

        let mut system: Box<dyn System> = Box::new(system);
        system.initialize(world);
        log::debug!("initialized system `{}`", id.name);

        self.systems.push(ScheduledSystem {
            id,
            runs_after: runs_after.to_vec(),
            system,
        });
        self.order = order;
        self.log_order();
        Ok(())
    }

    /// Shut down and remove the system identified by `id`.
    ///
    /// Returns `false` if no such system is registered. The order is resolved
    /// again from the remaining registrations, so it matches registering
    /// them fresh. Constraints naming the removed system stay pending.
    pub fn remove_system(&mut self, world: &mut World, id: SystemId) -> bool {
        let Some(index) = self.systems.iter().position(|s| s.id == id) else {
            return false;
        };

        let mut removed = self.systems.remove(index);
        removed.system.shutdown(world);
        log::debug!("shut down system `{}`", id.name);

        // Dropping a node cannot close a cycle.
        let remaining = self.systems.len();
        let resolved = resolve_order(&self.nodes());
        self.order = resolved.unwrap_or_else(|err| {
            log::error!("re-resolving after removing `{}` failed: {err}", id.name);
            (0..remaining).collect()
        });
        self.log_order();
        true
    }

    /// Run [`System::update`] on every system in resolved order.
    pub fn update(&mut self, world: &mut World, dt: f32) {
        #[cfg(feature = "diagnostics")]
        {
            self.timings.clear();
            for &index in &self.order {
                let scheduled = &mut self.systems[index];
                let start = std::time::Instant::now();
                scheduled.system.update(world, dt);
                let elapsed = start.elapsed();
                self.timings.push(SystemTiming {
                    name: scheduled.id.name,
                    duration_us: elapsed.as_secs_f64() * 1_000_000.0,
                });
            }
        }
        #[cfg(not(feature = "diagnostics"))]
        {
            for &index in &self.order {
                self.systems[index].system.update(world, dt);
            }
        }
    }

    /// Shut down every system in reverse execution order and remove them all.
    pub fn shutdown(&mut self, world: &mut World) {
        for &index in self.order.iter().rev() {
            let scheduled = &mut self.systems[index];
            scheduled.system.shutdown(world);
            log::debug!("shut down system `{}`", scheduled.id.name);
        }
        self.systems.clear();
        self.order.clear();
        #[cfg(feature = "diagnostics")]
        self.timings.clear();
    }

    /// System names in execution order.
    pub fn order(&self) -> Vec<&'static str> {
        self.order.iter().map(|&i| self.systems[i].id.name).collect()
    }

    pub fn contains(&self, id: SystemId) -> bool {
        self.systems.iter().any(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Per-system timings from the most recent [`update`](Self::update), in
    /// execution order.
    #[cfg(feature = "diagnostics")]
    pub fn timings(&self) -> &[SystemTiming] {
        &self.timings
    }

    /// `(system, runs_after)` pairs in registration order.
    fn nodes(&self) -> Vec<(SystemId, &[SystemId])> {
        self.systems
            .iter()
            .map(|s| (s.id, s.runs_after.as_slice()))
            .collect()
    }

    fn log_order(&self) {
        let order = self.order().join(" → ");
        if self.log_schedule {
            log::info!("system order: {order}");
        } else {
            log::debug!("system order: {order}");
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if !self.systems.is_empty() {
            log::warn!(
                "scheduler dropped with {} systems that were never shut down",
                self.systems.len()
            );
        }
    }
}

// ── Dependency resolution ────────────────────────────────────────────────

/// Kahn's topological sort over `(system, runs_after)` pairs.
///
/// Returns indices into `nodes` in execution order. Dependencies that are not
/// among `nodes` are ignored.
fn resolve_order(nodes: &[(SystemId, &[SystemId])]) -> Result<Vec<usize>, EcsError> {
    let index: HashMap<SystemId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, (id, _))| (*id, i))
        .collect();

    let n = nodes.len();
    let mut in_degree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (node, (_, runs_after)) in nodes.iter().enumerate() {
        for dep in runs_after.iter() {
            let Some(&before) = index.get(dep) else {
                continue;
            };
            if predecessors[node].contains(&before) {
                continue;
            }
            predecessors[node].push(before);
            dependents[before].push(node);
            in_degree[node] += 1;
        }
    }

    let mut ready: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(node) = ready.pop_front() {
        order.push(node);
        for &next in &dependents[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push_back(next);
            }
        }
    }

    if order.len() == n {
        return Ok(order);
    }

    let cycle = find_cycle(&in_degree, &predecessors)
        .into_iter()
        .map(|i| nodes[i].0.name)
        .collect();
    Err(EcsError::CyclicDependency { cycle })
}

/// Extract one cycle from the nodes Kahn's algorithm could not order.
///
/// Every unordered node still has an unordered predecessor, so walking
/// predecessors from any of them must revisit a node. The walk runs against
/// the edges; the result is reversed into execution order and closed by
/// repeating its first node.
fn find_cycle(in_degree: &[usize], predecessors: &[Vec<usize>]) -> Vec<usize> {
    let stuck = |i: usize| in_degree[i] > 0;
    let Some(start) = (0..in_degree.len()).find(|&i| stuck(i)) else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut position = HashMap::from([(start, 0usize)]);
    let mut current = start;
    while let Some(&prev) = predecessors[current].iter().find(|&&p| stuck(p)) {
        if let Some(&at) = position.get(&prev) {
            let mut cycle = path.split_off(at);
            cycle.reverse();
            cycle.push(cycle[0]);
            return cycle;
        }
        position.insert(prev, path.len());
        path.push(prev);
        current = prev;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log(Vec<String>);

    fn world() -> World {
        let mut world = World::new();
        world.insert_resource(Log::default());
        world
    }

    fn log(world: &World) -> Vec<String> {
        world.resource::<Log>().0.clone()
    }

    macro_rules! recording_system {
        ($($name:ident),+) => {$(
            struct $name;

            impl System for $name {
                fn initialize(&mut self, world: &mut World) {
                    world.resource_mut::<Log>().0.push(format!("init {}", stringify!($name)));
                }

                fn update(&mut self, world: &mut World, _dt: f32) {
                    world.resource_mut::<Log>().0.push(stringify!($name).to_string());
                }

                fn shutdown(&mut self, world: &mut World) {
                    world.resource_mut::<Log>().0.push(format!("shutdown {}", stringify!($name)));
                }
            }
        )+};
    }

    recording_system!(Input, Movement, Physics, Render, Audio);

    #[test]
    fn dependencies_run_first() {
        let mut world = world();
        let mut scheduler = Scheduler::new();
        // Registered in reverse: the order comes from the constraints alone.
        scheduler
            .add_system(&mut world, Render, &[SystemId::of::<Physics>()])
            .unwrap();
        scheduler
            .add_system(&mut world, Physics, &[SystemId::of::<Movement>()])
            .unwrap();
        scheduler
            .add_system(&mut world, Movement, &[SystemId::of::<Input>()])
            .unwrap();
        scheduler.add_system(&mut world, Input, &[]).unwrap();

        assert_eq!(scheduler.order(), vec!["Input", "Movement", "Physics", "Render"]);

        world.resource_mut::<Log>().0.clear();
        scheduler.update(&mut world, 0.016);
        assert_eq!(log(&world), vec!["Input", "Movement", "Physics", "Render"]);
        scheduler.shutdown(&mut world);
    }

    #[test]
    fn independent_systems_keep_registration_order() {
        let build = || {
            let mut world = world();
            let mut scheduler = Scheduler::new();
            scheduler.add_system(&mut world, Audio, &[]).unwrap();
            scheduler.add_system(&mut world, Input, &[]).unwrap();
            scheduler
                .add_system(&mut world, Movement, &[SystemId::of::<Input>()])
                .unwrap();
            scheduler.add_system(&mut world, Render, &[]).unwrap();
            let order = scheduler.order();
            scheduler.shutdown(&mut world);
            order
        };

        let first = build();
        assert_eq!(first, vec!["Audio", "Input", "Render", "Movement"]);
        assert_eq!(first, build());
    }

    #[test]
    fn cycle_is_rejected_without_initializing() {
        let mut world = world();
        let mut scheduler = Scheduler::new();
        scheduler
            .add_system(&mut world, Movement, &[SystemId::of::<Physics>()])
            .unwrap();
        let err = scheduler
            .add_system(&mut world, Physics, &[SystemId::of::<Movement>()])
            .unwrap_err();

        assert_eq!(
            err,
            EcsError::CyclicDependency {
                cycle: vec!["Physics", "Movement", "Physics"],
            }
        );
        assert!(!scheduler.contains(SystemId::of::<Physics>()));
        assert_eq!(scheduler.order(), vec!["Movement"]);
        assert_eq!(log(&world), vec!["init Movement"]);
        scheduler.shutdown(&mut world);
    }

    #[test]
    fn cycle_report_excludes_systems_outside_the_cycle() {
        let mut world = world();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(&mut world, Input, &[]).unwrap();
        scheduler
            .add_system(
                &mut world,
                Movement,
                &[SystemId::of::<Input>(), SystemId::of::<Render>()],
            )
            .unwrap();
        scheduler
            .add_system(&mut world, Physics, &[SystemId::of::<Movement>()])
            .unwrap();
        let err = scheduler
            .add_system(&mut world, Render, &[SystemId::of::<Physics>()])
            .unwrap_err();

        let EcsError::CyclicDependency { cycle } = err else {
            panic!("expected a dependency cycle, got {err:?}");
        };
        assert_eq!(cycle.first(), cycle.last());
        let members: Vec<_> = cycle[..cycle.len() - 1].to_vec();
        assert_eq!(members.len(), 3);
        for name in ["Movement", "Physics", "Render"] {
            assert!(members.contains(&name), "{name} missing from {cycle:?}");
        }
        assert!(!members.contains(&"Input"));
        scheduler.shutdown(&mut world);
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let mut world = world();
        let mut scheduler = Scheduler::new();
        let err = scheduler
            .add_system(&mut world, Audio, &[SystemId::of::<Audio>()])
            .unwrap_err();
        assert_eq!(
            err,
            EcsError::CyclicDependency {
                cycle: vec!["Audio", "Audio"],
            }
        );
        assert!(scheduler.is_empty());
    }

    #[test]
    fn duplicate_system_is_rejected() {
        let mut world = world();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(&mut world, Input, &[]).unwrap();
        assert_eq!(
            scheduler.add_system(&mut world, Input, &[]),
            Err(EcsError::DuplicateSystem("Input"))
        );
        assert_eq!(scheduler.len(), 1);
        scheduler.shutdown(&mut world);
    }

    #[test]
    fn lifecycle_hooks_run_in_order() {
        let mut world = world();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(&mut world, Input, &[]).unwrap();
        scheduler
            .add_system(&mut world, Render, &[SystemId::of::<Input>()])
            .unwrap();
        scheduler.update(&mut world, 0.016);
        scheduler.shutdown(&mut world);

        assert_eq!(
            log(&world),
            vec![
                "init Input",
                "init Render",
                "Input",
                "Render",
                "shutdown Render",
                "shutdown Input",
            ]
        );
        assert!(scheduler.is_empty());
        assert!(scheduler.order().is_empty());
    }

    #[test]
    fn remove_system_shuts_it_down() {
        let mut world = world();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(&mut world, Input, &[]).unwrap();
        scheduler
            .add_system(&mut world, Movement, &[SystemId::of::<Input>()])
            .unwrap();
        scheduler
            .add_system(&mut world, Render, &[SystemId::of::<Movement>()])
            .unwrap();

        assert!(scheduler.remove_system(&mut world, SystemId::of::<Movement>()));
        assert!(!scheduler.remove_system(&mut world, SystemId::of::<Movement>()));
        assert_eq!(scheduler.order(), vec!["Input", "Render"]);

        world.resource_mut::<Log>().0.clear();
        scheduler.update(&mut world, 0.016);
        assert_eq!(log(&world), vec!["Input", "Render"]);
        scheduler.shutdown(&mut world);
    }

    #[test]
    fn removal_resolves_order_from_scratch() {
        let mut world = world();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(&mut world, Input, &[]).unwrap();
        scheduler
            .add_system(&mut world, Render, &[SystemId::of::<Physics>()])
            .unwrap();
        scheduler.add_system(&mut world, Physics, &[]).unwrap();
        scheduler.add_system(&mut world, Audio, &[]).unwrap();
        assert_eq!(scheduler.order(), vec!["Input", "Physics", "Audio", "Render"]);

        assert!(scheduler.remove_system(&mut world, SystemId::of::<Physics>()));

        let mut fresh = Scheduler::new();
        fresh.add_system(&mut world, Input, &[]).unwrap();
        fresh
            .add_system(&mut world, Render, &[SystemId::of::<Physics>()])
            .unwrap();
        fresh.add_system(&mut world, Audio, &[]).unwrap();

        assert_eq!(scheduler.order(), vec!["Input", "Render", "Audio"]);
        assert_eq!(scheduler.order(), fresh.order());

        // Registering Physics again re-binds Render's pending constraint.
        scheduler.add_system(&mut world, Physics, &[]).unwrap();
        assert_eq!(scheduler.order(), vec!["Input", "Audio", "Physics", "Render"]);

        fresh.shutdown(&mut world);
        scheduler.shutdown(&mut world);
    }

    #[test]
    fn removed_system_can_be_registered_again() {
        let mut world = world();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(&mut world, Audio, &[]).unwrap();
        scheduler.remove_system(&mut world, SystemId::of::<Audio>());
        scheduler.add_system(&mut world, Audio, &[]).unwrap();
        assert_eq!(log(&world), vec!["init Audio", "shutdown Audio", "init Audio"]);
        scheduler.shutdown(&mut world);
    }

    #[test]
    fn late_registration_binds_pending_dependency() {
        let mut world = world();
        let mut scheduler = Scheduler::new();
        scheduler
            .add_system(&mut world, Render, &[SystemId::of::<Physics>()])
            .unwrap();
        scheduler.add_system(&mut world, Audio, &[]).unwrap();
        assert_eq!(scheduler.order(), vec!["Render", "Audio"]);

        scheduler.add_system(&mut world, Physics, &[]).unwrap();
        assert_eq!(scheduler.order(), vec!["Audio", "Physics", "Render"]);
        scheduler.shutdown(&mut world);
    }

    #[test]
    fn system_id_names() {
        assert_eq!(SystemId::of::<Movement>().name(), "Movement");
        assert_eq!(format!("{:?}", SystemId::of::<Input>()), "SystemId(Input)");
        assert_ne!(SystemId::of::<Input>(), SystemId::of::<Render>());
    }

    #[cfg(feature = "diagnostics")]
    #[test]
    fn timings_follow_execution_order() {
        let mut world = world();
        let mut scheduler = Scheduler::new();
        scheduler
            .add_system(&mut world, Render, &[SystemId::of::<Input>()])
            .unwrap();
        scheduler.add_system(&mut world, Input, &[]).unwrap();
        assert!(scheduler.timings().is_empty());

        scheduler.update(&mut world, 0.016);
        let names: Vec<_> = scheduler.timings().iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Input", "Render"]);
        assert!(scheduler.timings().iter().all(|t| t.duration_us >= 0.0));
        scheduler.shutdown(&mut world);
    }
}
