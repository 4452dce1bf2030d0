//! # Transform Propagation — Local to World Space
//!
//! Game logic authors [`LocalTransform`] relative to the parent. Once per
//! frame, after the logic systems, [`propagate_transforms`] derives every
//! [`WorldTransform`]:
//!
//! ```text
//! roots:  LocalTransform and no live Parent
//!
//! world(root)  = local(root)
//! world(child) = world(parent) * local(child)
//!
//! root → A → B:   world(B) = L_root * L_A * L_B
//! ```
//!
//! Each `local` matrix applies scale, then rotation, then translation (see
//! [`LocalTransform::matrix`]), so a child is scaled and rotated in its own
//! space before the parent's matrix carries it into the parent's space.
//!
//! ## Traversal
//!
//! Depth-first with an explicit stack, children visited in attachment order.
//! A node without a `LocalTransform` is skipped together with its subtree:
//! nothing below it has a parent matrix to compose with, and no default is
//! inserted.
//!
//! The traversal records every visited entity. Reaching one twice means the
//! `Children` graph is cyclic or lists an entity under two parents (only
//! possible by writing `Children` directly); the repeat is logged, reported,
//! and not descended into, so propagation always terminates.
//!
//! [`WorldTransform`] is output only. Anything written to it by hand is
//! overwritten on the next propagation, and an entity the pass does not reach
//! loses its `WorldTransform` instead of keeping last frame's value.

use std::collections::HashSet;

use super::component::Component;
use super::entity::Entity;
use super::system::System;
use super::world::World;
use crate::config::EcsConfig;
use crate::math::{LocalTransform, Mat4, Vec3};

/// The world-space transform computed by [`propagate_transforms`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    pub matrix: Mat4,
}

impl WorldTransform {
    pub const IDENTITY: Self = Self {
        matrix: Mat4::IDENTITY,
    };

    /// World-space position.
    pub fn translation(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Component for WorldTransform {}

/// Outcome of one [`propagate_transforms`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Entities whose `WorldTransform` was written.
    pub updated: usize,
    /// Entities whose `WorldTransform` was removed because this pass did not
    /// reach them.
    pub cleared: usize,
    /// Entities reached a second time through `Children`.
    pub cycles: Vec<Entity>,
    /// Entities holding a `LocalTransform` that no root reached: descendants
    /// of a node without `LocalTransform`, or members of a parent cycle.
    pub unreachable: Vec<Entity>,
}

/// Recompute [`WorldTransform`] for every entity reachable from a root and
/// remove it from every other entity.
pub fn propagate_transforms(world: &mut World) -> PropagationReport {
    let roots: Vec<Entity> = world
        .query::<(LocalTransform,)>()
        .map(|(entity, _)| entity)
        .filter(|&entity| world.parent_of(entity).is_none())
        .collect();

    let mut report = PropagationReport::default();
    let mut visited: HashSet<Entity> = HashSet::new();
    let mut computed: Vec<(Entity, Mat4)> = Vec::new();
    let mut stack: Vec<(Entity, Mat4)> = Vec::new();

    for root in roots {
        stack.push((root, Mat4::IDENTITY));
        while let Some((entity, parent_world)) = stack.pop() {
            if !visited.insert(entity) {
                log::error!("transform hierarchy revisits {entity}; skipping its subtree");
                report.cycles.push(entity);
                continue;
            }
            let Some(local) = world.get_component::<LocalTransform>(entity) else {
                continue;
            };

            let matrix = parent_world * local.matrix();
            computed.push((entity, matrix));

            // Reversed so the first child is popped first.
            for &child in world.children_of(entity).iter().rev() {
                if world.is_alive(child) {
                    stack.push((child, matrix));
                }
            }
        }
    }

    report.unreachable = world
        .query::<(LocalTransform,)>()
        .map(|(entity, _)| entity)
        .filter(|entity| !visited.contains(entity))
        .collect();

    let written: HashSet<Entity> = computed.iter().map(|&(entity, _)| entity).collect();
    let stale: Vec<Entity> = world
        .query::<(WorldTransform,)>()
        .map(|(entity, _)| entity)
        .filter(|entity| !written.contains(entity))
        .collect();

    report.updated = computed.len();
    for (entity, matrix) in computed {
        world.set_component(entity, WorldTransform { matrix });
    }
    report.cleared = stale.len();
    for entity in stale {
        world.remove_component::<WorldTransform>(entity);
    }
    report
}

/// Runs [`propagate_transforms`] every frame and stores the latest
/// [`PropagationReport`] as a world resource.
///
/// Register it after every system that writes `LocalTransform`.
pub struct TransformPropagation {
    warn_unreachable: bool,
}

impl TransformPropagation {
    pub fn new() -> Self {
        Self::with_config(&EcsConfig::default())
    }

    pub fn with_config(config: &EcsConfig) -> Self {
        Self {
            warn_unreachable: config.warn_unreachable_transforms,
        }
    }
}

impl Default for TransformPropagation {
    fn default() -> Self {
        Self::new()
    }
}

impl System for TransformPropagation {
    fn initialize(&mut self, world: &mut World) {
        world.insert_resource(PropagationReport::default());
    }

    fn update(&mut self, world: &mut World, _dt: f32) {
        let report = propagate_transforms(world);
        if self.warn_unreachable && !report.unreachable.is_empty() {
            log::warn!(
                "{} entities with LocalTransform are unreachable from any root: {:?}",
                report.unreachable.len(),
                report.unreachable
            );
        }
        world.insert_resource(report);
    }

    fn shutdown(&mut self, world: &mut World) {
        world.remove_resource::<PropagationReport>();
    }
}
