//! # Entity Hierarchies — Parent/Child Relationships
//!
//! A hierarchy is stored as two ordinary components kept in sync by
//! [`World::set_parent`]:
//!
//! ```text
//! root ── Children([a, b])
//!  ├─ a ── Parent(root), Children([c])
//!  │   └─ c ── Parent(a)
//!  └─ b ── Parent(root)
//! ```
//!
//! An entity has at most one parent and the graph is acyclic: `set_parent`
//! rejects any assignment that would make an entity its own ancestor.
//!
//! ## Usage
//!
//! ```ignore
//! let ship = world.spawn((LocalTransform::from_xyz(100.0, 50.0, 0.0),));
//! let turret = world.spawn_child(ship, (LocalTransform::from_xyz(0.0, 2.0, 0.0),))?;
//!
//! world.set_parent(turret, None)?;      // detach
//! world.destroy_recursive(ship);        // ship and everything below it
//! ```
//!
//! Destroying an entity removes it from its parent's [`Children`]. Its own
//! children keep a [`Parent`] pointing at the dead entity and are treated as
//! roots from then on.

use std::collections::HashSet;

use super::component::Component;
use super::entity::Entity;
use super::world::{Bundle, World};
use crate::error::EcsError;

/// Marks an entity as a child of another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub Entity);

impl Component for Parent {}

/// The child entities of a parent, in attachment order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children(pub Vec<Entity>);

impl Component for Children {}

impl World {
    /// Make `parent` the parent of `child`, or detach `child` with `None`.
    ///
    /// Updates [`Parent`] on `child` and [`Children`] on both the old and the
    /// new parent. Re-parenting to the current parent is a no-op.
    ///
    /// Fails with [`EcsError::CyclicHierarchy`] if `child` is `parent` or one
    /// of its ancestors, and with [`EcsError::DeadEntity`] if either entity is
    /// not alive. On failure nothing is changed.
    pub fn set_parent(&mut self, child: Entity, parent: Option<Entity>) -> Result<(), EcsError> {
        if !self.is_alive(child) {
            return Err(EcsError::DeadEntity(child));
        }
        let old = self.get_component::<Parent>(child).map(|p| p.0);

        let Some(parent) = parent else {
            if let Some(old) = old {
                self.unlink_child(old, child);
                self.remove_component::<Parent>(child);
            }
            return Ok(());
        };

        if !self.is_alive(parent) {
            return Err(EcsError::DeadEntity(parent));
        }
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            log::warn!("refusing to parent {child} to {parent}: would create a cycle");
            return Err(EcsError::CyclicHierarchy { child, parent });
        }
        if old == Some(parent) {
            return Ok(());
        }

        if let Some(old) = old {
            self.unlink_child(old, child);
        }
        self.set_component(child, Parent(parent));
        match self.get_component_mut::<Children>(parent) {
            Some(children) => children.0.push(child),
            None => self.set_component(parent, Children(vec![child])),
        }
        Ok(())
    }

    /// Spawn an entity with `bundle` as a child of `parent`.
    ///
    /// Fails with [`EcsError::DeadEntity`] (and spawns nothing) if `parent`
    /// is not alive.
    pub fn spawn_child<B: Bundle>(&mut self, parent: Entity, bundle: B) -> Result<Entity, EcsError> {
        if !self.is_alive(parent) {
            return Err(EcsError::DeadEntity(parent));
        }
        let child = self.spawn(bundle);
        self.set_parent(child, Some(parent))?;
        Ok(child)
    }

    /// The live parent of `entity`, if any.
    pub fn parent_of(&self, entity: Entity) -> Option<Entity> {
        self.get_component::<Parent>(entity)
            .map(|p| p.0)
            .filter(|&parent| self.is_alive(parent))
    }

    /// The children of `entity`, in attachment order. Empty if it has none.
    pub fn children_of(&self, entity: Entity) -> &[Entity] {
        self.get_component::<Children>(entity)
            .map(|c| c.0.as_slice())
            .unwrap_or(&[])
    }

    /// Walk up from `entity` (exclusive) to its root, nearest first.
    pub fn ancestors(&self, entity: Entity) -> Ancestors<'_> {
        Ancestors {
            world: self,
            current: entity,
            remaining: self.entity_count(),
        }
    }

    /// Destroy `entity` and every descendant. Returns how many entities were
    /// destroyed.
    pub fn destroy_recursive(&mut self, entity: Entity) -> usize {
        if !self.is_alive(entity) {
            return 0;
        }

        let mut doomed = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![entity];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            doomed.push(current);
            stack.extend_from_slice(self.children_of(current));
        }
        self.destroy_entities(doomed)
    }
}

/// Iterator returned by [`World::ancestors`].
///
/// Stops at the first entity without a live parent. The walk is capped at
/// the number of live entities, so a corrupted (cyclic) `Parent` chain ends
/// instead of looping.
pub struct Ancestors<'w> {
    world: &'w World,
    current: Entity,
    remaining: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        if self.remaining == 0 {
            return None;
        }
        let parent = self.world.parent_of(self.current)?;
        self.remaining -= 1;
        self.current = parent;
        Some(parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Name(&'static str);
    impl Component for Name {}

    #[test]
    fn set_parent_links_both_sides() {
        let mut world = World::new();
        let parent = world.create_entity();
        let child = world.create_entity();

        world.set_parent(child, Some(parent)).unwrap();

        assert_eq!(world.get_component::<Parent>(child), Some(&Parent(parent)));
        assert_eq!(world.children_of(parent), &[child]);
        assert_eq!(world.parent_of(child), Some(parent));
        assert_eq!(world.parent_of(parent), None);
    }

    #[test]
    fn reparent_moves_child_between_parents() {
        let mut world = World::new();
        let a = world.create_entity();
        let b = world.create_entity();
        let child = world.create_entity();
        let sibling = world.create_entity();

        world.set_parent(child, Some(a)).unwrap();
        world.set_parent(sibling, Some(a)).unwrap();
        world.set_parent(child, Some(b)).unwrap();

        assert_eq!(world.children_of(a), &[sibling]);
        assert_eq!(world.children_of(b), &[child]);
        assert_eq!(world.parent_of(child), Some(b));
    }

    #[test]
    fn detach_removes_empty_children() {
        let mut world = World::new();
        let parent = world.create_entity();
        let child = world.create_entity();
        world.set_parent(child, Some(parent)).unwrap();

        world.set_parent(child, None).unwrap();

        assert!(!world.has_component::<Parent>(child));
        assert!(!world.has_component::<Children>(parent));
        assert!(world.children_of(parent).is_empty());
    }

    #[test]
    fn same_parent_twice_is_noop() {
        let mut world = World::new();
        let parent = world.create_entity();
        let child = world.create_entity();
        world.set_parent(child, Some(parent)).unwrap();
        world.set_parent(child, Some(parent)).unwrap();
        assert_eq!(world.children_of(parent), &[child]);
    }

    #[test]
    fn self_parent_is_rejected() {
        let mut world = World::new();
        let e = world.create_entity();
        assert_eq!(
            world.set_parent(e, Some(e)),
            Err(EcsError::CyclicHierarchy { child: e, parent: e })
        );
        assert!(!world.has_component::<Parent>(e));
    }

    #[test]
    fn ancestor_cycle_is_rejected_and_state_kept() {
        let mut world = World::new();
        let root = world.create_entity();
        let mid = world.create_entity();
        let leaf = world.create_entity();
        world.set_parent(mid, Some(root)).unwrap();
        world.set_parent(leaf, Some(mid)).unwrap();

        assert_eq!(
            world.set_parent(root, Some(leaf)),
            Err(EcsError::CyclicHierarchy {
                child: root,
                parent: leaf,
            })
        );
        assert_eq!(world.parent_of(root), None);
        assert!(world.children_of(leaf).is_empty());
        assert_eq!(world.ancestors(leaf).collect::<Vec<_>>(), vec![mid, root]);
    }

    #[test]
    fn dead_entities_are_rejected() {
        let mut world = World::new();
        let alive = world.create_entity();
        let dead = world.create_entity();
        world.destroy_entity(dead);

        assert_eq!(world.set_parent(dead, Some(alive)), Err(EcsError::DeadEntity(dead)));
        assert_eq!(world.set_parent(alive, Some(dead)), Err(EcsError::DeadEntity(dead)));
        assert_eq!(
            world.spawn_child(dead, (Name("orphan"),)),
            Err(EcsError::DeadEntity(dead))
        );
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn spawn_child_attaches_bundle_and_parent() {
        let mut world = World::new();
        let parent = world.spawn((Name("ship"),));
        let child = world.spawn_child(parent, (Name("turret"),)).unwrap();

        assert_eq!(world.get_component::<Name>(child), Some(&Name("turret")));
        assert_eq!(world.parent_of(child), Some(parent));
        assert_eq!(world.children_of(parent), &[child]);
    }

    #[test]
    fn destroying_child_unlinks_it() {
        let mut world = World::new();
        let parent = world.create_entity();
        let a = world.spawn_child(parent, (Name("a"),)).unwrap();
        let b = world.spawn_child(parent, (Name("b"),)).unwrap();

        world.destroy_entity(a);
        assert_eq!(world.children_of(parent), &[b]);

        world.destroy_entities([b]);
        assert!(!world.has_component::<Children>(parent));
    }

    #[test]
    fn orphans_become_roots() {
        let mut world = World::new();
        let parent = world.create_entity();
        let child = world.spawn_child(parent, (Name("c"),)).unwrap();

        world.destroy_entity(parent);

        assert!(world.is_alive(child));
        assert_eq!(world.parent_of(child), None);
        assert_eq!(world.ancestors(child).count(), 0);

        // Re-parenting an orphan works and clears the stale link.
        let adopter = world.create_entity();
        world.set_parent(child, Some(adopter)).unwrap();
        assert_eq!(world.parent_of(child), Some(adopter));
    }

    #[test]
    fn destroy_recursive_removes_subtree() {
        let mut world = World::new();
        let root = world.create_entity();
        let a = world.spawn_child(root, (Name("a"),)).unwrap();
        let b = world.spawn_child(root, (Name("b"),)).unwrap();
        let a1 = world.spawn_child(a, (Name("a1"),)).unwrap();
        let unrelated = world.spawn((Name("x"),));

        assert_eq!(world.destroy_recursive(a), 2);
        assert!(!world.is_alive(a1));
        assert_eq!(world.children_of(root), &[b]);

        assert_eq!(world.destroy_recursive(root), 2);
        assert_eq!(world.entity_count(), 1);
        assert!(world.is_alive(unrelated));
        assert_eq!(world.destroy_recursive(root), 0);
    }

    #[test]
    fn ancestors_stop_on_corrupted_cycle() {
        let mut world = World::new();
        let a = world.create_entity();
        let b = world.create_entity();
        // Bypass set_parent to build an invalid graph.
        world.set_component(a, Parent(b));
        world.set_component(b, Parent(a));

        assert_eq!(world.ancestors(a).count(), world.entity_count());
    }
}
