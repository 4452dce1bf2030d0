//! # Component — Sparse-Set Pools
//!
//! Components are plain data attached to an entity under a type key. Each
//! component type gets one pool, a [`SparseSet<T>`], and the
//! [`World`](super::world::World) keeps the pools in a `TypeId`-indexed table
//! of [`ComponentPool`] trait objects.
//!
//! ## Memory Layout
//!
//! ```text
//! sparse:   [None, Some(1), None, Some(0)]   ← indexed by Entity::index
//! dense:    [c3,   c1]                        ← component values, packed
//! entities: [e3,   e1]                        ← parallel to `dense`
//! ```
//!
//! Lookup is `sparse[index] → dense slot`, then a generation check against
//! `entities[slot]` so a stale handle never reads the new occupant's data.
//! Removal swap-removes from the dense arrays and patches the moved entity's
//! sparse entry.
//!
//! ## Why Not Archetypes?
//!
//! Archetype tables make wide iteration cheap but make attach/detach move
//! every component of the entity. Queries here are driven by the *smallest*
//! pool among the requested types, which a per-type pool answers in O(1):
//! `len()` of each candidate.

use std::any::{Any, type_name};

use super::entity::Entity;

/// Marker for types that may be stored in a [`World`](super::world::World).
///
/// Implement it explicitly for each component type:
///
/// ```ignore
/// #[derive(Clone, Copy)]
/// struct Velocity(Vec3);
/// impl Component for Velocity {}
/// ```
pub trait Component: 'static + Send + Sync {}

/// Typed sparse set holding every `T` in the world.
pub struct SparseSet<T> {
    /// `entity.index → dense slot`. `None` means the entity has no `T`.
    sparse: Vec<Option<u32>>,
    dense: Vec<T>,
    /// Owner of each dense slot, including its generation.
    entities: Vec<Entity>,
}

impl<T> SparseSet<T> {
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            entities: Vec::new(),
        }
    }

    fn slot(&self, entity: Entity) -> Option<usize> {
        let slot = (*self.sparse.get(entity.index as usize)?)? as usize;
        (self.entities[slot] == entity).then_some(slot)
    }

    /// Insert or overwrite the value for `entity`. Returns the previous value.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        let index = entity.index as usize;
        if index >= self.sparse.len() {
            self.sparse.resize(index + 1, None);
        }

        if let Some(slot) = self.sparse[index] {
            let slot = slot as usize;
            // A stale owner can only linger here if the caller skipped
            // `remove` on destroy; the new handle takes the slot over.
            self.entities[slot] = entity;
            return Some(std::mem::replace(&mut self.dense[slot], value));
        }

        self.sparse[index] = Some(self.dense.len() as u32);
        self.dense.push(value);
        self.entities.push(entity);
        None
    }

    /// Remove the value for `entity`, if present.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let slot = self.slot(entity)?;
        self.sparse[entity.index as usize] = None;

        let last = self.dense.len() - 1;
        if slot != last {
            let moved = self.entities[last];
            self.sparse[moved.index as usize] = Some(slot as u32);
        }
        self.entities.swap_remove(slot);
        Some(self.dense.swap_remove(slot))
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.slot(entity).map(|slot| &self.dense[slot])
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.slot(entity).map(|slot| &mut self.dense[slot])
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.slot(entity).is_some()
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Owners of the stored values, in dense order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Iterate `(entity, &value)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }
}

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a [`SparseSet`], used wherever the world must touch
/// every pool without knowing the component types (entity destruction,
/// exclusion filters, driver selection).
pub trait ComponentPool: Any + Send + Sync {
    fn contains(&self, entity: Entity) -> bool;

    /// Drop the value owned by `entity`. Returns whether one was present.
    fn remove_entity(&mut self, entity: Entity) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entities(&self) -> &[Entity];

    /// Fully-qualified name of the stored component type.
    fn component_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ComponentPool for SparseSet<T> {
    fn contains(&self, entity: Entity) -> bool {
        SparseSet::contains(self, entity)
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn len(&self) -> usize {
        SparseSet::len(self)
    }

    fn entities(&self) -> &[Entity] {
        SparseSet::entities(self)
    }

    fn component_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Strip the module path from a fully-qualified type name
/// (e.g. `kjarni::math::LocalTransform` → `LocalTransform`).
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    // Keep generic arguments intact: only split the path before the first `<`.
    let head = full.split('<').next().unwrap_or(full);
    let start = head.rfind("::").map_or(0, |i| i + 2);
    &full[start..]
}
