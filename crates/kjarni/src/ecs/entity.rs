//! # Entity — Identifiers Without Data
//!
//! An [`Entity`] is a plain handle. It owns nothing; the
//! [`World`](super::world::World) maps `(component type, entity)` to values.
//!
//! ## Generational Indices
//!
//! Destroyed ids are recycled, so a handle pairs its slot index with a
//! **generation**. Destroying an entity bumps the slot's generation, which
//! turns every outstanding copy of the old handle stale:
//!
//! ```text
//! Entity { index: 5, generation: 0 }  ← first allocation
//! Entity { index: 5, generation: 1 }  ← after recycle
//! ```
//!
//! A stale handle never aliases the new occupant of the slot: liveness checks
//! and component lookups both compare the generation. A slot whose generation
//! would reach `u32::MAX` is retired instead of recycled, so generations never
//! wrap.

use std::fmt;

/// A lightweight handle to an entity in a [`World`](super::world::World).
///
/// Created via [`World::create_entity`](super::world::World::create_entity)
/// and invalidated by [`World::destroy_entity`](super::world::World::destroy_entity).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    /// Slot index in the registry. Recycled after the entity is destroyed.
    pub(crate) index: u32,
    /// Bumped every time the slot is freed, so stale handles can be detected.
    pub(crate) generation: u32,
}

impl Entity {
    /// Returns the raw slot index. Useful for diagnostics and dense storage.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Returns the generation of this handle.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Allocates, recycles, and tracks the liveness of entity ids.
///
/// ```text
/// generations: [0, 1, 0, 2, 0]   ← current generation of every slot
/// free_list:   [1, 3]             ← dead slots waiting for reuse
/// ```
///
/// `create` pops from `free_list` before growing. `destroy` bumps the slot's
/// generation and pushes it onto `free_list`, or retires the slot once its
/// generation is exhausted.
#[derive(Default)]
pub struct EntityRegistry {
    generations: Vec<u32>,
    free_list: Vec<u32>,
    /// Slots that will never be handed out again.
    retired: usize,
}

/// Generation marking a retired slot. Never carried by a live handle.
const RETIRED: u32 = u32::MAX;

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with room for `capacity` slots before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            generations: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            retired: 0,
        }
    }

    /// Return a fresh entity, reusing a destroyed slot when one is available.
    ///
    /// Never returns a handle that is currently alive.
    pub fn create(&mut self) -> Entity {
        if let Some(index) = self.free_list.pop() {
            // Generation was already bumped when the slot was freed.
            let generation = self.generations[index as usize];
            Entity { index, generation }
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            Entity {
                index,
                generation: 0,
            }
        }
    }

    /// Mark `entity` dead and make its slot eligible for reuse.
    ///
    /// Destroying an entity that is already dead is a no-op. Returns whether
    /// the entity was alive.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = &mut self.generations[entity.index as usize];
        *slot += 1;
        if *slot == RETIRED {
            log::debug!("entity slot {} exhausted its generations; retiring it", entity.index);
            self.retired += 1;
        } else {
            self.free_list.push(entity.index);
        }
        true
    }

    /// Check whether the handle refers to a live entity.
    pub fn is_alive(&self, entity: Entity) -> bool {
        entity.generation != RETIRED
            && self
                .generations
                .get(entity.index as usize)
                .is_some_and(|&generation| generation == entity.generation)
    }

    /// Number of live entities.
    pub fn alive_count(&self) -> usize {
        self.generations.len() - self.free_list.len() - self.retired
    }

    /// Number of slots retired after exhausting their generations.
    pub fn retired_count(&self) -> usize {
        self.retired
    }

    /// Number of dead slots waiting for reuse.
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Total number of slots ever allocated.
    pub fn total_slots(&self) -> usize {
        self.generations.len()
    }
}
