//! # World — The Central Container
//!
//! The [`World`] owns the entity registry, one component pool per component
//! type, and a table of singleton resources. Every collaborator (rendering,
//! physics, audio, gameplay systems) reads and writes state through it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ World                                                │
//! │                                                      │
//! │  registry: EntityRegistry   (ids, generations)       │
//! │                                                      │
//! │  pools: HashMap<TypeId, Box<dyn ComponentPool>>      │
//! │    one SparseSet<T> per component type               │
//! │                                                      │
//! │  resources: HashMap<TypeId, Box<dyn Any>>            │
//! │    singleton data not tied to an entity              │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Mutation During Queries
//!
//! Query iterators borrow the world immutably, so the borrow checker rejects
//! structural mutation while a query is being enumerated. Collect the results
//! first, then write:
//!
//! ```ignore
//! let moved: Vec<_> = world
//!     .query::<(Position, Velocity)>()
//!     .map(|(e, p, v)| (e, p.advanced(v, dt)))
//!     .collect();
//! for (e, p) in moved {
//!     world.set_component(e, p);
//! }
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

use super::component::{Component, ComponentPool, SparseSet};
use super::entity::{Entity, EntityRegistry};
use super::filter::QueryRoot;
use super::hierarchy::{Children, Parent};
use super::query::{ComponentSet, Query, QueryIter};
use crate::config::EcsConfig;

/// The aggregate owner of all entities, component pools, and resources.
pub struct World {
    registry: EntityRegistry,
    pools: HashMap<TypeId, Box<dyn ComponentPool>>,
    resources: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl World {
    pub fn new() -> Self {
        Self {
            registry: EntityRegistry::new(),
            pools: HashMap::new(),
            resources: HashMap::new(),
        }
    }

    /// Create a world sized according to `config`.
    pub fn with_config(config: &EcsConfig) -> Self {
        Self {
            registry: EntityRegistry::with_capacity(config.entity_capacity),
            ..Self::new()
        }
    }

    // ── Resources ────────────────────────────────────────────────────

    /// Insert a resource (singleton value). Replaces any existing resource of
    /// the same type.
    pub fn insert_resource<T: 'static + Send + Sync>(&mut self, value: T) {
        self.resources.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a shared reference to a resource.
    ///
    /// # Panics
    ///
    /// Panics if the resource hasn't been inserted.
    pub fn resource<T: 'static + Send + Sync>(&self) -> &T {
        self.get_resource::<T>().unwrap_or_else(|| {
            panic!(
                "Resource `{}` not found. Did you forget to insert it?",
                type_name::<T>()
            )
        })
    }

    /// Get a mutable reference to a resource.
    ///
    /// # Panics
    ///
    /// Panics if the resource hasn't been inserted.
    pub fn resource_mut<T: 'static + Send + Sync>(&mut self) -> &mut T {
        self.get_resource_mut::<T>().unwrap_or_else(|| {
            panic!(
                "Resource `{}` not found. Did you forget to insert it?",
                type_name::<T>()
            )
        })
    }

    /// Try to get a shared reference to a resource. Returns `None` if not found.
    pub fn get_resource<T: 'static + Send + Sync>(&self) -> Option<&T> {
        self.resources
            .get(&TypeId::of::<T>())
            .and_then(|r| r.downcast_ref::<T>())
    }

    /// Try to get a mutable reference to a resource. Returns `None` if not found.
    pub fn get_resource_mut<T: 'static + Send + Sync>(&mut self) -> Option<&mut T> {
        self.resources
            .get_mut(&TypeId::of::<T>())
            .and_then(|r| r.downcast_mut::<T>())
    }

    pub fn has_resource<T: 'static + Send + Sync>(&self) -> bool {
        self.resources.contains_key(&TypeId::of::<T>())
    }

    /// Remove a resource, taking ownership. Returns `None` if not present.
    pub fn remove_resource<T: 'static + Send + Sync>(&mut self) -> Option<T> {
        self.resources
            .remove(&TypeId::of::<T>())
            .and_then(|r| r.downcast::<T>().ok())
            .map(|b| *b)
    }

    // ── Entity Management ────────────────────────────────────────────

    /// Create an entity with no components.
    pub fn create_entity(&mut self) -> Entity {
        self.registry.create()
    }

    /// Create an entity and attach every component of `bundle`.
    ///
    /// ```ignore
    /// let e = world.spawn((Position::ZERO, Velocity::new(1.0, 0.0)));
    /// ```
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> Entity {
        let entity = self.registry.create();
        bundle.insert_into(self, entity);
        entity
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.registry.is_alive(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.registry.alive_count()
    }

    /// Read-only access to the entity registry.
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Destroy an entity: remove it from every pool, unlink it from its
    /// parent's [`Children`], then free the id.
    ///
    /// Destroying a dead entity is a no-op. Returns whether the entity was alive.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        self.destroy_entities([entity]) == 1
    }

    /// Destroy many entities at once. Produces the same final state as calling
    /// [`destroy_entity`](Self::destroy_entity) for each, but visits every
    /// pool once for the whole batch instead of once per entity.
    ///
    /// Dead and duplicate handles are skipped. Returns how many entities were
    /// destroyed.
    pub fn destroy_entities(&mut self, entities: impl IntoIterator<Item = Entity>) -> usize {
        let doomed: Vec<Entity> = entities
            .into_iter()
            .filter(|&e| self.registry.is_alive(e))
            .collect();
        if doomed.is_empty() {
            return 0;
        }

        // Parent links must be read before the Parent pool loses them.
        for &entity in &doomed {
            if let Some(parent) = self.get_component::<Parent>(entity).map(|p| p.0) {
                self.unlink_child(parent, entity);
            }
        }

        for pool in self.pools.values_mut() {
            if pool.is_empty() {
                continue;
            }
            for &entity in &doomed {
                pool.remove_entity(entity);
            }
        }

        // Ids are freed only after every component is gone.
        let destroyed = doomed
            .into_iter()
            .filter(|&e| self.registry.destroy(e))
            .count();
        log::trace!("destroyed {destroyed} entities");
        destroyed
    }

    /// Remove `child` from `parent`'s [`Children`], dropping the component
    /// once it is empty.
    pub(crate) fn unlink_child(&mut self, parent: Entity, child: Entity) {
        let now_empty = match self.get_component_mut::<Children>(parent) {
            Some(children) => {
                children.0.retain(|&c| c != child);
                children.0.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.remove_component::<Children>(parent);
        }
    }

    // ── Component Access ─────────────────────────────────────────────

    /// Attach `value` to `entity`, replacing any existing `T`.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive.
    pub fn set_component<T: Component>(&mut self, entity: Entity, value: T) {
        assert!(
            self.registry.is_alive(entity),
            "Cannot set component `{}` on dead entity {:?}",
            type_name::<T>(),
            entity
        );
        self.pool_mut::<T>().insert(entity, value);
    }

    /// Get the `T` attached to `entity`. `None` if absent or the entity is dead.
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.pool::<T>()?.get(entity)
    }

    /// Mutable variant of [`get_component`](Self::get_component).
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.pools
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<SparseSet<T>>()?
            .get_mut(entity)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.pool::<T>().is_some_and(|pool| pool.contains(entity))
    }

    /// Fetch several components in one call. `None` unless *all* are present.
    ///
    /// ```ignore
    /// if let Some((pos, vel)) = world.try_get_components::<(Position, Velocity)>(e) { .. }
    /// ```
    pub fn try_get_components<S: ComponentSet>(&self, entity: Entity) -> Option<S::Refs<'_>> {
        S::fetch(self, entity)
    }

    /// Detach and return the `T` on `entity`. No-op if absent.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.pools
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<SparseSet<T>>()?
            .remove(entity)
    }

    /// Number of entities holding a `T`.
    pub fn component_count<T: Component>(&self) -> usize {
        self.pool::<T>().map_or(0, SparseSet::len)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Lazily iterate every entity holding all component types in `Q`.
    ///
    /// `Q` is a tuple of one to five component types; items are
    /// `(Entity, &T1, .., &Tn)`. Iteration is driven by the smallest pool.
    ///
    /// ```ignore
    /// for (entity, pos, vel) in world.query::<(Position, Velocity)>() { .. }
    /// ```
    pub fn query<Q: Query>(&self) -> QueryIter<'_, Q> {
        QueryIter::new(self)
    }

    /// Entry point of the inclusion/exclusion query builder.
    ///
    /// ```ignore
    /// let idle: Vec<_> = world
    ///     .query_builder()
    ///     .with::<Position>()
    ///     .without::<Velocity>()
    ///     .execute()
    ///     .collect();
    /// ```
    pub fn query_builder(&self) -> QueryRoot<'_> {
        QueryRoot::new(self)
    }

    // ── Pools ────────────────────────────────────────────────────────

    pub(crate) fn pool<T: Component>(&self) -> Option<&SparseSet<T>> {
        self.pools
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<SparseSet<T>>()
    }

    pub(crate) fn pool_dyn(&self, type_id: TypeId) -> Option<&dyn ComponentPool> {
        self.pools.get(&type_id).map(|pool| &**pool)
    }

    fn pool_mut<T: Component>(&mut self) -> &mut SparseSet<T> {
        self.pools
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(SparseSet::<T>::new()))
            .as_any_mut()
            .downcast_mut::<SparseSet<T>>()
            .unwrap_or_else(|| panic!("pool for `{}` has the wrong type", type_name::<T>()))
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

// ── Bundles (tuple spawn) ────────────────────────────────────────────────

/// A tuple of components that can be attached in one call.
///
/// Implemented for tuples of one to eight [`Component`] types.
pub trait Bundle {
    fn insert_into(self, world: &mut World, entity: Entity);
}

macro_rules! impl_bundle {
    ($($T:ident),+) => {
        impl<$($T: Component),+> Bundle for ($($T,)+) {
            #[allow(non_snake_case)]
            fn insert_into(self, world: &mut World, entity: Entity) {
                let ($($T,)+) = self;
                $(world.set_component(entity, $T);)+
            }
        }
    };
}

impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);
