//! # Filter — Inclusion/Exclusion Query Builder
//!
//! Tuple queries fix the component list at compile time. The builder accepts
//! any number of required (`with`) and excluded (`without`) types:
//!
//! ```ignore
//! let idle: Vec<Entity> = world
//!     .query_builder()          // QueryRoot: only `with` is available
//!     .with::<Position>()       // QueryBuilder<Position>: primary type
//!     .with::<Renderable>()
//!     .without::<Velocity>()
//!     .entities()
//!     .collect();
//! ```
//!
//! The root exposes only `with`, so a builder always has a primary type and
//! therefore at least one pool to drive from. `execute` yields
//! `(Entity, &Primary)`.
//!
//! ## Evaluation
//!
//! ```text
//! driver = smallest pool among the `with` types (ties: primary, then `with` order)
//! for each entity in driver:
//!     every `with` pool contains it?   (stop at the first miss)
//!     no `without` pool contains it?   (stop at the first hit)
//!     → yield
//! ```
//!
//! A `without` type that has never been stored excludes nothing. A `with`
//! type that has never been stored makes the result empty.
//!
//! Every `execute` call resolves the pools again and returns a new iterator,
//! so one builder can be evaluated repeatedly.

use std::any::{TypeId, type_name};
use std::marker::PhantomData;
use std::slice;

use super::component::{Component, ComponentPool, SparseSet};
use super::entity::Entity;
use super::world::World;

/// Untyped root returned by [`World::query_builder`].
pub struct QueryRoot<'w> {
    world: &'w World,
}

impl<'w> QueryRoot<'w> {
    pub(crate) fn new(world: &'w World) -> Self {
        Self { world }
    }

    /// Require `T` and make it the primary (yielded) component.
    pub fn with<T: Component>(self) -> QueryBuilder<'w, T> {
        QueryBuilder {
            world: self.world,
            with: Vec::new(),
            without: Vec::new(),
            _primary: PhantomData,
        }
    }
}

/// Builder anchored on a primary component type `T`.
pub struct QueryBuilder<'w, T: Component> {
    world: &'w World,
    /// Required types besides the primary one, in call order.
    with: Vec<TypeId>,
    without: Vec<TypeId>,
    _primary: PhantomData<fn() -> T>,
}

impl<'w, T: Component> QueryBuilder<'w, T> {
    /// Also require `U`.
    pub fn with<U: Component>(mut self) -> Self {
        self.with.push(TypeId::of::<U>());
        self
    }

    /// Exclude entities holding `U`.
    pub fn without<U: Component>(mut self) -> Self {
        self.without.push(TypeId::of::<U>());
        self
    }

    /// Lazily evaluate the filter, yielding `(Entity, &T)`.
    pub fn execute(&self) -> FilterIter<'w, T> {
        let Some(primary) = self.world.pool::<T>() else {
            return FilterIter::empty();
        };

        let mut required: Vec<&'w dyn ComponentPool> = Vec::with_capacity(self.with.len());
        for &type_id in &self.with {
            match self.world.pool_dyn(type_id) {
                Some(pool) => required.push(pool),
                None => return FilterIter::empty(),
            }
        }

        let excluded: Vec<&'w dyn ComponentPool> = self
            .without
            .iter()
            .filter_map(|&type_id| self.world.pool_dyn(type_id))
            .filter(|pool| !pool.is_empty())
            .collect();

        let mut driver: (&'static str, &'w [Entity]) = (type_name::<T>(), primary.entities());
        for &pool in &required {
            if pool.len() < driver.1.len() {
                driver = (pool.component_name(), pool.entities());
            }
        }

        FilterIter {
            primary: Some(primary),
            required,
            excluded,
            driver: Some(driver.0),
            candidates: driver.1.iter(),
        }
    }

    /// Like [`execute`](Self::execute) but yields only the entities.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + use<'w, T> {
        self.execute().map(|(entity, _)| entity)
    }
}

/// Lazy iterator returned by [`QueryBuilder::execute`].
pub struct FilterIter<'w, T: Component> {
    primary: Option<&'w SparseSet<T>>,
    required: Vec<&'w dyn ComponentPool>,
    excluded: Vec<&'w dyn ComponentPool>,
    driver: Option<&'static str>,
    candidates: slice::Iter<'w, Entity>,
}

impl<'w, T: Component> FilterIter<'w, T> {
    fn empty() -> Self {
        let none: &'w [Entity] = &[];
        Self {
            primary: None,
            required: Vec::new(),
            excluded: Vec::new(),
            driver: None,
            candidates: none.iter(),
        }
    }

    /// Component type whose pool drives the iteration, or `None` when a
    /// required type has no pool.
    pub fn driver(&self) -> Option<&'static str> {
        self.driver
    }
}

impl<'w, T: Component> Iterator for FilterIter<'w, T> {
    type Item = (Entity, &'w T);

    fn next(&mut self) -> Option<Self::Item> {
        let primary = self.primary?;
        for &entity in self.candidates.by_ref() {
            let Some(value) = primary.get(entity) else {
                continue;
            };
            if !self.required.iter().all(|pool| pool.contains(entity)) {
                continue;
            }
            if self.excluded.iter().any(|pool| pool.contains(entity)) {
                continue;
            }
            return Some((entity, value));
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.candidates.len()))
    }
}
