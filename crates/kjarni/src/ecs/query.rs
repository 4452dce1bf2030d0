//! # Query — Fixed-Arity Tuple Queries
//!
//! `world.query::<(A, B)>()` lazily yields `(Entity, &A, &B)` for every
//! entity holding both types.
//!
//! ## Smallest Pool Drives
//!
//! ```text
//! world.query::<(Position, Velocity, Frozen)>()
//!
//! 1. Resolve the three pools. A missing pool means no matches at all.
//! 2. Pick the pool with the fewest entries (ties: first in the tuple).
//! 3. Walk that pool's dense entity list; look up the other pools for each
//!    entity and skip it on the first miss.
//! ```
//!
//! Work is bounded by the smallest relevant set, not the largest. Visitation
//! order follows the driver pool's dense order and changes as entities come
//! and go; only the result *set* is guaranteed.
//!
//! ## The `Query` Trait
//!
//! Implemented by a macro for tuples of one to five [`Component`] types. The
//! pools are resolved once when the iterator is built, so probing is a plain
//! sparse-array lookup per type.

use std::any::type_name;
use std::slice;

use super::component::{Component, SparseSet};
use super::entity::Entity;
use super::world::World;

/// A tuple of component types that can be queried together.
pub trait Query: 'static {
    /// The item yielded per matching entity: `(Entity, &T1, .., &Tn)`.
    type Item<'w>;

    /// Borrowed pools, one per component type.
    type Pools<'w>: Copy;

    /// Resolve every pool. `None` if any component type has never been stored.
    fn pools(world: &World) -> Option<Self::Pools<'_>>;

    /// Pick the smallest pool. Returns its component name and entity list.
    fn driver<'w>(pools: Self::Pools<'w>) -> (&'static str, &'w [Entity]);

    /// Probe every pool for `entity`. `None` on the first miss.
    fn fetch<'w>(pools: Self::Pools<'w>, entity: Entity) -> Option<Self::Item<'w>>;
}

macro_rules! impl_query_tuple {
    ($($T:ident),+) => {
        impl<$($T: Component),+> Query for ($($T,)+) {
            type Item<'w> = (Entity, $(&'w $T,)+);
            type Pools<'w> = ($(&'w SparseSet<$T>,)+);

            fn pools(world: &World) -> Option<Self::Pools<'_>> {
                Some(($(world.pool::<$T>()?,)+))
            }

            #[allow(non_snake_case)]
            fn driver<'w>(pools: Self::Pools<'w>) -> (&'static str, &'w [Entity]) {
                let ($($T,)+) = pools;
                let mut best: Option<(&'static str, &'w [Entity])> = None;
                $(
                    // Strict `<` keeps the earliest tuple position on ties.
                    if best.is_none_or(|(_, entities)| $T.len() < entities.len()) {
                        best = Some((type_name::<$T>(), $T.entities()));
                    }
                )+
                best.unwrap_or_default()
            }

            #[allow(non_snake_case)]
            fn fetch<'w>(pools: Self::Pools<'w>, entity: Entity) -> Option<Self::Item<'w>> {
                let ($($T,)+) = pools;
                Some((entity, $($T.get(entity)?,)+))
            }
        }
    };
}

impl_query_tuple!(A);
impl_query_tuple!(A, B);
impl_query_tuple!(A, B, C);
impl_query_tuple!(A, B, C, D);
impl_query_tuple!(A, B, C, D, E);

/// Lazy iterator returned by [`World::query`].
///
/// Each call to `world.query()` builds a fresh iterator, so a query can be
/// re-run any number of times.
pub struct QueryIter<'w, Q: Query> {
    pools: Option<Q::Pools<'w>>,
    driver_name: Option<&'static str>,
    candidates: slice::Iter<'w, Entity>,
}

impl<'w, Q: Query> QueryIter<'w, Q> {
    pub(crate) fn new(world: &'w World) -> Self {
        match Q::pools(world) {
            Some(pools) => {
                let (name, entities) = Q::driver(pools);
                Self {
                    pools: Some(pools),
                    driver_name: Some(name),
                    candidates: entities.iter(),
                }
            }
            None => {
                let empty: &'w [Entity] = &[];
                Self {
                    pools: None,
                    driver_name: None,
                    candidates: empty.iter(),
                }
            }
        }
    }

    /// Component type whose pool drives this query, or `None` when a
    /// requested type has no pool (the query is empty).
    pub fn driver(&self) -> Option<&'static str> {
        self.driver_name
    }
}

impl<'w, Q: Query> Iterator for QueryIter<'w, Q> {
    type Item = Q::Item<'w>;

    fn next(&mut self) -> Option<Self::Item> {
        let pools = self.pools?;
        self.candidates
            .by_ref()
            .find_map(|&entity| Q::fetch(pools, entity))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.candidates.len()))
    }
}

/// A tuple of two to four component types fetched together by
/// [`World::try_get_components`].
pub trait ComponentSet: 'static {
    type Refs<'w>;

    fn fetch(world: &World, entity: Entity) -> Option<Self::Refs<'_>>;
}

macro_rules! impl_component_set {
    ($($T:ident),+) => {
        impl<$($T: Component),+> ComponentSet for ($($T,)+) {
            type Refs<'w> = ($(&'w $T,)+);

            fn fetch(world: &World, entity: Entity) -> Option<Self::Refs<'_>> {
                Some(($(world.pool::<$T>()?.get(entity)?,)+))
            }
        }
    };
}

impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
