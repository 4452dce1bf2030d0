//! # Sparse-Set ECS
//!
//! Entities are generational ids, components live in one sparse set per
//! type, and systems run in an order resolved from declared dependencies.
//!
//! ## Module Overview
//!
//! - [`entity`] — Generational entity IDs and the registry that recycles them
//! - [`component`] — `Component` marker, sparse-set pools, type-erased pool trait
//! - [`world`] — Central container (entities + components + resources)
//! - [`query`] — Fixed-arity tuple queries driven by the smallest pool
//! - [`filter`] — Inclusion/exclusion query builder
//! - [`system`] — System trait and dependency-ordered scheduler
//! - [`hierarchy`] — Parent/child relationships
//! - [`transform`] — Local → world transform propagation

pub mod component;
pub mod entity;
pub mod filter;
pub mod hierarchy;
pub mod query;
pub mod system;
pub mod transform;
pub mod world;

pub use component::Component;
pub use entity::Entity;
pub use filter::{FilterIter, QueryBuilder, QueryRoot};
pub use hierarchy::{Ancestors, Children, Parent};
pub use query::{Query, QueryIter};
pub use system::{Scheduler, System, SystemId};
pub use transform::{PropagationReport, TransformPropagation, WorldTransform, propagate_transforms};
pub use world::{Bundle, World};
