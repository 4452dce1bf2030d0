//! Error types shared by the world, hierarchy, and scheduler.
//!
//! Absence (a missing component, an empty query) is never an error — it is
//! an `Option` or an empty iterator. [`EcsError`] covers the cases that must
//! abort the operation that introduced them: configuration mistakes such as
//! dependency cycles, and references to entities that no longer exist.

use thiserror::Error;

use crate::ecs::Entity;

/// Errors returned by fallible world and scheduler operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    /// The entity handle is stale or was never allocated by this world.
    #[error("entity {0} is not alive")]
    DeadEntity(Entity),

    /// Making `parent` the parent of `child` would make `child` its own ancestor.
    #[error("cannot parent {child} to {parent}: {child} would become its own ancestor")]
    CyclicHierarchy { child: Entity, parent: Entity },

    /// The declared run-after constraints contain a cycle. Lists the systems
    /// on the cycle in dependency order.
    #[error("system dependency cycle: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<&'static str> },

    /// A system of the same type is already registered with the scheduler.
    #[error("system `{0}` is already registered")]
    DuplicateSystem(&'static str),

    /// An [`EcsConfig`](crate::config::EcsConfig) could not be parsed.
    #[error("invalid ECS configuration: {0}")]
    Config(String),
}
