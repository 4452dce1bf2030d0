//! # Kjarni — ECS Core
//!
//! The data layer a game runs on: a type-indexed component store, tuple and
//! filter queries, a dependency-ordered system scheduler, and hierarchical
//! transform propagation. Rendering, physics, and audio sit on top and talk
//! to it only through [`World`](ecs::World).
//!
//! Start with `use kjarni::prelude::*`.

pub mod config;
pub mod ecs;
pub mod error;
pub mod math;
pub mod prelude;

pub use error::EcsError;
