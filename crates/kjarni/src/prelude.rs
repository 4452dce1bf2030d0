//! Convenience re-exports — `use kjarni::prelude::*` for the common items.

pub use crate::config::EcsConfig;
pub use crate::ecs::{
    Children, Component, Entity, Parent, PropagationReport, Scheduler, System, SystemId,
    TransformPropagation, World, WorldTransform, propagate_transforms,
};
pub use crate::error::EcsError;
pub use crate::math::{LocalTransform, Mat4, Quat, Vec3};
#[cfg(feature = "diagnostics")]
pub use crate::ecs::system::SystemTiming;
