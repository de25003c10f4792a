//! # Scene
//!
//! Entities, their pooled components and the per-tick state machines that
//! drive them.

pub mod animation;
mod component;
mod direction;
mod drawer;
mod entity;
mod payload;

pub use component::{
    empty_name, AnimName, AnimationState, DirectionalAnimation, DynamicAnimation, PositionIndex,
    RenderingInfo,
};
pub(crate) use direction::MAX_RUN_LENGTH;
pub use direction::{Direction, DirectionHandler};
pub use drawer::{EntityDrawer, PoolCounts, RenderStats};
pub use entity::{EntityHandle, EntityRecord};
pub use payload::{EntityPayload, NoOpPayload, TablePayload};
