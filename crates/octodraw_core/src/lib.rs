//! # OCTODRAW Core Engine
//!
//! Lifecycle core for drawing thousands of short-lived animated sprites:
//! - Generational slot pools: stale handles are detected, never followed
//! - Entity graph: main instances own their attachments
//! - Per-tick state machines for facing, animation and interpolation
//!
//! ## Architecture Rules
//!
//! 1. **Handles, not pointers** - every component lives in a [`SlotPool`]
//! 2. **One lock per drawer** - structural mutation and render passes are serialized
//! 3. **Collaborators are injected** - frame data and rendering come in through traits
//!
//! ## Example
//!
//! ```rust,ignore
//! use octodraw_core::{DrawerConfig, EntityDrawer, Vec2};
//!
//! let drawer = EntityDrawer::new(backend, DrawerConfig::default());
//! let hero = drawer.add_instance(Vec2::ZERO, Vec2::ZERO, frames, "walk", "", false, false);
//! drawer.add_direction_handler(hero, true);
//!
//! // simulation tick
//! drawer.update_pos();
//! drawer.set_new_pos(hero, Vec2::new(4.0, 0.0));
//! drawer.advance_simulation();
//!
//! // render tick
//! drawer.advance_render(1.0 / 60.0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod backend;
pub mod config;
pub mod error;
pub mod math;
pub mod memory;
pub mod scene;
pub mod sync;

pub use backend::{FrameSource, RenderBackend, SurfaceRef, SurfaceTarget, TextureRef};
pub use config::DrawerConfig;
pub use error::{DrawerError, DrawerResult};
pub use math::{Color, Rect2, Vec2};
pub use memory::{SlotHandle, SlotPool, Visit};
pub use scene::{
    AnimName, Direction, DirectionHandler, EntityDrawer, EntityHandle, EntityPayload,
    NoOpPayload, PoolCounts, RenderStats, TablePayload,
};
pub use sync::PositionBuffers;
