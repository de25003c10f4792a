//! # Collaborator Interfaces
//!
//! The core never draws anything itself. Frame data comes from a
//! [`FrameSource`] attached to each entity and drawing goes through the
//! [`RenderBackend`] handed to the drawer at construction.
//!
//! ```text
//!  EntityDrawer ──frame_count / frame_texture──▶ FrameSource (per entity)
//!       │
//!       └──create_surface / set_transform / draw──▶ RenderBackend (one)
//! ```

use crate::math::{Color, Vec2};

/// Opaque handle to a texture owned by the frame source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureRef(pub u64);

/// Opaque handle to a drawing surface owned by the rendering backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceRef(pub u64);

/// Which layer a surface is created on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceTarget {
    /// The visible layer.
    Main,
    /// The off-screen color-index layer used for picking.
    Picking,
}

/// Read-only animation data (sprite frames).
///
/// Implementations must be cheap to query: every render tick asks for the
/// frame count, duration and texture of every visible entity.
pub trait FrameSource: Send + Sync {
    /// Number of frames in `animation`, `0` if unknown.
    fn frame_count(&self, animation: &str) -> usize;

    /// Relative duration of one frame.
    fn frame_duration(&self, animation: &str, frame: usize) -> f64;

    /// Frames per second multiplier of `animation`.
    fn playback_speed(&self, animation: &str) -> f64;

    /// Texture of one frame, `None` for an empty frame.
    fn frame_texture(&self, animation: &str, frame: usize) -> Option<TextureRef>;
}

/// Canvas-item style rendering service.
pub trait RenderBackend: Send {
    /// Creates a new surface on `target`.
    fn create_surface(&mut self, target: SurfaceTarget) -> SurfaceRef;

    /// Draws the surface above its y-sorted siblings.
    fn set_draw_in_front(&mut self, surface: SurfaceRef, in_front: bool) {
        let _ = (surface, in_front);
    }

    /// Sets the flat color used when rendering a picking surface.
    fn set_pick_color(&mut self, surface: SurfaceRef, color: Color) {
        let _ = (surface, color);
    }

    /// Moves the surface to `position`.
    fn set_transform(&mut self, surface: SurfaceRef, position: Vec2);

    /// Removes all draw commands from the surface.
    fn clear(&mut self, surface: SurfaceRef);

    /// Draws `texture` at `offset` relative to the surface origin.
    fn draw(&mut self, surface: SurfaceRef, texture: TextureRef, offset: Vec2);

    /// Releases the surface.
    fn destroy(&mut self, surface: SurfaceRef);
}
