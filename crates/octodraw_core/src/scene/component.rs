//! # Component Records
//!
//! Components are pooled data records referenced by entity handles.
//! A recycled slot keeps its previous value until overwritten, which is how
//! rendering surfaces survive from one occupant to the next.

use std::sync::Arc;

use super::direction::Direction;
use crate::backend::{FrameSource, SurfaceRef};
use crate::math::Vec2;

/// Interned-style animation name. Cloning is a reference count bump.
///
/// The empty name means "no animation".
pub type AnimName = Arc<str>;

/// Returns the shared empty animation name.
#[must_use]
pub fn empty_name() -> AnimName {
    Arc::from("")
}

/// Compares two names, short-circuiting on shared storage.
#[inline]
#[must_use]
pub fn same_name(a: &AnimName, b: &AnimName) -> bool {
    Arc::ptr_eq(a, b) || a == b
}

/// Key into the old/new position buffers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PositionIndex {
    /// Index in both position arrays.
    pub idx: usize,
}

/// A surface created through the rendering backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderingInfo {
    /// `None` until the slot's first occupant creates one.
    pub surface: Option<SurfaceRef>,
}

/// Playback state of one entity.
pub struct AnimationState {
    /// Offset applied to every frame texture.
    pub offset: Vec2,
    /// Where frame data comes from.
    pub frames: Option<Arc<dyn FrameSource>>,
    /// Total elapsed time at which the current frame started.
    pub start: f64,
    /// Frame being displayed.
    pub frame_index: usize,
    /// Animation requested by the caller.
    pub current_animation: AnimName,
    /// Animation chained after the current one ends, empty for none.
    pub next_animation: AnimName,
    /// Destroy the entity once the current animation ends.
    pub one_shot: bool,
    /// Takes precedence over the dynamic idle/moving pair.
    pub has_priority: bool,
    /// The entity's own surface.
    pub info: RenderingInfo,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            frames: None,
            start: 0.0,
            frame_index: 0,
            current_animation: empty_name(),
            next_animation: empty_name(),
            one_shot: false,
            has_priority: false,
            info: RenderingInfo::default(),
        }
    }
}

impl AnimationState {
    /// Switches to a new animation, restarting playback at `now`.
    pub fn restart(&mut self, current: AnimName, next: AnimName, now: f64) {
        self.current_animation = current;
        self.next_animation = next;
        self.frame_index = 0;
        self.start = now;
    }
}

/// The four directed variants of a base animation name.
#[derive(Clone, Debug)]
pub struct DirectionalAnimation {
    /// Base name the variants were derived from.
    pub base_name: AnimName,
    /// Derived names, indexed by [`Direction::slot`].
    pub names: [AnimName; 4],
}

impl Default for DirectionalAnimation {
    fn default() -> Self {
        Self::new(empty_name())
    }
}

impl DirectionalAnimation {
    /// Derives `up_`, `down_`, `left_` and `right_` names from `base`.
    #[must_use]
    pub fn new(base: AnimName) -> Self {
        let derive = |prefix: &str| -> AnimName { Arc::from(format!("{prefix}{base}")) };
        Self {
            names: [derive("up_"), derive("down_"), derive("left_"), derive("right_")],
            base_name: base,
        }
    }

    /// Re-derives the names if `base` differs from the cached base.
    ///
    /// # Returns
    ///
    /// `true` if the names were recomputed.
    pub fn refresh(&mut self, base: &AnimName) -> bool {
        if same_name(&self.base_name, base) {
            return false;
        }
        *self = Self::new(Arc::clone(base));
        true
    }

    /// Whether the base name is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base_name.is_empty()
    }

    /// Directed name for `direction`. [`Direction::None`] falls back to left.
    #[inline]
    #[must_use]
    pub fn name(&self, direction: Direction) -> &AnimName {
        let direction = match direction {
            Direction::None => Direction::Left,
            other => other,
        };
        &self.names[direction.slot().unwrap_or_default()]
    }
}

/// Idle and moving directional animations, picked by movement state.
#[derive(Clone, Debug, Default)]
pub struct DynamicAnimation {
    /// Shown while the direction handler is idle.
    pub idle: DirectionalAnimation,
    /// Shown while the direction handler is moving.
    pub moving: DirectionalAnimation,
}

impl DynamicAnimation {
    /// Creates the pair from two base names.
    #[must_use]
    pub fn new(idle: AnimName, moving: AnimName) -> Self {
        Self {
            idle: DirectionalAnimation::new(idle),
            moving: DirectionalAnimation::new(moving),
        }
    }

    /// Directed name for the given movement state and facing.
    #[inline]
    #[must_use]
    pub fn name(&self, idle: bool, direction: Direction) -> &AnimName {
        if idle {
            self.idle.name(direction)
        } else {
            self.moving.name(direction)
        }
    }
}
