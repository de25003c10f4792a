//! # Double-Buffered Positions
//!
//! Decouples a fixed simulation rate from a variable render rate.
//!
//! ## Architecture
//!
//! ```text
//!   simulation tick N        simulation tick N+1
//!   ──────┬──────────────────────────┬──────────
//!         │ update_pos(): swap       │ update_pos(): swap
//!         │ set_new_pos(...)         │ set_new_pos(...)
//!         ▼                          ▼
//!      old ────── render ticks ────▶ new
//!          lerp(old, new, elapsed / time_step)
//! ```
//!
//! After a swap the `new` buffer holds stale data until the caller writes
//! the positions of the next tick.

use crate::math::Vec2;

/// Old/new position arrays indexed by position slot.
#[derive(Debug, Default, Clone)]
pub struct PositionBuffers {
    /// Positions at the start of the current interpolation interval.
    old_positions: Vec<Vec2>,
    /// Positions at the end of the current interpolation interval.
    new_positions: Vec<Vec2>,
    /// Render time accumulated since the last swap, in seconds.
    elapsed_since_update: f64,
}

impl PositionBuffers {
    /// Creates buffers with room for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            old_positions: Vec::with_capacity(capacity),
            new_positions: Vec::with_capacity(capacity),
            elapsed_since_update: 0.0,
        }
    }

    /// Number of slots both buffers can address.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.new_positions.len()
    }

    /// Returns `true` if no slot was ever placed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_positions.is_empty()
    }

    /// Places a slot at `position` in both buffers, growing them if needed.
    pub fn place(&mut self, index: usize, position: Vec2) {
        if index >= self.new_positions.len() {
            self.old_positions.resize(index + 1, Vec2::ZERO);
            self.new_positions.resize(index + 1, Vec2::ZERO);
        }
        self.old_positions[index] = position;
        self.new_positions[index] = position;
    }

    /// Writes the end position of the current interval.
    pub fn set_new(&mut self, index: usize, position: Vec2) {
        if let Some(slot) = self.new_positions.get_mut(index) {
            *slot = position;
        }
    }

    /// Start position of the current interval.
    #[inline]
    #[must_use]
    pub fn old(&self, index: usize) -> Option<Vec2> {
        self.old_positions.get(index).copied()
    }

    /// End position of the current interval.
    #[inline]
    #[must_use]
    pub fn new_position(&self, index: usize) -> Option<Vec2> {
        self.new_positions.get(index).copied()
    }

    /// Movement over the current interval (`new - old`).
    #[inline]
    #[must_use]
    pub fn delta(&self, index: usize) -> Vec2 {
        match (self.old(index), self.new_position(index)) {
            (Some(old), Some(new)) => new - old,
            _ => Vec2::ZERO,
        }
    }

    /// Swaps the buffers and starts a new interpolation interval.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.old_positions, &mut self.new_positions);
        self.elapsed_since_update = 0.0;
    }

    /// Accumulates render time since the last swap.
    #[inline]
    pub fn advance(&mut self, delta: f64) {
        self.elapsed_since_update += delta;
    }

    /// Render time accumulated since the last swap.
    #[inline]
    #[must_use]
    pub fn elapsed_since_update(&self) -> f64 {
        self.elapsed_since_update
    }

    /// Interpolated position of a slot, before display scaling.
    ///
    /// The blend factor is clamped to `[0, 1]` so a late simulation tick
    /// holds the entity at its target instead of overshooting.
    #[must_use]
    pub fn interpolate(&self, index: usize, time_step: f64) -> Vec2 {
        let (Some(old), Some(new)) = (self.old(index), self.new_position(index)) else {
            return Vec2::ZERO;
        };
        let t = if time_step > 0.0 {
            (self.elapsed_since_update / time_step).clamp(0.0, 1.0)
        } else {
            1.0
        };
        #[allow(clippy::cast_possible_truncation)]
        old.lerp(new, t as f32)
    }
}
