//! # Plain-Old-Data Math Types
//!
//! Small `Pod` value types shared by the core and the rendering helpers.

use bytemuck::{Pod, Zeroable};
use serde::Deserialize;
use std::ops::{Add, Mul, Sub};

/// A 2D vector in world (or screen) units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Deserialize)]
#[repr(C)]
pub struct Vec2 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the squared length.
    ///
    /// This avoids the sqrt call for threshold comparisons.
    #[inline]
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Linear interpolation towards `other`, `t` is not clamped.
    #[inline]
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Add for Vec2 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// An axis-aligned rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Deserialize)]
#[repr(C)]
pub struct Rect2 {
    /// Top-left corner.
    pub position: Vec2,
    /// Width and height.
    pub size: Vec2,
}

impl Rect2 {
    /// Creates a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(position: Vec2, size: Vec2) -> Self {
        Self { position, size }
    }

    /// Bottom-right corner.
    #[inline]
    #[must_use]
    pub fn end(self) -> Vec2 {
        self.position + self.size
    }
}

/// An RGBA color with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Deserialize)]
#[repr(C)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    /// Opaque white. In a pick buffer this means "no entity".
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Largest index that can be encoded without colliding with white.
    pub const MAX_PICK_INDEX: u32 = 0x00FF_FFFE;

    /// Creates a new color.
    #[inline]
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the same color with a different alpha.
    #[inline]
    #[must_use]
    pub const fn with_alpha(self, a: f32) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Encodes an entity index as a unique opaque color (base-256 RGB, red is
    /// the least significant byte).
    #[must_use]
    pub fn from_index(index: u32) -> Self {
        let [r, g, b] = Self::index_to_rgb8(index);
        Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            1.0,
        )
    }

    /// Like [`from_index`](Self::from_index), `None` for indices that would
    /// encode to white or alias a lower index.
    #[must_use]
    pub fn try_from_index(index: u32) -> Option<Self> {
        (index <= Self::MAX_PICK_INDEX).then(|| Self::from_index(index))
    }

    /// The three 8-bit channels encoding `index`.
    #[inline]
    #[must_use]
    pub const fn index_to_rgb8(index: u32) -> [u8; 3] {
        [
            (index & 0xFF) as u8,
            ((index >> 8) & 0xFF) as u8,
            ((index >> 16) & 0xFF) as u8,
        ]
    }

    /// Decodes 8-bit channels back into an entity index. White decodes to
    /// `None`.
    #[inline]
    #[must_use]
    pub fn rgb8_to_index(rgb: [u8; 3]) -> Option<u32> {
        if rgb == [0xFF, 0xFF, 0xFF] {
            return None;
        }
        Some(u32::from(rgb[0]) | (u32::from(rgb[1]) << 8) | (u32::from(rgb[2]) << 16))
    }

    /// Decodes this color back into an entity index.
    #[must_use]
    pub fn to_index(self) -> Option<u32> {
        Self::rgb8_to_index([
            channel_to_u8(self.r),
            channel_to_u8(self.g),
            channel_to_u8(self.b),
        ])
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel_to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}
