//! # Entity Picking
//!
//! Pickable entities are drawn a second time on an off-screen layer, each
//! with a flat color encoding its index (see [`Color::from_index`]). The
//! layer is cleared to white, which decodes to "no entity". Reading the
//! layer back and decoding pixels answers "what is under the cursor" and
//! "what is inside this selection box".
//!
//! The off-screen layer usually renders at a fraction of the window size;
//! [`Picker::scale_viewport`] converts window points to layer pixels.

use std::collections::BTreeSet;

use octodraw_core::{Color, Rect2, Vec2};

/// Read access to an RGBA8 pick layer.
pub trait PickBuffer {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Row-major RGBA8 bytes.
    fn rgba8(&self) -> &[u8];

    /// Pixel at `(x, y)`, `None` out of bounds.
    fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let pixels: &[[u8; 4]] = bytemuck::try_cast_slice(self.rgba8()).ok()?;
        pixels
            .get(y as usize * self.width() as usize + x as usize)
            .copied()
    }

    /// Entity index encoded at `(x, y)`.
    fn index(&self, x: u32, y: u32) -> Option<u32> {
        let [r, g, b, _] = self.pixel(x, y)?;
        Color::rgb8_to_index([r, g, b])
    }
}

/// An owned RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbaImage {
    /// Creates a white image.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0xFF; width as usize * height as usize * 4],
        }
    }

    /// Wraps read-back bytes. `None` if the length does not match the size.
    #[must_use]
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize * 4).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Writes the color of `index` at `(x, y)`. Out of bounds is ignored.
    pub fn put_index(&mut self, x: u32, y: u32, index: u32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = y as usize * self.width as usize + x as usize;
        let [r, g, b] = Color::index_to_rgb8(index);
        let pixels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut self.data);
        pixels[offset] = [r, g, b, 0xFF];
    }

    /// Fills the pixel rectangle `[x0, x1) x [y0, y1)` with `index`.
    pub fn fill_index(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, index: u32) {
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                self.put_index(x, y, index);
            }
        }
    }
}

impl PickBuffer for RgbaImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn rgba8(&self) -> &[u8] {
        &self.data
    }
}

/// Converts window coordinates to pick layer pixels and decodes them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Picker {
    /// Window size divided by pick layer size.
    pub scale_viewport: f32,
}

impl Default for Picker {
    fn default() -> Self {
        Self {
            scale_viewport: 2.0,
        }
    }
}

impl Picker {
    /// Creates a picker for a layer `scale_viewport` times smaller than the
    /// window.
    #[must_use]
    pub const fn new(scale_viewport: f32) -> Self {
        Self { scale_viewport }
    }

    /// Entity index under a window point.
    pub fn index_at<B: PickBuffer + ?Sized>(&self, buffer: &B, point: Vec2) -> Option<u32> {
        let x = self.to_pixel(point.x)?;
        let y = self.to_pixel(point.y)?;
        buffer.index(x, y)
    }

    /// Distinct entity indices inside a window rectangle, ascending.
    pub fn indexes_in_rect<B: PickBuffer + ?Sized>(&self, buffer: &B, rect: Rect2) -> Vec<u32> {
        let mut found = BTreeSet::new();
        self.scan(buffer, rect, |index| {
            found.insert(index);
        });
        found.into_iter().collect()
    }

    /// A `len`-long mask with `true` at every index found inside a window
    /// rectangle. Indices `>= len` are dropped.
    pub fn index_mask_in_rect<B: PickBuffer + ?Sized>(
        &self,
        buffer: &B,
        rect: Rect2,
        len: usize,
    ) -> Vec<bool> {
        let mut mask = vec![false; len];
        self.scan(buffer, rect, |index| {
            if let Some(slot) = mask.get_mut(index as usize) {
                *slot = true;
            }
        });
        mask
    }

    fn scan<B: PickBuffer + ?Sized>(&self, buffer: &B, rect: Rect2, mut visit: impl FnMut(u32)) {
        // Selection boxes may be dragged in any direction
        let start = rect.position;
        let end = rect.end();
        let (min_x, max_x) = (start.x.min(end.x), start.x.max(end.x));
        let (min_y, max_y) = (start.y.min(end.y), start.y.max(end.y));

        let x0 = self.to_pixel(min_x.max(0.0)).unwrap_or(0);
        let y0 = self.to_pixel(min_y.max(0.0)).unwrap_or(0);
        let (Some(x1), Some(y1)) = (self.to_pixel(max_x), self.to_pixel(max_y)) else {
            return;
        };

        for y in y0..=y1.min(buffer.height().saturating_sub(1)) {
            for x in x0..=x1.min(buffer.width().saturating_sub(1)) {
                if let Some(index) = buffer.index(x, y) {
                    visit(index);
                }
            }
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn to_pixel(&self, coordinate: f32) -> Option<u32> {
        let pixel = (coordinate / self.scale_viewport).floor();
        (pixel >= 0.0 && pixel.is_finite()).then_some(pixel as u32)
    }
}
