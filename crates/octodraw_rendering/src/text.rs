//! # Floating Text
//!
//! Draws many short strings (damage numbers, loot notices) through a
//! [`TextBackend`]. A floating string drifts upward with a small horizontal
//! wobble, holds for `float_time`, fades out over `fade_time`, then frees
//! itself.
//!
//! ```text
//! alpha
//!   1 ┤━━━━━━━━━━━━━┓
//!     │             ┃╲
//!     │             ┃  ╲
//!   0 ┤─────────────┸────╲──────▶ t
//!                float   float + fade
//! ```

use std::sync::Arc;

use octodraw_core::{
    Color, DrawerError, DrawerResult, Rect2, SlotHandle, SlotPool, TextureRef, Vec2, Visit,
};
use parking_lot::Mutex;
use serde::Deserialize;

/// Default font size before `size_ratio` is applied.
const BASE_FONT_SIZE: f32 = 16.0;

/// Outline width before `size_ratio` is applied.
const BASE_OUTLINE_SIZE: f32 = 4.0;

/// Below this alpha a floating string is freed.
const EXPIRED_ALPHA: f32 = 1e-5;

/// Wobble angular speed, in radians per second.
#[allow(clippy::approx_constant)]
const WOBBLE_SPEED: f64 = 3.14;

/// String and texture drawing service.
pub trait TextBackend: Send {
    /// Draws `text` with its baseline-left at `position`.
    fn draw_string(&mut self, position: Vec2, text: &str, font_size: f32, color: Color);

    /// Draws the outline of `text`.
    fn draw_string_outline(
        &mut self,
        position: Vec2,
        text: &str,
        font_size: f32,
        outline_size: f32,
        color: Color,
    );

    /// Draws a texture stretched over `rect`.
    fn draw_texture_rect(&mut self, texture: TextureRef, rect: Rect2, modulate: Color);
}

/// Floating text tunables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FloatingTextConfig {
    /// Horizontal wobble amplitude.
    pub oscillation: f64,
    /// Upward drift per second.
    pub up_speed: f64,
    /// Seconds at full opacity.
    pub float_time: f64,
    /// Seconds to fade out.
    pub fade_time: f64,
    /// Icon offset: `x` per character of text, `y` absolute.
    pub icon_offset: Vec2,
    /// Icon side length.
    pub icon_size: f32,
    /// Scales font, outline and icon sizes.
    pub size_ratio: f32,
}

impl Default for FloatingTextConfig {
    fn default() -> Self {
        Self {
            oscillation: 0.25,
            up_speed: 2.25,
            float_time: 0.5,
            fade_time: 0.25,
            icon_offset: Vec2::new(10.0, -20.0),
            icon_size: 28.0,
            size_ratio: 1.0,
        }
    }
}

impl FloatingTextConfig {
    /// Parses the tunables from TOML. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// [`DrawerError::InvalidConfig`] on malformed TOML or a non-positive
    /// fade time.
    pub fn from_toml_str(source: &str) -> DrawerResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| DrawerError::InvalidConfig(e.to_string()))?;
        if config.fade_time <= 0.0 {
            return Err(DrawerError::InvalidConfig(format!(
                "fade_time must be positive, got {}",
                config.fade_time
            )));
        }
        Ok(config)
    }

    /// Offset and alpha of a floating string `age` seconds after spawn.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn drift(&self, age: f64) -> (Vec2, f32) {
        let offset = Vec2::new(
            ((age * WOBBLE_SPEED).cos() * self.oscillation) as f32,
            (-age * self.up_speed) as f32,
        );
        let alpha = 1.0 - ((age - self.float_time) / self.fade_time).max(0.0);
        (offset, alpha as f32)
    }
}

/// Maps world positions to screen positions through a 2D camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenProjection {
    /// Camera center in world space.
    pub camera_position: Vec2,
    /// Camera zoom (uniform).
    pub zoom: f32,
    /// Size of the viewport the camera renders to.
    pub viewport_size: Vec2,
    /// Size of the window the viewport is stretched over.
    pub window_size: Vec2,
}

impl ScreenProjection {
    /// Screen position of `world`.
    #[must_use]
    pub fn project(&self, world: Vec2) -> Vec2 {
        let top_left = self.camera_position - self.viewport_size * (0.5 / self.zoom);
        let in_viewport = (world - top_left) * self.zoom;
        Vec2::new(
            in_viewport.x * self.window_size.x / self.viewport_size.x,
            in_viewport.y * self.window_size.y / self.viewport_size.y,
        )
    }
}

/// Handle to a string drawn by a [`TextDrawer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextHandle(SlotHandle);

struct StringInstance {
    text: Arc<str>,
    position: Vec2,
    spawn_time: f64,
    icon: Option<TextureRef>,
    color: Color,
    floating: bool,
    outline: bool,
}

struct TextState<B> {
    backend: B,
    config: FloatingTextConfig,
    projection: Option<ScreenProjection>,
    instances: SlotPool<StringInstance>,
    elapsed_time: f64,
}

/// Draws transient strings.
///
/// Like the entity drawer, all state sits behind one mutex so strings can
/// be added from the simulation thread while the render thread advances.
pub struct TextDrawer<B: TextBackend> {
    state: Mutex<TextState<B>>,
}

impl<B: TextBackend> TextDrawer<B> {
    /// Creates a drawer rendering through `backend`.
    #[must_use]
    pub fn new(backend: B, config: FloatingTextConfig) -> Self {
        Self {
            state: Mutex::new(TextState {
                backend,
                config,
                projection: None,
                instances: SlotPool::new(),
                elapsed_time: 0.0,
            }),
        }
    }

    /// Adds a string. Non-floating strings stay until freed.
    pub fn add_string_instance(
        &self,
        text: impl Into<Arc<str>>,
        outline: bool,
        floating: bool,
        position: Vec2,
        color: Color,
        icon: Option<TextureRef>,
    ) -> TextHandle {
        let mut state = self.state.lock();
        let spawn_time = state.elapsed_time;
        TextHandle(state.instances.new_instance(StringInstance {
            text: text.into(),
            position,
            spawn_time,
            icon,
            color,
            floating,
            outline,
        }))
    }

    /// Removes a string. Returns `false` if it was already gone.
    pub fn free_string_instance(&self, handle: TextHandle) -> bool {
        self.state.lock().instances.free_instance(handle.0)
    }

    /// Whether a string is still drawn.
    #[must_use]
    pub fn is_alive(&self, handle: TextHandle) -> bool {
        self.state.lock().instances.is_valid(handle.0)
    }

    /// Number of strings being drawn.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().instances.len()
    }

    /// Whether no string is drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().instances.is_empty()
    }

    /// Projects positions through a camera before drawing. `None` draws in
    /// world space.
    pub fn set_projection(&self, projection: Option<ScreenProjection>) {
        self.state.lock().projection = projection;
    }

    /// Replaces the tunables.
    pub fn set_config(&self, config: FloatingTextConfig) {
        self.state.lock().config = config;
    }

    /// Runs `f` on the backend.
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        f(&mut self.state.lock().backend)
    }

    /// Advances time by `delta` seconds and draws every string.
    ///
    /// # Returns
    ///
    /// The number of floating strings that expired and were freed.
    pub fn advance(&self, delta: f64) -> usize {
        let mut state = self.state.lock();
        state.elapsed_time += delta;

        let TextState {
            backend,
            config,
            projection,
            instances,
            elapsed_time,
        } = &mut *state;

        let font_size = BASE_FONT_SIZE * config.size_ratio;
        let outline_size = BASE_OUTLINE_SIZE * config.size_ratio;
        let icon_size = config.icon_size * config.size_ratio;
        let mut expired = 0;

        instances.for_each(|_, instance| {
            let (mut position, color) = if instance.floating {
                let (offset, alpha) = config.drift(*elapsed_time - instance.spawn_time);
                if alpha < EXPIRED_ALPHA {
                    expired += 1;
                    return Visit::Free;
                }
                (instance.position + offset, instance.color.with_alpha(alpha))
            } else {
                (instance.position, instance.color)
            };
            if let Some(projection) = projection {
                position = projection.project(position);
            }

            if instance.outline {
                backend.draw_string_outline(
                    position,
                    &instance.text,
                    font_size,
                    outline_size,
                    Color::new(0.0, 0.0, 0.0, color.a),
                );
            }
            backend.draw_string(position, &instance.text, font_size, color);
            if let Some(icon) = instance.icon {
                #[allow(clippy::cast_precision_loss)]
                let chars = instance.text.chars().count() as f32;
                let corner = position + Vec2::new(chars * config.icon_offset.x, config.icon_offset.y);
                backend.draw_texture_rect(
                    icon,
                    Rect2::new(corner, Vec2::new(icon_size, icon_size)),
                    Color::WHITE.with_alpha(color.a),
                );
            }
            Visit::Keep
        });

        if expired > 0 {
            tracing::trace!(expired, "floating strings expired");
        }
        expired
    }
}
