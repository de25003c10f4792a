//! # Rendering Helper Tests
//!
//! 1. **Floating text**: drift, fade and expiry through a recording backend
//! 2. **Picking**: pick colors assigned by the drawer decode back to entities
//! 3. **Frames library**: TOML sheets drive entity playback

use std::collections::HashMap;

use octodraw_core::{
    Color, DrawerConfig, EntityDrawer, Rect2, RenderBackend, SurfaceRef, SurfaceTarget,
    TextureRef, Vec2,
};
use octodraw_rendering::{
    FloatingTextConfig, FramesLibrary, Picker, RgbaImage, ScreenProjection, TextBackend,
    TextDrawer,
};

// ============================================================================
// FLOATING TEXT
// ============================================================================

#[derive(Default)]
struct TextLog {
    strings: Vec<(String, Vec2, f32, Color)>,
    outlines: Vec<(String, f32, Color)>,
    icons: Vec<(TextureRef, Rect2, Color)>,
}

impl TextBackend for TextLog {
    fn draw_string(&mut self, position: Vec2, text: &str, font_size: f32, color: Color) {
        self.strings.push((text.to_owned(), position, font_size, color));
    }

    fn draw_string_outline(
        &mut self,
        _position: Vec2,
        text: &str,
        _font_size: f32,
        outline_size: f32,
        color: Color,
    ) {
        self.outlines.push((text.to_owned(), outline_size, color));
    }

    fn draw_texture_rect(&mut self, texture: TextureRef, rect: Rect2, modulate: Color) {
        self.icons.push((texture, rect, modulate));
    }
}

#[test]
fn test_floating_text_expires_after_fade() {
    let drawer = TextDrawer::new(TextLog::default(), FloatingTextConfig::default());
    let floating = drawer.add_string_instance("-12", false, true, Vec2::ZERO, Color::WHITE, None);
    let label = drawer.add_string_instance("Shop", false, false, Vec2::ZERO, Color::WHITE, None);

    assert_eq!(drawer.advance(0.5), 0);
    assert!(drawer.is_alive(floating));

    // float_time + fade_time = 0.75
    assert_eq!(drawer.advance(0.25), 1);
    assert!(!drawer.is_alive(floating));
    assert!(drawer.is_alive(label));
    assert_eq!(drawer.len(), 1);

    assert!(drawer.free_string_instance(label));
    assert!(!drawer.free_string_instance(label));
    assert!(drawer.is_empty());
}

#[test]
fn test_floating_text_fades_and_rises() {
    let drawer = TextDrawer::new(TextLog::default(), FloatingTextConfig::default());
    drawer.add_string_instance("+5", false, true, Vec2::new(10.0, 10.0), Color::WHITE, None);

    drawer.advance(0.625);
    drawer.with_backend(|log| {
        let (_, position, _, color) = &log.strings[0];
        assert!(position.y < 10.0);
        assert!((color.a - 0.5).abs() < 1e-5);
    });
}

#[test]
fn test_outline_and_icon_follow_size_ratio() {
    let config = FloatingTextConfig {
        size_ratio: 2.0,
        ..FloatingTextConfig::default()
    };
    let drawer = TextDrawer::new(TextLog::default(), config);
    drawer.add_string_instance(
        "gold",
        true,
        false,
        Vec2::new(0.0, 100.0),
        Color::new(1.0, 0.8, 0.0, 1.0),
        Some(TextureRef(9)),
    );
    drawer.advance(0.1);

    drawer.with_backend(|log| {
        assert_eq!(log.strings[0].2, 32.0);
        assert_eq!(log.outlines[0].1, 8.0);
        assert_eq!(log.outlines[0].2, Color::new(0.0, 0.0, 0.0, 1.0));

        let (texture, rect, _) = log.icons[0];
        assert_eq!(texture, TextureRef(9));
        assert_eq!(rect.position, Vec2::new(40.0, 80.0));
        assert_eq!(rect.size, Vec2::new(56.0, 56.0));
    });
}

#[test]
fn test_projection_applies_to_strings() {
    let drawer = TextDrawer::new(TextLog::default(), FloatingTextConfig::default());
    drawer.set_projection(Some(ScreenProjection {
        camera_position: Vec2::ZERO,
        zoom: 1.0,
        viewport_size: Vec2::new(100.0, 100.0),
        window_size: Vec2::new(100.0, 100.0),
    }));
    drawer.add_string_instance("hi", false, false, Vec2::ZERO, Color::WHITE, None);
    drawer.advance(0.1);

    drawer.with_backend(|log| assert_eq!(log.strings[0].1, Vec2::new(50.0, 50.0)));
}

// ============================================================================
// PICKING + FRAMES
// ============================================================================

/// Rasterizes pick surfaces as 2x2 squares at their transform.
#[derive(Default)]
struct PickRaster {
    next: u64,
    colors: HashMap<SurfaceRef, Color>,
    transforms: HashMap<SurfaceRef, Vec2>,
    picking: Vec<SurfaceRef>,
}

impl PickRaster {
    fn render(&self, width: u32, height: u32) -> RgbaImage {
        let mut image = RgbaImage::new(width, height);
        for surface in &self.picking {
            let (Some(color), Some(at)) = (self.colors.get(surface), self.transforms.get(surface))
            else {
                continue;
            };
            let Some(index) = color.to_index() else {
                continue;
            };
            let (x, y) = (at.x as u32, at.y as u32);
            image.fill_index(x, y, x + 2, y + 2, index);
        }
        image
    }
}

impl RenderBackend for PickRaster {
    fn create_surface(&mut self, target: SurfaceTarget) -> SurfaceRef {
        self.next += 1;
        let surface = SurfaceRef(self.next);
        if target == SurfaceTarget::Picking {
            self.picking.push(surface);
        }
        surface
    }

    fn set_pick_color(&mut self, surface: SurfaceRef, color: Color) {
        self.colors.insert(surface, color);
    }

    fn set_transform(&mut self, surface: SurfaceRef, position: Vec2) {
        self.transforms.insert(surface, position);
    }

    fn clear(&mut self, _surface: SurfaceRef) {}

    fn draw(&mut self, _surface: SurfaceRef, _texture: TextureRef, _offset: Vec2) {}

    fn destroy(&mut self, _surface: SurfaceRef) {}
}

const SHEETS: &str = r#"
[sheets.slime]
offset = { x = 0.0, y = -4.0 }
has_up_down = false

[sheets.slime.animations.bounce]
speed = 2.0
frames = [{ texture = 1 }, { texture = 2 }]
"#;

#[test]
fn test_pick_entities_drawn_from_library() {
    let library = FramesLibrary::from_toml_str(SHEETS).unwrap();
    let slime = library.frame_info("slime").unwrap();
    assert!(!slime.has_up_down);
    assert!(library.frame_info("dragon").is_err());

    let drawer = EntityDrawer::new(PickRaster::default(), DrawerConfig::default());
    let spawn = |at: Vec2| {
        drawer.add_instance(at, slime.offset, slime.source(), "bounce", "", false, false)
    };
    let _hidden = spawn(Vec2::new(0.0, 0.0));
    let left = spawn(Vec2::new(2.0, 2.0));
    let right = spawn(Vec2::new(10.0, 4.0));
    drawer.add_pickable(left);
    drawer.add_pickable(right);

    let stats = drawer.advance_render(0.25);
    assert_eq!(stats.drawn, 3);
    assert_eq!(drawer.frame_index(left), Ok(0));
    drawer.advance_render(0.25);
    assert_eq!(drawer.frame_index(left), Ok(1));

    let image = drawer.with_backend(|raster| raster.render(16, 16));
    let picker = Picker::new(1.0);
    assert_eq!(picker.index_at(&image, Vec2::new(3.0, 3.0)), Some(left.index()));
    assert_eq!(picker.index_at(&image, Vec2::new(11.5, 5.5)), Some(right.index()));
    assert_eq!(picker.index_at(&image, Vec2::new(0.5, 0.5)), None);

    let all = picker.indexes_in_rect(&image, Rect2::new(Vec2::ZERO, Vec2::new(16.0, 16.0)));
    assert_eq!(all, vec![left.index(), right.index()]);
}
