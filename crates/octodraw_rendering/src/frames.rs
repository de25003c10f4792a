//! # Sprite Frames
//!
//! An in-memory [`FrameSource`] and a registry of named frame sets.
//!
//! Both load from TOML:
//!
//! ```toml
//! [sheets.hero]
//! offset = { x = 0.0, y = -8.0 }
//! has_up_down = true
//!
//! [sheets.hero.animations.walk]
//! speed = 8.0
//! frames = [{ texture = 10 }, { texture = 11, duration = 2.0 }, {}]
//! ```
//!
//! A frame without a texture is an empty frame: it takes time but draws
//! nothing.

use std::collections::HashMap;
use std::sync::Arc;

use octodraw_core::{DrawerError, DrawerResult, FrameSource, TextureRef, Vec2};
use serde::Deserialize;

const fn default_speed() -> f64 {
    5.0
}

const fn default_duration() -> f64 {
    1.0
}

const fn default_true() -> bool {
    true
}

/// One frame of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FrameEntry {
    /// Texture id, `None` for an empty frame.
    #[serde(default)]
    pub texture: Option<u64>,
    /// Duration relative to the clip speed.
    #[serde(default = "default_duration")]
    pub duration: f64,
}

/// A named sequence of frames.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnimationClip {
    /// Frames per second.
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Frames in playback order.
    #[serde(default)]
    pub frames: Vec<FrameEntry>,
}

impl Default for AnimationClip {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            frames: Vec::new(),
        }
    }
}

/// Frame data of every animation of one sprite.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SpriteFrames {
    /// Clips by animation name.
    #[serde(default)]
    pub animations: HashMap<String, AnimationClip>,
}

impl SpriteFrames {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a set from TOML.
    ///
    /// # Errors
    ///
    /// [`DrawerError::InvalidConfig`] if the document does not parse.
    pub fn from_toml_str(source: &str) -> DrawerResult<Self> {
        toml::from_str(source).map_err(|err| DrawerError::InvalidConfig(err.to_string()))
    }

    /// Adds an empty clip, replacing any clip with the same name.
    pub fn add_animation(&mut self, name: impl Into<String>, speed: f64) -> &mut AnimationClip {
        let clip = self.animations.entry(name.into()).or_default();
        *clip = AnimationClip {
            speed,
            frames: Vec::new(),
        };
        clip
    }

    /// Appends a frame to a clip, creating the clip at the default speed.
    pub fn add_frame(&mut self, name: &str, texture: Option<TextureRef>, duration: f64) {
        self.animations
            .entry(name.to_owned())
            .or_default()
            .frames
            .push(FrameEntry {
                texture: texture.map(|texture| texture.0),
                duration,
            });
    }

    /// Whether a clip named `name` exists.
    #[must_use]
    pub fn has_animation(&self, name: &str) -> bool {
        self.animations.contains_key(name)
    }

    fn frame(&self, animation: &str, frame: usize) -> Option<&FrameEntry> {
        self.animations.get(animation)?.frames.get(frame)
    }
}

impl FrameSource for SpriteFrames {
    fn frame_count(&self, animation: &str) -> usize {
        self.animations
            .get(animation)
            .map_or(0, |clip| clip.frames.len())
    }

    fn frame_duration(&self, animation: &str, frame: usize) -> f64 {
        self.frame(animation, frame)
            .map_or_else(default_duration, |entry| entry.duration)
    }

    fn playback_speed(&self, animation: &str) -> f64 {
        self.animations
            .get(animation)
            .map_or(0.0, |clip| clip.speed)
    }

    fn frame_texture(&self, animation: &str, frame: usize) -> Option<TextureRef> {
        self.frame(animation, frame)?.texture.map(TextureRef)
    }
}

/// A registered frame set with its spawn parameters.
#[derive(Debug, Clone)]
pub struct FrameInfo {
    /// Shared frame data.
    pub frames: Arc<SpriteFrames>,
    /// Offset applied to every frame.
    pub offset: Vec2,
    /// Whether the sprite has vertical facings.
    pub has_up_down: bool,
}

impl FrameInfo {
    /// The frame data as a drawer frame source.
    #[must_use]
    pub fn source(&self) -> Arc<dyn FrameSource> {
        Arc::clone(&self.frames) as Arc<dyn FrameSource>
    }
}

#[derive(Deserialize)]
struct SheetFile {
    #[serde(default)]
    offset: Vec2,
    #[serde(default = "default_true")]
    has_up_down: bool,
    #[serde(flatten)]
    frames: SpriteFrames,
}

#[derive(Deserialize)]
struct LibraryFile {
    #[serde(default)]
    sheets: HashMap<String, SheetFile>,
}

/// Frame sets by name.
#[derive(Debug, Clone, Default)]
pub struct FramesLibrary {
    frames: HashMap<String, FrameInfo>,
}

impl FramesLibrary {
    /// Creates an empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a library from TOML (see the module docs for the layout).
    ///
    /// # Errors
    ///
    /// [`DrawerError::InvalidConfig`] if the document does not parse.
    pub fn from_toml_str(source: &str) -> DrawerResult<Self> {
        let file: LibraryFile =
            toml::from_str(source).map_err(|err| DrawerError::InvalidConfig(err.to_string()))?;

        let mut library = Self::new();
        for (name, sheet) in file.sheets {
            library.add_frames(name, Arc::new(sheet.frames), sheet.offset, sheet.has_up_down);
        }
        tracing::debug!(sheets = library.len(), "frames library loaded");
        Ok(library)
    }

    /// Registers a frame set, replacing any set with the same name.
    pub fn add_frames(
        &mut self,
        name: impl Into<String>,
        frames: Arc<SpriteFrames>,
        offset: Vec2,
        has_up_down: bool,
    ) {
        self.frames.insert(
            name.into(),
            FrameInfo {
                frames,
                offset,
                has_up_down,
            },
        );
    }

    /// Looks up a frame set.
    ///
    /// # Errors
    ///
    /// [`DrawerError::UnknownFrames`] if nothing is registered as `name`.
    pub fn frame_info(&self, name: &str) -> DrawerResult<&FrameInfo> {
        self.try_frame_info(name).ok_or_else(|| {
            tracing::warn!(frames = name, "unknown frames");
            DrawerError::UnknownFrames(name.to_owned())
        })
    }

    /// Looks up a frame set, `None` if unknown.
    #[must_use]
    pub fn try_frame_info(&self, name: &str) -> Option<&FrameInfo> {
        self.frames.get(name)
    }

    /// Number of registered sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no set is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprite_frames_source() {
        let mut frames = SpriteFrames::new();
        frames.add_animation("walk", 10.0);
        frames.add_frame("walk", Some(TextureRef(3)), 1.0);
        frames.add_frame("walk", None, 2.0);

        assert_eq!(frames.frame_count("walk"), 2);
        assert_eq!(frames.frame_count("run"), 0);
        assert!((frames.playback_speed("walk") - 10.0).abs() < f64::EPSILON);
        assert!((frames.frame_duration("walk", 1) - 2.0).abs() < f64::EPSILON);
        assert_eq!(frames.frame_texture("walk", 0), Some(TextureRef(3)));
        assert_eq!(frames.frame_texture("walk", 1), None);
        assert_eq!(frames.frame_texture("walk", 9), None);
    }

    #[test]
    fn test_add_animation_replaces() {
        let mut frames = SpriteFrames::new();
        frames.add_frame("walk", Some(TextureRef(1)), 1.0);
        frames.add_animation("walk", 2.0);
        assert_eq!(frames.frame_count("walk"), 0);
        assert!(frames.has_animation("walk"));
    }

    #[test]
    fn test_frames_from_toml() {
        let frames = SpriteFrames::from_toml_str(
            r#"
            [animations.idle]
            frames = [{ texture = 7 }, {}]
            "#,
        )
        .unwrap();
        assert_eq!(frames.frame_count("idle"), 2);
        assert!((frames.playback_speed("idle") - 5.0).abs() < f64::EPSILON);
        assert_eq!(frames.frame_texture("idle", 1), None);
    }

    #[test]
    fn test_library_lookup() {
        let mut library = FramesLibrary::new();
        library.add_frames("hero", Arc::new(SpriteFrames::new()), Vec2::new(0.0, -8.0), false);

        let info = library.frame_info("hero").unwrap();
        assert_eq!(info.offset, Vec2::new(0.0, -8.0));
        assert!(!info.has_up_down);
        assert!(library.try_frame_info("villain").is_none());
        assert_eq!(
            library.frame_info("villain").unwrap_err(),
            DrawerError::UnknownFrames("villain".into())
        );
    }
}
