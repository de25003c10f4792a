//! # OCTODRAW Rendering Helpers
//!
//! Pieces that sit between the lifecycle core and a real renderer:
//!
//! ```text
//! ┌──────────────┐   Arc<dyn FrameSource>   ┌───────────────────┐
//! │ FramesLibrary│ ───────────────────────▶ │   EntityDrawer    │
//! └──────────────┘                          └─────────┬─────────┘
//!                                                     │ pick surfaces
//!                        RGBA8 read-back  ┌───────────▼─────────┐
//!            Picker  ◀─────────────────── │  off-screen buffer  │
//!                                         └─────────────────────┘
//!  TextDrawer ──draw_string / draw_texture_rect──▶ TextBackend
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod frames;
pub mod picking;
pub mod text;

pub use frames::{AnimationClip, FrameEntry, FrameInfo, FramesLibrary, SpriteFrames};
pub use picking::{PickBuffer, Picker, RgbaImage};
pub use text::{FloatingTextConfig, ScreenProjection, TextBackend, TextDrawer, TextHandle};
