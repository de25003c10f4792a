//! # Render/Simulation Synchronization
//!
//! ## The Problem
//!
//! ```text
//! Simulation:  fixed rate, writes target positions
//! Render:      variable rate, reads positions every frame
//!
//! Drawing the latest target directly: visible SNAPPING
//! ```
//!
//! ## The Solution: Double Buffering
//!
//! ```text
//! Tick N:
//!   old = where entities were, new = where they are going
//!   Render blends old → new by elapsed / time_step
//!
//! Tick N+1:
//!   SWAP, caller writes the next targets
//! ```

mod position_buffer;

pub use position_buffer::PositionBuffers;
