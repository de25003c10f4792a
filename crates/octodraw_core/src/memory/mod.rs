//! # Memory Management
//!
//! Generational pools for component records.
//!
//! ## Design Philosophy
//!
//! Storage grows to the peak entity count and is then recycled:
//! - Freed slots go back to a free list, never to the allocator
//! - Every free bumps a generation counter
//! - Stale handles fail loudly instead of aliasing new occupants

mod pool;

pub use pool::{SlotHandle, SlotPool, Visit};
