//! # Drawer Error Types
//!
//! All errors that can surface from the entity lifecycle core.

use thiserror::Error;

/// Errors that can occur while manipulating pools and entities.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrawerError {
    /// A handle was presented whose slot is out of range, free, or recycled.
    #[error("invalid handle: index {index}, generation {generation}")]
    InvalidHandle {
        /// Slot index carried by the handle.
        index: u32,
        /// Generation carried by the handle.
        generation: u32,
    },

    /// Sub-instance creation was requested against a dead parent.
    #[error("invalid parent: index {index}, generation {generation}")]
    InvalidParent {
        /// Slot index carried by the parent handle.
        index: u32,
        /// Generation carried by the parent handle.
        generation: u32,
    },

    /// The payload extension point was rebound while entities are alive.
    #[error("cannot rebind entity payload while {live} entities are alive")]
    PayloadRebind {
        /// Number of live entities at the time of the call.
        live: usize,
    },

    /// No frame set is registered under the requested name.
    #[error("unknown frames: {0}")]
    UnknownFrames(String),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for drawer operations.
pub type DrawerResult<T> = Result<T, DrawerError>;
