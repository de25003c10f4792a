//! # Drawer Configuration
//!
//! Loaded once at startup, usually from a TOML table:
//!
//! ```toml
//! time_step = 0.05
//! scale = 2.0
//! direction_commit_threshold = 1
//! ```

use serde::Deserialize;

use crate::error::{DrawerError, DrawerResult};
use crate::scene::MAX_RUN_LENGTH;

/// Tunables of an [`EntityDrawer`](crate::EntityDrawer).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DrawerConfig {
    /// Expected duration of a simulation tick, in seconds.
    pub time_step: f64,
    /// Global display scale applied to interpolated positions.
    pub scale: f32,
    /// A facing candidate must repeat for more than this many ticks before
    /// it is committed.
    pub direction_commit_threshold: u8,
    /// Consecutive motionless ticks (exclusive) before a handler is idle.
    pub idle_commit_threshold: u8,
    /// Slots reserved up front in every pool.
    pub initial_capacity: usize,
}

impl Default for DrawerConfig {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            scale: 1.0,
            direction_commit_threshold: 1,
            idle_commit_threshold: 1,
            initial_capacity: 1024,
        }
    }
}

impl DrawerConfig {
    /// Parses a configuration from TOML. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// [`DrawerError::InvalidConfig`] on malformed TOML, a non-positive
    /// time step, or a commit threshold the classifier can never reach.
    pub fn from_toml_str(source: &str) -> DrawerResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| DrawerError::InvalidConfig(e.to_string()))?;
        if config.time_step <= 0.0 {
            return Err(DrawerError::InvalidConfig(format!(
                "time_step must be positive, got {}",
                config.time_step
            )));
        }
        for (key, threshold) in [
            ("direction_commit_threshold", config.direction_commit_threshold),
            ("idle_commit_threshold", config.idle_commit_threshold),
        ] {
            if threshold >= MAX_RUN_LENGTH {
                return Err(DrawerError::InvalidConfig(format!(
                    "{key} must be below {MAX_RUN_LENGTH}, got {threshold}"
                )));
            }
        }
        Ok(config)
    }
}
