//! # Direction Classifier
//!
//! Turns a raw movement or intent vector into one of five facing states.
//! A candidate must repeat for a few ticks before it is committed, which
//! keeps sprites from flickering between facings on diagonal movement.

use crate::math::Vec2;
use crate::memory::SlotHandle;

/// Below this squared length the explicit direction is ignored and the
/// movement over the last tick is used instead.
const EXPLICIT_DIRECTION_MIN_SQUARED: f32 = 0.1;

/// Per-axis dead zone under which a vector counts as no movement.
const DEAD_ZONE: f32 = 0.01;

/// Run-length counters saturate here, so thresholds must stay below it.
pub(crate) const MAX_RUN_LENGTH: u8 = 100;

/// Discrete facing of an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// No movement.
    #[default]
    None = -1,
    /// Facing negative y.
    Up = 0,
    /// Facing positive y.
    Down = 1,
    /// Facing negative x.
    Left = 2,
    /// Facing positive x.
    Right = 3,
}

impl Direction {
    /// Index into per-direction tables, `None` for [`Direction::None`].
    #[inline]
    #[must_use]
    pub const fn slot(self) -> Option<usize> {
        match self {
            Self::None => None,
            Self::Up => Some(0),
            Self::Down => Some(1),
            Self::Left => Some(2),
            Self::Right => Some(3),
        }
    }

    /// Classifies a vector by its dominant axis.
    ///
    /// Without `has_up_down` only the horizontal sign is considered.
    #[must_use]
    pub fn classify(vector: Vec2, has_up_down: bool) -> Self {
        if vector.x.abs() <= DEAD_ZONE && vector.y.abs() <= DEAD_ZONE {
            return Self::None;
        }
        if !has_up_down || vector.x.abs() > vector.y.abs() {
            if vector.x > 0.0 {
                Self::Right
            } else {
                Self::Left
            }
        } else if vector.y > 0.0 {
            Self::Down
        } else {
            Self::Up
        }
    }
}

/// Facing state machine of a main instance, shared by opted-in attachments.
#[derive(Clone, Debug)]
pub struct DirectionHandler {
    /// Whether vertical facings are available.
    pub has_up_down: bool,
    /// Position slot used to infer movement.
    pub pos_idx: Option<SlotHandle>,
    /// Explicit intent set by the caller.
    pub direction: Vec2,
    /// Committed facing.
    pub current: Direction,
    /// Candidate facing being counted.
    pub pending: Direction,
    /// Consecutive ticks the candidate has been seen.
    pub pending_count: u8,
    /// Consecutive ticks without movement.
    pub idle_count: u8,
    /// Set once the entity has stood still long enough.
    pub idle: bool,
}

impl Default for DirectionHandler {
    fn default() -> Self {
        Self::new(true, None)
    }
}

impl DirectionHandler {
    /// Creates a handler facing nowhere.
    #[must_use]
    pub fn new(has_up_down: bool, pos_idx: Option<SlotHandle>) -> Self {
        Self {
            has_up_down,
            pos_idx,
            direction: Vec2::ZERO,
            current: Direction::None,
            pending: Direction::None,
            pending_count: 0,
            idle_count: 0,
            idle: false,
        }
    }

    /// Chooses the vector to classify: explicit intent, else `movement`.
    #[inline]
    #[must_use]
    pub fn input(&self, movement: Vec2) -> Vec2 {
        if self.direction.length_squared() < EXPLICIT_DIRECTION_MIN_SQUARED {
            movement
        } else {
            self.direction
        }
    }

    /// Runs one simulation tick.
    ///
    /// `movement` is `new - old` of the shared position slot. A candidate is
    /// committed once it has been seen for more than `commit_threshold`
    /// consecutive ticks; the handler turns idle after more than
    /// `idle_threshold` motionless ticks. Thresholds are capped one below
    /// the run-length ceiling.
    pub fn tick(&mut self, movement: Vec2, commit_threshold: u8, idle_threshold: u8) {
        let commit_threshold = commit_threshold.min(MAX_RUN_LENGTH - 1);
        let idle_threshold = idle_threshold.min(MAX_RUN_LENGTH - 1);
        let candidate = Direction::classify(self.input(movement), self.has_up_down);

        if candidate == Direction::None {
            self.pending = Direction::None;
            self.pending_count = 0;
            self.idle_count = self.idle_count.saturating_add(1).min(MAX_RUN_LENGTH);
            if self.idle_count > idle_threshold {
                self.idle = true;
            }
            return;
        }

        self.idle_count = 0;
        self.idle = false;

        if candidate != self.pending {
            self.pending = candidate;
            self.pending_count = 0;
        }
        self.pending_count = self.pending_count.saturating_add(1).min(MAX_RUN_LENGTH);

        if self.pending_count > commit_threshold && self.pending != self.current {
            self.current = self.pending;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_axes() {
        assert_eq!(Direction::classify(Vec2::new(5.0, 1.0), true), Direction::Right);
        assert_eq!(Direction::classify(Vec2::new(-5.0, 1.0), true), Direction::Left);
        assert_eq!(Direction::classify(Vec2::new(1.0, 5.0), true), Direction::Down);
        assert_eq!(Direction::classify(Vec2::new(1.0, -5.0), true), Direction::Up);
        assert_eq!(Direction::classify(Vec2::new(0.005, -0.01), true), Direction::None);
    }

    #[test]
    fn test_classify_horizontal_only() {
        assert_eq!(Direction::classify(Vec2::new(0.5, -5.0), false), Direction::Right);
        assert_eq!(Direction::classify(Vec2::new(-0.5, 5.0), false), Direction::Left);
    }

    #[test]
    fn test_hysteresis_threshold() {
        let threshold = 5;
        let mut handler = DirectionHandler::new(true, None);
        handler.current = Direction::Left;

        for _ in 0..threshold {
            handler.tick(Vec2::new(5.0, 0.0), threshold, threshold);
        }
        assert_eq!(handler.current, Direction::Left);

        handler.tick(Vec2::new(5.0, 0.0), threshold, threshold);
        assert_eq!(handler.current, Direction::Right);
    }

    #[test]
    fn test_candidate_change_resets_run() {
        let mut handler = DirectionHandler::new(true, None);
        handler.tick(Vec2::new(5.0, 0.0), 1, 1);
        handler.tick(Vec2::new(0.0, 5.0), 1, 1);
        handler.tick(Vec2::new(5.0, 0.0), 1, 1);
        assert_eq!(handler.current, Direction::None);

        handler.tick(Vec2::new(5.0, 0.0), 1, 1);
        assert_eq!(handler.current, Direction::Right);
    }

    #[test]
    fn test_idle_tracking() {
        let mut handler = DirectionHandler::new(true, None);
        handler.tick(Vec2::ZERO, 1, 1);
        assert!(!handler.idle);
        handler.tick(Vec2::ZERO, 1, 1);
        assert!(handler.idle);

        handler.tick(Vec2::new(0.0, 3.0), 1, 1);
        assert!(!handler.idle);
        assert_eq!(handler.idle_count, 0);
    }

    #[test]
    fn test_explicit_direction_overrides_movement() {
        let mut handler = DirectionHandler::new(true, None);
        handler.direction = Vec2::new(0.0, -1.0);
        for _ in 0..3 {
            handler.tick(Vec2::new(10.0, 0.0), 1, 1);
        }
        assert_eq!(handler.current, Direction::Up);
    }

    #[test]
    fn test_oversized_threshold_still_commits() {
        let mut handler = DirectionHandler::new(true, None);
        for _ in 0..MAX_RUN_LENGTH {
            handler.tick(Vec2::new(1.0, 0.0), u8::MAX, u8::MAX);
        }
        assert_eq!(handler.current, Direction::Right);

        for _ in 0..MAX_RUN_LENGTH {
            handler.tick(Vec2::ZERO, u8::MAX, u8::MAX);
        }
        assert!(handler.idle);
    }

    #[test]
    fn test_run_length_saturates() {
        let mut handler = DirectionHandler::new(true, None);
        for _ in 0..500 {
            handler.tick(Vec2::new(1.0, 0.0), 1, 1);
        }
        assert_eq!(handler.pending_count, MAX_RUN_LENGTH);
    }
}
