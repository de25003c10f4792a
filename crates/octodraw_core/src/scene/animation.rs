//! # Animation Advancer
//!
//! Per-render-tick playback state machine.
//!
//! ## Name Resolution
//!
//! ```text
//! 1. directional override (non-empty) + priority  → override[facing]
//! 2. dynamic pair + direction handler
//!      idle and override non-empty                → override[facing]
//!      otherwise                                  → idle/moving[facing]
//! 3. otherwise                                    → current animation
//! ```
//!
//! ## End Of Clip
//!
//! ```text
//! one shot        → destroy the entity
//! next animation  → chain into it
//! dynamic pair    → drop the explicit animation
//! otherwise       → loop
//! ```

use super::component::{
    empty_name, AnimName, AnimationState, DirectionalAnimation, DynamicAnimation,
};
use super::direction::{Direction, DirectionHandler};
use crate::backend::FrameSource;

/// Optional components consulted when resolving the displayed name.
#[derive(Clone, Copy, Default)]
pub struct NameContext<'a> {
    /// Directed variants of the current animation.
    pub dir_animation: Option<&'a DirectionalAnimation>,
    /// Idle/moving pair.
    pub dyn_animation: Option<&'a DynamicAnimation>,
    /// Facing state machine.
    pub handler: Option<&'a DirectionHandler>,
}

/// Returns the animation name to display this tick.
#[must_use]
pub fn resolve_name(state: &AnimationState, context: &NameContext<'_>) -> AnimName {
    let facing = context.handler.map_or(Direction::None, |handler| handler.current);
    let directed = context.dir_animation.filter(|anim| !anim.is_empty());

    if let Some(directed) = directed {
        if state.has_priority {
            return directed.name(facing).clone();
        }
    }

    if let (Some(dynamic), Some(handler)) = (context.dyn_animation, context.handler) {
        if handler.idle {
            if let Some(directed) = directed {
                return directed.name(facing).clone();
            }
        }
        return dynamic.name(handler.idle, facing).clone();
    }

    state.current_animation.clone()
}

/// Outcome of advancing playback by one render tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Playback {
    /// The frame index is valid for the displayed animation.
    Playing,
    /// The clip ran past its last frame.
    Finished,
}

/// What happened at the end of a clip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipEnd {
    /// One-shot animation: the entity must be destroyed.
    Destroy,
    /// Switched to the chained next animation.
    Chain,
    /// Dropped the explicit animation so the dynamic pair takes over.
    ResetDynamic,
    /// Restarted the same animation.
    Loop,
}

/// Moves to the next frame once the current one has been shown long enough.
///
/// A frame lasts `frame_duration / playback_speed`; a non-positive speed
/// freezes playback. An index already out of range (the displayed name
/// changed to a shorter clip) finishes without advancing.
pub fn advance(
    state: &mut AnimationState,
    frames: &dyn FrameSource,
    name: &str,
    now: f64,
) -> Playback {
    let count = frames.frame_count(name);
    if state.frame_index >= count {
        return Playback::Finished;
    }

    let speed = frames.playback_speed(name);
    if speed > 0.0 {
        let duration = frames.frame_duration(name, state.frame_index) / speed;
        if now >= state.start + duration {
            state.frame_index += 1;
            state.start = now;
        }
    }

    if state.frame_index >= count {
        Playback::Finished
    } else {
        Playback::Playing
    }
}

/// Applies the end-of-clip transition.
///
/// Every outcome except [`ClipEnd::Destroy`] rewinds to frame 0 at `now`.
pub fn finish_clip(state: &mut AnimationState, has_dynamic: bool, now: f64) -> ClipEnd {
    if state.one_shot {
        return ClipEnd::Destroy;
    }

    let outcome = if !state.next_animation.is_empty() {
        state.current_animation = std::mem::replace(&mut state.next_animation, empty_name());
        ClipEnd::Chain
    } else if has_dynamic {
        state.current_animation = empty_name();
        state.has_priority = false;
        ClipEnd::ResetDynamic
    } else {
        ClipEnd::Loop
    };

    state.frame_index = 0;
    state.start = now;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TextureRef;
    use std::sync::Arc;

    struct FixedFrames {
        count: usize,
        duration: f64,
        speed: f64,
    }

    impl FrameSource for FixedFrames {
        fn frame_count(&self, _animation: &str) -> usize {
            self.count
        }

        fn frame_duration(&self, _animation: &str, _frame: usize) -> f64 {
            self.duration
        }

        fn playback_speed(&self, _animation: &str) -> f64 {
            self.speed
        }

        fn frame_texture(&self, _animation: &str, frame: usize) -> Option<TextureRef> {
            Some(TextureRef(frame as u64))
        }
    }

    fn state(current: &str) -> AnimationState {
        AnimationState {
            current_animation: Arc::from(current),
            ..AnimationState::default()
        }
    }

    #[test]
    fn test_advance_respects_speed() {
        let frames = FixedFrames {
            count: 4,
            duration: 1.0,
            speed: 4.0,
        };
        let mut anim = state("walk");

        assert_eq!(advance(&mut anim, &frames, "walk", 0.2), Playback::Playing);
        assert_eq!(anim.frame_index, 0);

        assert_eq!(advance(&mut anim, &frames, "walk", 0.25), Playback::Playing);
        assert_eq!(anim.frame_index, 1);
        assert!((anim.start - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_speed_freezes() {
        let frames = FixedFrames {
            count: 2,
            duration: 1.0,
            speed: 0.0,
        };
        let mut anim = state("walk");
        assert_eq!(advance(&mut anim, &frames, "walk", 100.0), Playback::Playing);
        assert_eq!(anim.frame_index, 0);
    }

    #[test]
    fn test_finish_chains_next() {
        let mut anim = state("attack");
        anim.next_animation = Arc::from("walk");
        anim.frame_index = 3;

        assert_eq!(finish_clip(&mut anim, false, 2.0), ClipEnd::Chain);
        assert_eq!(&*anim.current_animation, "walk");
        assert!(anim.next_animation.is_empty());
        assert_eq!(anim.frame_index, 0);
    }

    #[test]
    fn test_finish_one_shot_destroys() {
        let mut anim = state("explode");
        anim.one_shot = true;
        anim.frame_index = 5;
        assert_eq!(finish_clip(&mut anim, true, 1.0), ClipEnd::Destroy);
        assert_eq!(anim.frame_index, 5);
    }

    #[test]
    fn test_finish_resets_to_dynamic() {
        let mut anim = state("cast");
        anim.has_priority = true;
        assert_eq!(finish_clip(&mut anim, true, 1.0), ClipEnd::ResetDynamic);
        assert!(anim.current_animation.is_empty());
        assert!(!anim.has_priority);
    }

    fn facing_up(idle: bool) -> DirectionHandler {
        let mut handler = DirectionHandler::new(true, None);
        handler.current = Direction::Up;
        handler.idle = idle;
        handler
    }

    #[test]
    fn test_resolve_precedence() {
        let directed = DirectionalAnimation::new(Arc::from("cast"));
        let dynamic = DynamicAnimation::new(Arc::from("idle"), Arc::from("run"));
        let moving = facing_up(false);
        let idle = facing_up(true);

        let mut anim = state("cast");
        let context = NameContext {
            dir_animation: Some(&directed),
            dyn_animation: Some(&dynamic),
            handler: Some(&moving),
        };

        // Moving, no priority: dynamic moving name wins
        assert_eq!(&*resolve_name(&anim, &context), "up_run");

        // Priority: override wins
        anim.has_priority = true;
        assert_eq!(&*resolve_name(&anim, &context), "up_cast");

        // Idle without priority: override still shown
        anim.has_priority = false;
        let idle_context = NameContext {
            handler: Some(&idle),
            ..context
        };
        assert_eq!(&*resolve_name(&anim, &idle_context), "up_cast");

        // Idle with an empty override: dynamic idle name
        let empty = DirectionalAnimation::default();
        let empty_context = NameContext {
            dir_animation: Some(&empty),
            ..idle_context
        };
        assert_eq!(&*resolve_name(&anim, &empty_context), "up_idle");
    }

    #[test]
    fn test_resolve_plain() {
        let anim = state("spin");
        assert_eq!(&*resolve_name(&anim, &NameContext::default()), "spin");
    }
}
