//! Dynamic effect toggling.

use crate::state::project::{EffectKind, ProjectState};

/// Toggle `kind` on the current frame, or on every frame when
/// `apply_to_all` is set. A frame that already carries the effect loses
/// it; a frame without it gains `{kind, intensity}`.
pub fn apply_dynamic_effect(
    state: &ProjectState,
    kind: EffectKind,
    intensity: f32,
    apply_to_all: bool,
) -> ProjectState {
    let mut next = state.clone();
    let targets: Vec<usize> = if apply_to_all {
        (0..next.frame_count()).collect()
    } else {
        vec![next.current_frame_index]
    };
    for index in targets {
        if let Some(frame) = next.frame_mut(index) {
            frame.toggle_effect(kind, intensity);
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::frames::add_frame;

    #[test]
    fn test_toggle_twice_restores_effects() {
        let state = ProjectState::default();
        let on = apply_dynamic_effect(&state, EffectKind::Glow, 0.6, false);
        assert_eq!(on.current_frame().effects.len(), 1);

        let off = apply_dynamic_effect(&on, EffectKind::Glow, 0.6, false);
        assert_eq!(off.current_frame().effects, state.current_frame().effects);
    }

    #[test]
    fn test_current_frame_only() {
        let state = add_frame(&ProjectState::default()).unwrap();
        let next = apply_dynamic_effect(&state, EffectKind::Particles, 1.0, false);
        assert!(next.frames[1].has_effect(EffectKind::Particles));
        assert!(!next.frames[0].has_effect(EffectKind::Particles));
        // untouched frames stay shared with the previous snapshot
        assert!(std::sync::Arc::ptr_eq(&state.frames[0], &next.frames[0]));
    }

    #[test]
    fn test_apply_to_all_toggles_each_frame_independently() {
        let state = add_frame(&ProjectState::default()).unwrap();
        let one = apply_dynamic_effect(&state, EffectKind::MotionBlur, 0.3, false);
        let all = apply_dynamic_effect(&one, EffectKind::MotionBlur, 0.3, true);

        assert!(all.frames[0].has_effect(EffectKind::MotionBlur));
        assert!(!all.frames[1].has_effect(EffectKind::MotionBlur));
        assert!(all.validate().is_ok());
    }
}
