//! Frame operations.
//!
//! Each operation takes the live document and returns the next one, or
//! `None` when the request is an invalid operation that must be ignored
//! (deleting the last frame, out-of-range indices, exceeding `MAX_FRAMES`).

use std::sync::Arc;

use crate::state::project::{Frame, ProjectState, MAX_FRAMES};

/// Insert a blank frame right after the current one and select it.
pub fn add_frame(state: &ProjectState) -> Option<ProjectState> {
    if state.frame_count() >= MAX_FRAMES {
        return None;
    }
    let mut next = state.clone();
    let at = state.current_frame_index + 1;
    next.frames.insert(at, Arc::new(Frame::blank()));
    next.current_frame_index = at;
    next.current_layer_index = 0;
    Some(next)
}

/// Remove the frame at `index`. At least one frame always remains.
pub fn delete_frame(state: &ProjectState, index: usize) -> Option<ProjectState> {
    if state.frame_count() <= 1 || index >= state.frame_count() {
        return None;
    }
    let mut next = state.clone();
    next.frames.remove(index);
    next.current_frame_index = state.current_frame_index.min(next.frame_count() - 1);
    next.clamp_layer_index();
    Some(next)
}

/// Copy the frame at `index` (new identifiers, same pixels) and insert the
/// copy right after it. The copy becomes current.
pub fn duplicate_frame(state: &ProjectState, index: usize) -> Option<ProjectState> {
    let source = state.frame(index)?;
    if state.frame_count() >= MAX_FRAMES {
        return None;
    }
    let copy = source.duplicate();
    let mut next = state.clone();
    next.frames.insert(index + 1, Arc::new(copy));
    next.current_frame_index = index + 1;
    next.clamp_layer_index();
    Some(next)
}

/// Move the frame at `from` to position `to` and select it there.
pub fn reorder_frames(state: &ProjectState, from: usize, to: usize) -> Option<ProjectState> {
    let count = state.frame_count();
    if from >= count || to >= count {
        return None;
    }
    let mut next = state.clone();
    let moved = next.frames.remove(from);
    next.frames.insert(to, moved);
    next.current_frame_index = to;
    next.clamp_layer_index();
    Some(next)
}

/// View-only: make `index` the current frame.
pub fn select_frame(state: &ProjectState, index: usize) -> Option<ProjectState> {
    if index >= state.frame_count() {
        return None;
    }
    let mut next = state.clone();
    next.current_frame_index = index;
    next.clamp_layer_index();
    Some(next)
}

/// One playback step: the next frame, wrapping to the first after the last.
pub fn advance_frame(state: &ProjectState) -> ProjectState {
    let mut next = state.clone();
    next.current_frame_index = (state.current_frame_index + 1) % state.frame_count().max(1);
    next.clamp_layer_index();
    next
}
