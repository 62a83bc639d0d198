//! Project settings edits: playback rate, canvas size, audio track.

use crate::state::project::ProjectState;

pub fn set_fps(state: &ProjectState, fps: u32) -> Option<ProjectState> {
    if fps == 0 || fps == state.fps {
        return None;
    }
    Some(ProjectState {
        fps,
        ..state.clone()
    })
}

pub fn set_dimensions(state: &ProjectState, width: u32, height: u32) -> Option<ProjectState> {
    if width == 0 || height == 0 {
        return None;
    }
    Some(ProjectState {
        width,
        height,
        ..state.clone()
    })
}

/// Attach (or with `None`, detach) the soundtrack reference.
pub fn set_audio_track(state: &ProjectState, track: Option<String>) -> Option<ProjectState> {
    Some(ProjectState {
        audio_track: track.filter(|t| !t.is_empty()),
        ..state.clone()
    })
}
