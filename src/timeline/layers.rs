//! Layer operations.
//!
//! Layer selection is view-only; every other operation here is an edit and
//! is committed through history by the caller.

use std::sync::Arc;

use crate::state::project::{Layer, ProjectState};

/// View-only: make `index` the current layer of the current frame.
pub fn select_layer(state: &ProjectState, index: usize) -> Option<ProjectState> {
    if index >= state.current_frame().layers.len() {
        return None;
    }
    let mut next = state.clone();
    next.current_layer_index = index;
    Some(next)
}

/// Put a blank layer on top of the current frame and select it.
pub fn add_layer(state: &ProjectState) -> Option<ProjectState> {
    let mut next = state.clone();
    let index = next.current_frame_index;
    let frame = next.frame_mut(index)?;
    let name = format!("Layer {}", frame.layers.len() + 1);
    frame.layers.push(Layer::blank(name));
    next.current_layer_index = frame_layer_count(&next) - 1;
    Some(next)
}

/// Remove a layer of the current frame. A frame always keeps one layer.
pub fn delete_layer(state: &ProjectState, index: usize) -> Option<ProjectState> {
    let layers = state.current_frame().layers.len();
    if layers <= 1 || index >= layers {
        return None;
    }
    let mut next = state.clone();
    let frame_index = next.current_frame_index;
    next.frame_mut(frame_index)?.layers.remove(index);
    next.clamp_layer_index();
    Some(next)
}

pub fn set_layer_visibility(
    state: &ProjectState,
    frame: usize,
    layer: usize,
    visible: bool,
) -> Option<ProjectState> {
    edit_layer(state, frame, layer, |l| l.visible = visible)
}

pub fn set_layer_locked(
    state: &ProjectState,
    frame: usize,
    layer: usize,
    locked: bool,
) -> Option<ProjectState> {
    edit_layer(state, frame, layer, |l| l.locked = locked)
}

/// Opacity is clamped into 0..=1; NaN is ignored.
pub fn set_layer_opacity(
    state: &ProjectState,
    frame: usize,
    layer: usize,
    opacity: f32,
) -> Option<ProjectState> {
    if opacity.is_nan() {
        return None;
    }
    edit_layer(state, frame, layer, |l| l.opacity = opacity.clamp(0.0, 1.0))
}

/// Store a payload reported by the drawing surface for (frame, layer).
///
/// The payload is opaque. An empty payload clears the layer. The frame's
/// thumbnail follows the latest update. Locked layers are left untouched.
pub fn update_layer_data(
    state: &ProjectState,
    frame: usize,
    layer: usize,
    payload: &str,
) -> Option<ProjectState> {
    if state.frame(frame)?.layers.get(layer)?.locked {
        return None;
    }
    let data: Option<Arc<str>> = (!payload.is_empty()).then(|| Arc::from(payload));

    let mut next = state.clone();
    let target = next.frame_mut(frame)?;
    target.layers[layer].data = data.clone();
    target.thumbnail = data;
    Some(next)
}

/// Erase the pixels of (frame, layer).
pub fn clear_layer(state: &ProjectState, frame: usize, layer: usize) -> Option<ProjectState> {
    update_layer_data(state, frame, layer, "")
}

fn frame_layer_count(state: &ProjectState) -> usize {
    state.current_frame().layers.len()
}

fn edit_layer(
    state: &ProjectState,
    frame: usize,
    layer: usize,
    edit: impl FnOnce(&mut Layer),
) -> Option<ProjectState> {
    state.frame(frame)?.layers.get(layer)?;
    let mut next = state.clone();
    edit(&mut next.frame_mut(frame)?.layers[layer]);
    Some(next)
}
