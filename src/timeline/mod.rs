//! Timeline Module
//!
//! Pure document transformations: frame and layer editing, dynamic effect
//! toggling and settings. Callers commit the returned state through the
//! store (or navigate, for selection).

pub mod effects;
pub mod frames;
pub mod layers;
pub mod settings;

pub use effects::apply_dynamic_effect;
pub use frames::{
    add_frame, advance_frame, delete_frame, duplicate_frame, reorder_frames, select_frame,
};
pub use layers::{
    add_layer, clear_layer, delete_layer, select_layer, set_layer_locked, set_layer_opacity,
    set_layer_visibility, update_layer_data,
};
pub use settings::{set_audio_track, set_dimensions, set_fps};
