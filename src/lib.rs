//! Animate - Frame-by-Frame Animation Editor Core
//!
//! The project state and timeline engine behind a frame-by-frame animation
//! editor: the animation document, its bounded undo history, frame and
//! layer editing, fixed-rate playback with soundtrack sync, and sequential
//! export to an animation file.
//!
//! # Architecture
//!
//! - `state`: the immutable document, history and the store that owns both
//! - `timeline`: pure operations producing the next document
//! - `engine`: the playback scheduler and audio seam
//! - `export`: surface, layer decoding, encoders and the export pipeline
//! - `editor`: the session tying commands, playback, export and notifications together

pub mod cli;
pub mod config;
pub mod editor;
pub mod engine;
pub mod error;
pub mod export;
pub mod state;
pub mod timeline;

pub use config::EditorConfig;
pub use editor::Editor;
pub use error::{AnimateError, Result};
