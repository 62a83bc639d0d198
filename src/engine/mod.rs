//! Playback Engine Module
//!
//! - Fixed-rate playback scheduler
//! - Soundtrack output seam

pub mod audio;
pub mod playback;

pub use audio::{AudioError, AudioSink, NullAudio, SharedAudio};
pub use playback::{PlaybackScheduler, PlaybackState};
