//! Audio output seam.
//!
//! The soundtrack is played by an environment primitive (an audio element,
//! an output device). The playback scheduler is its only driver.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

/// Reasons the environment refused to start audio.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// The environment blocks playback until a user gesture.
    #[error("Audio playback blocked until user interaction")]
    Blocked,

    #[error("Audio unavailable: {0}")]
    Unavailable(String),
}

/// Playback primitive for the project's soundtrack.
pub trait AudioSink: Send {
    /// Start or resume playback from the current position.
    fn play(&mut self) -> Result<(), AudioError>;

    fn pause(&mut self);

    /// Move the position back to time zero.
    fn rewind(&mut self);
}

/// Headless sink that accepts every command and produces no sound.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn pause(&mut self) {}

    fn rewind(&mut self) {}
}

/// Audio sink shared between the scheduler and its tick task.
#[derive(Clone)]
pub struct SharedAudio(Arc<Mutex<Box<dyn AudioSink>>>);

impl SharedAudio {
    pub fn new(sink: impl AudioSink + 'static) -> Self {
        Self(Arc::new(Mutex::new(Box::new(sink))))
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn AudioSink>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start playback, optionally from time zero. Refusals are tolerated:
    /// visual playback carries on without sound.
    pub fn start(&self, from_start: bool) {
        let mut sink = self.lock();
        if from_start {
            sink.rewind();
        }
        if let Err(e) = sink.play() {
            log::debug!("[AUDIO] Playback waiting for interaction: {}", e);
        }
    }

    pub fn pause(&self) {
        self.lock().pause();
    }
}

impl Default for SharedAudio {
    fn default() -> Self {
        Self::new(NullAudio)
    }
}

impl std::fmt::Debug for SharedAudio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedAudio").finish_non_exhaustive()
    }
}
