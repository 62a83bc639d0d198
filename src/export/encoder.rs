//! Video encoder seam and the built-in animated GIF encoder.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use crate::error::{AnimateError, Result};

/// Streaming encoder fed one composited surface per frame interval.
pub trait VideoEncoder: Send {
    fn mime_type(&self) -> &'static str;

    /// File extension of the produced artifact, without the dot.
    fn extension(&self) -> &'static str;

    /// Open the stream for `width`x`height` frames at `fps`.
    fn begin(&mut self, width: u32, height: u32, fps: u32) -> Result<()>;

    fn encode_frame(&mut self, frame: &RgbaImage) -> Result<()>;

    /// Finalize the stream and hand back every emitted chunk in order.
    fn finish(&mut self) -> Result<Vec<Vec<u8>>>;
}

/// Collects the byte chunks an encoder emits.
#[derive(Debug, Clone, Default)]
pub struct ChunkAccumulator(Arc<Mutex<Vec<Vec<u8>>>>);

impl ChunkAccumulator {
    /// Take every chunk collected so far.
    pub fn take(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Write for ChunkAccumulator {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !buf.is_empty() {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(buf.to_vec());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Quantizer speed, 1 (best) to 30 (fastest).
pub const DEFAULT_GIF_SPEED: i32 = 10;

/// Looping animated GIF encoder.
pub struct GifVideoEncoder {
    speed: i32,
    fps: u32,
    encoder: Option<GifEncoder<ChunkAccumulator>>,
    chunks: ChunkAccumulator,
}

impl Default for GifVideoEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_GIF_SPEED)
    }
}

impl GifVideoEncoder {
    pub fn new(speed: i32) -> Self {
        Self {
            speed: speed.clamp(1, 30),
            fps: 1,
            encoder: None,
            chunks: ChunkAccumulator::default(),
        }
    }
}

fn encoder_error(e: impl std::fmt::Display) -> AnimateError {
    AnimateError::EncoderError {
        reason: e.to_string(),
    }
}

impl VideoEncoder for GifVideoEncoder {
    fn mime_type(&self) -> &'static str {
        "image/gif"
    }

    fn extension(&self) -> &'static str {
        "gif"
    }

    fn begin(&mut self, width: u32, height: u32, fps: u32) -> Result<()> {
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(encoder_error(format!(
                "{}x{} exceeds the GIF frame size limit",
                width, height
            )));
        }
        let mut encoder = GifEncoder::new_with_speed(self.chunks.clone(), self.speed);
        encoder.set_repeat(Repeat::Infinite).map_err(encoder_error)?;
        self.encoder = Some(encoder);
        self.fps = fps.max(1);
        Ok(())
    }

    fn encode_frame(&mut self, frame: &RgbaImage) -> Result<()> {
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| encoder_error("encoder not started"))?;
        let delay = Delay::from_numer_denom_ms(1000, self.fps);
        encoder
            .encode_frame(Frame::from_parts(frame.clone(), 0, 0, delay))
            .map_err(encoder_error)
    }

    fn finish(&mut self) -> Result<Vec<Vec<u8>>> {
        let encoder = self
            .encoder
            .take()
            .ok_or_else(|| encoder_error("encoder not started"))?;
        // dropping the encoder writes the GIF trailer
        drop(encoder);
        Ok(self.chunks.take())
    }
}
