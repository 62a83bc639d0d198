//! Export Module
//!
//! - Offscreen surface and background fill
//! - Data URL layer decoding
//! - Video encoder seam with an animated GIF implementation
//! - Sequential frame-by-frame export pipeline

pub mod decode;
pub mod encoder;
pub mod pipeline;
pub mod surface;

pub use decode::{decode_payload, encode_data_url};
pub use encoder::{ChunkAccumulator, GifVideoEncoder, VideoEncoder};
pub use pipeline::{ExportArtifact, ExportPipeline, FrameSink};
pub use surface::{parse_hex_color, Canvas, DEFAULT_BACKGROUND};
