//! Export Pipeline
//!
//! Renders every frame of a document snapshot onto one reused surface and
//! feeds the result to a `VideoEncoder`, strictly in order:
//!
//! 1. clear the surface to the background color
//! 2. composite visible layers bottom to top, each decode awaited before the next
//! 3. capture the surface into the encoder
//! 4. hold for one frame period before the next frame
//!
//! Any failure aborts the whole export and no artifact is produced.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use image::{Rgba, RgbaImage};
use sha2::{Digest, Sha256};
use tracing::Instrument;

use crate::error::{AnimateError, Result};
use crate::export::decode::decode_layer;
use crate::export::encoder::VideoEncoder;
use crate::export::surface::{Canvas, DEFAULT_BACKGROUND};
use crate::state::project::ProjectState;

/// Observer of each composited frame, in export order.
pub trait FrameSink: Send {
    fn frame_composited(&mut self, index: usize, surface: &RgbaImage);
}

impl FrameSink for () {
    fn frame_composited(&mut self, _index: usize, _surface: &RgbaImage) {}
}

impl FrameSink for Vec<RgbaImage> {
    fn frame_composited(&mut self, _index: usize, surface: &RgbaImage) {
        self.push(surface.clone());
    }
}

/// Lets a caller keep reading a sink that was handed to a spawned export.
impl<S: FrameSink> FrameSink for Arc<Mutex<S>> {
    fn frame_composited(&mut self, index: usize, surface: &RgbaImage) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .frame_composited(index, surface);
    }
}

/// The finished animation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub frame_count: usize,
}

impl ExportArtifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hex SHA-256 of the artifact bytes.
    pub fn sha256_hex(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Write the artifact into `dir` under its own file name.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes).map_err(|e| AnimateError::FileWriteError {
            path: path.clone(),
            source: e,
        })?;
        log::info!(
            "[EXPORT] Saved {} ({} bytes) to {:?}",
            self.file_name,
            self.bytes.len(),
            path
        );
        Ok(path)
    }
}

/// Sequential renderer from a document snapshot to an encoded animation.
#[derive(Debug, Clone)]
pub struct ExportPipeline {
    background: Rgba<u8>,
}

impl Default for ExportPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_BACKGROUND)
    }
}

impl ExportPipeline {
    pub fn new(background: Rgba<u8>) -> Self {
        Self { background }
    }

    pub fn background(&self) -> Rgba<u8> {
        self.background
    }

    /// Render `project` through `encoder`.
    ///
    /// The snapshot is owned by the export, so edits or playback ticks made
    /// while it runs do not change what gets rendered.
    pub async fn run(
        &self,
        project: Arc<ProjectState>,
        encoder: &mut dyn VideoEncoder,
        sink: &mut dyn FrameSink,
    ) -> Result<ExportArtifact> {
        let span = tracing::info_span!(
            "export",
            frames = project.frame_count(),
            fps = project.fps,
            width = project.width,
            height = project.height
        );
        self.render(project, encoder, sink).instrument(span).await
    }

    async fn render(
        &self,
        project: Arc<ProjectState>,
        encoder: &mut dyn VideoEncoder,
        sink: &mut dyn FrameSink,
    ) -> Result<ExportArtifact> {
        let mut canvas = Canvas::new(project.width, project.height)?;
        encoder.begin(project.width, project.height, project.fps)?;
        let period = project.frame_period();
        tracing::info!("export started");

        for (index, frame) in project.frames.iter().enumerate() {
            canvas.clear(self.background);

            for layer in frame.visible_layers() {
                let Some(payload) = layer.data.clone() else {
                    continue;
                };
                let image = decode_layer(payload).await.map_err(|e| {
                    tracing::warn!(frame = index, layer = %layer.id, error = %e, "layer decode failed");
                    e
                })?;
                canvas.draw(&image);
            }

            encoder.encode_frame(canvas.pixels())?;
            sink.frame_composited(index, canvas.pixels());
            tracing::debug!(frame = index, id = %frame.id, "frame captured");

            tokio::time::sleep(period).await;
        }

        let bytes = encoder.finish()?.concat();
        let artifact = ExportArtifact {
            file_name: format!(
                "animation-{}.{}",
                Utc::now().timestamp_millis(),
                encoder.extension()
            ),
            mime_type: encoder.mime_type().to_string(),
            bytes,
            frame_count: project.frame_count(),
        };
        tracing::info!(bytes = artifact.len(), file = %artifact.file_name, "export finished");
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::decode::encode_data_url;
    use crate::export::encoder::GifVideoEncoder;
    use crate::timeline::{add_frame, update_layer_data};
    use image::ImageFormat;
    use std::io::Cursor;
    use std::time::Duration;
    use tokio::time::Instant;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn red_payload() -> String {
        let mut out = Cursor::new(Vec::new());
        RgbaImage::from_pixel(4, 4, RED)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        encode_data_url(&out.into_inner()).unwrap()
    }

    /// Records every call an encoder receives.
    #[derive(Default)]
    struct RecordingEncoder {
        begun: Option<(u32, u32, u32)>,
        frames: usize,
        fail_on: Option<usize>,
    }

    impl VideoEncoder for RecordingEncoder {
        fn mime_type(&self) -> &'static str {
            "video/test"
        }

        fn extension(&self) -> &'static str {
            "bin"
        }

        fn begin(&mut self, width: u32, height: u32, fps: u32) -> Result<()> {
            self.begun = Some((width, height, fps));
            Ok(())
        }

        fn encode_frame(&mut self, _frame: &RgbaImage) -> Result<()> {
            if self.fail_on == Some(self.frames) {
                return Err(AnimateError::EncoderError {
                    reason: "boom".into(),
                });
            }
            self.frames += 1;
            Ok(())
        }

        fn finish(&mut self) -> Result<Vec<Vec<u8>>> {
            Ok(vec![vec![1, 2], vec![3]])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_are_paced_and_chunks_joined() {
        let project = add_frame(&ProjectState::new(4, 4, 2)).unwrap();
        let mut encoder = RecordingEncoder::default();
        let started = Instant::now();

        let artifact = ExportPipeline::default()
            .run(Arc::new(project), &mut encoder, &mut ())
            .await
            .unwrap();

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1000));
        assert!(elapsed < Duration::from_millis(1100));
        assert_eq!(encoder.begun, Some((4, 4, 2)));
        assert_eq!(encoder.frames, 2);
        assert_eq!(artifact.bytes, vec![1, 2, 3]);
        assert_eq!(artifact.mime_type, "video/test");
        assert!(artifact.file_name.starts_with("animation-"));
        assert!(artifact.file_name.ends_with(".bin"));
        assert_eq!(artifact.frame_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_layers_composite_over_background() {
        let project = update_layer_data(&ProjectState::new(8, 8, 12), 0, 0, &red_payload()).unwrap();
        let mut frames: Vec<RgbaImage> = Vec::new();

        ExportPipeline::default()
            .run(Arc::new(project), &mut GifVideoEncoder::default(), &mut frames)
            .await
            .unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].get_pixel(0, 0), &RED);
        assert_eq!(frames[0].get_pixel(7, 7), &DEFAULT_BACKGROUND);
    }

    #[tokio::test(start_paused = true)]
    async fn test_corrupt_layer_aborts_export() {
        let project = update_layer_data(
            &ProjectState::new(4, 4, 12),
            0,
            0,
            "data:image/png;base64,aGVsbG8=",
        )
        .unwrap();
        let mut encoder = RecordingEncoder::default();

        let result = ExportPipeline::default()
            .run(Arc::new(project), &mut encoder, &mut ())
            .await;

        assert!(matches!(result, Err(AnimateError::DecodeError { .. })));
        assert_eq!(encoder.frames, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_encoder_failure_aborts_export() {
        let project = add_frame(&ProjectState::new(4, 4, 12)).unwrap();
        let mut encoder = RecordingEncoder {
            fail_on: Some(1),
            ..Default::default()
        };
        let mut frames: Vec<RgbaImage> = Vec::new();

        let result = ExportPipeline::default()
            .run(Arc::new(project), &mut encoder, &mut frames)
            .await;

        assert!(matches!(result, Err(AnimateError::EncoderError { .. })));
        assert_eq!(frames.len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_surface_is_rejected() {
        let mut project = ProjectState::new(4, 4, 12);
        project.width = 100_000;
        project.height = 100_000;

        let result = ExportPipeline::default()
            .run(Arc::new(project), &mut RecordingEncoder::default(), &mut ())
            .await;
        assert!(matches!(result, Err(AnimateError::SurfaceError { .. })));
    }

    #[test]
    fn test_artifact_digest_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ExportArtifact {
            file_name: "animation-1.gif".into(),
            mime_type: "image/gif".into(),
            bytes: b"abc".to_vec(),
            frame_count: 1,
        };
        assert_eq!(
            artifact.sha256_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        let path = artifact.save_to(dir.path()).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"abc");
    }
}
