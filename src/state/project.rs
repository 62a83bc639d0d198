//! Project State Schema
//!
//! The canonical animation document: frames, layers, dynamic effects and
//! the playback/canvas settings. A `ProjectState` is an immutable value;
//! every edit builds a new one. Frames are reference counted so that
//! snapshots kept in history share every frame an edit did not touch.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AnimateError, Result};

/// Default canvas width in pixels.
pub const CANVAS_WIDTH: u32 = 800;
/// Default canvas height in pixels.
pub const CANVAS_HEIGHT: u32 = 600;
/// Upper bound on the number of frames in a project.
pub const MAX_FRAMES: usize = 100;
/// Default playback rate.
pub const DEFAULT_FPS: u32 = 12;

/// Identifier of the frame in a freshly created project.
pub const INITIAL_FRAME_ID: &str = "frame-1";
/// Identifier of the layer in a freshly created project.
pub const INITIAL_LAYER_ID: &str = "layer-1";

fn fresh_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// One drawable surface within a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// Unique identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Encoded image payload (a data URL). `None` means the layer is blank.
    #[serde(default)]
    pub data: Option<Arc<str>>,

    /// Hidden layers are skipped when compositing.
    pub visible: bool,

    /// Locked layers reject pixel updates.
    pub locked: bool,

    /// Opacity in the range 0.0..=1.0.
    pub opacity: f32,
}

impl Layer {
    /// Create a blank, visible, unlocked layer.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            data: None,
            visible: true,
            locked: false,
            opacity: 1.0,
        }
    }

    /// Create a blank layer with a newly generated identifier.
    pub fn blank(name: impl Into<String>) -> Self {
        Self::new(fresh_id("layer"), name)
    }

    /// The layer every new frame starts with.
    pub fn initial() -> Self {
        Self::new(INITIAL_LAYER_ID, "Layer 1")
    }

    /// True when the layer carries a non-empty image payload.
    pub fn has_pixels(&self) -> bool {
        self.data.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// The fixed set of post-process effects a frame can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Particles,
    MotionBlur,
    Glow,
    SpeedLines,
}

impl EffectKind {
    pub const ALL: [EffectKind; 4] = [
        EffectKind::Particles,
        EffectKind::MotionBlur,
        EffectKind::Glow,
        EffectKind::SpeedLines,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::Particles => "particles",
            EffectKind::MotionBlur => "motion_blur",
            EffectKind::Glow => "glow",
            EffectKind::SpeedLines => "speed_lines",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectKind {
    type Err = AnimateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "particles" => Ok(EffectKind::Particles),
            "motion_blur" => Ok(EffectKind::MotionBlur),
            "glow" => Ok(EffectKind::Glow),
            "speed_lines" => Ok(EffectKind::SpeedLines),
            other => Err(AnimateError::InvalidState {
                reason: format!("unknown effect kind '{}'", other),
            }),
        }
    }
}

/// A named post-process descriptor attached to a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicEffect {
    #[serde(rename = "type")]
    pub kind: EffectKind,

    pub intensity: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl DynamicEffect {
    pub fn new(kind: EffectKind, intensity: f32) -> Self {
        Self {
            kind,
            intensity,
            color: None,
        }
    }
}

/// One timeline position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub id: String,

    /// Compositing order, bottom to top. Never empty.
    pub layers: Vec<Layer>,

    #[serde(rename = "effectsLayer", default)]
    pub effects: Vec<DynamicEffect>,

    /// Derived preview of the frame; not authoritative.
    #[serde(default)]
    pub thumbnail: Option<Arc<str>>,
}

impl Frame {
    /// The frame a new project starts with.
    pub fn initial() -> Self {
        Self {
            id: INITIAL_FRAME_ID.to_string(),
            layers: vec![Layer::initial()],
            effects: Vec::new(),
            thumbnail: None,
        }
    }

    /// A new frame with a single default layer and fresh identifiers.
    pub fn blank() -> Self {
        Self {
            id: fresh_id("frame"),
            layers: vec![Layer::blank("Layer 1")],
            effects: Vec::new(),
            thumbnail: None,
        }
    }

    /// Deep copy with new identifiers for the frame and every layer.
    /// Pixel data, effects and thumbnail are shared with the source.
    pub fn duplicate(&self) -> Self {
        Self {
            id: fresh_id("frame"),
            layers: self
                .layers
                .iter()
                .map(|l| Layer {
                    id: fresh_id("layer"),
                    ..l.clone()
                })
                .collect(),
            effects: self.effects.clone(),
            thumbnail: self.thumbnail.clone(),
        }
    }

    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    /// Remove the effect of `kind` if present, otherwise append it.
    pub fn toggle_effect(&mut self, kind: EffectKind, intensity: f32) {
        if self.has_effect(kind) {
            self.effects.retain(|e| e.kind != kind);
        } else {
            self.effects.push(DynamicEffect::new(kind, intensity));
        }
    }

    /// Layers that contribute pixels to the composite, bottom to top.
    pub fn visible_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| l.visible && l.has_pixels())
    }
}

/// The full animation document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    pub frames: Vec<Arc<Frame>>,

    pub current_frame_index: usize,

    #[serde(default)]
    pub current_layer_index: usize,

    pub fps: u32,

    pub width: u32,

    pub height: u32,

    #[serde(rename = "audioUrl", default)]
    pub audio_track: Option<String>,
}

impl Default for ProjectState {
    fn default() -> Self {
        Self::new(CANVAS_WIDTH, CANVAS_HEIGHT, DEFAULT_FPS)
    }
}

impl ProjectState {
    /// A single-frame, single-layer project.
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self {
            frames: vec![Arc::new(Frame::initial())],
            current_frame_index: 0,
            current_layer_index: 0,
            fps,
            width,
            height,
            audio_track: None,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// The frame under the playhead.
    ///
    /// Panics only if the state was built without going through `validate`.
    pub fn current_frame(&self) -> &Frame {
        &self.frames[self.current_frame_index]
    }

    pub fn current_layer(&self) -> &Layer {
        &self.current_frame().layers[self.current_layer_index]
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index).map(|f| f.as_ref())
    }

    /// Mutable access to a frame, cloning it first if a snapshot still shares it.
    pub fn frame_mut(&mut self, index: usize) -> Option<&mut Frame> {
        self.frames.get_mut(index).map(Arc::make_mut)
    }

    pub fn frame_ids(&self) -> Vec<&str> {
        self.frames.iter().map(|f| f.id.as_str()).collect()
    }

    /// Time one frame stays on screen: 1000/fps milliseconds.
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }

    /// Pull the current layer index back inside the current frame.
    pub fn clamp_layer_index(&mut self) {
        if let Some(frame) = self.frames.get(self.current_frame_index) {
            let last = frame.layers.len().saturating_sub(1);
            self.current_layer_index = self.current_layer_index.min(last);
        }
    }

    /// Check every structural invariant of the document.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(AnimateError::InvalidState { reason });

        if self.frames.is_empty() {
            return invalid("project has no frames".to_string());
        }
        if self.current_frame_index >= self.frames.len() {
            return invalid(format!(
                "current frame index {} out of range for {} frames",
                self.current_frame_index,
                self.frames.len()
            ));
        }
        if self.fps == 0 {
            return invalid("fps must be positive".to_string());
        }
        if self.width == 0 || self.height == 0 {
            return invalid(format!(
                "canvas dimensions must be positive, got {}x{}",
                self.width, self.height
            ));
        }

        for frame in &self.frames {
            if frame.layers.is_empty() {
                return invalid(format!("frame '{}' has no layers", frame.id));
            }
            for layer in &frame.layers {
                if !(0.0..=1.0).contains(&layer.opacity) {
                    return invalid(format!(
                        "layer '{}' opacity {} outside 0..1",
                        layer.id, layer.opacity
                    ));
                }
            }
            for (i, effect) in frame.effects.iter().enumerate() {
                if frame.effects[..i].iter().any(|e| e.kind == effect.kind) {
                    return invalid(format!(
                        "frame '{}' carries effect '{}' twice",
                        frame.id, effect.kind
                    ));
                }
            }
        }

        let layers = self.current_frame().layers.len();
        if self.current_layer_index >= layers {
            return invalid(format!(
                "current layer index {} out of range for {} layers",
                self.current_layer_index, layers
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_project() {
        let state = ProjectState::default();
        assert_eq!(state.frame_count(), 1);
        assert_eq!(state.current_frame().id, INITIAL_FRAME_ID);
        assert_eq!(state.current_layer().id, INITIAL_LAYER_ID);
        assert_eq!(state.fps, DEFAULT_FPS);
        assert_eq!((state.width, state.height), (800, 600));
        assert!(state.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_frames() {
        let mut state = ProjectState::default();
        state.frames.clear();
        assert!(matches!(
            state.validate(),
            Err(AnimateError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_indices() {
        let mut state = ProjectState::default();
        state.current_frame_index = 1;
        assert!(state.validate().is_err());

        let mut state = ProjectState::default();
        state.current_layer_index = 3;
        assert!(state.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_effect_kind() {
        let mut state = ProjectState::default();
        let frame = state.frame_mut(0).unwrap();
        frame.effects.push(DynamicEffect::new(EffectKind::Glow, 0.5));
        frame.effects.push(DynamicEffect::new(EffectKind::Glow, 0.8));
        assert!(state.validate().is_err());
    }

    #[test]
    fn test_has_pixels_treats_empty_payload_as_blank() {
        let mut layer = Layer::initial();
        assert!(!layer.has_pixels());
        layer.data = Some(Arc::from(""));
        assert!(!layer.has_pixels());
        layer.data = Some(Arc::from("data:image/png;base64,AAAA"));
        assert!(layer.has_pixels());
    }

    #[test]
    fn test_duplicate_assigns_new_ids() {
        let mut frame = Frame::initial();
        frame.layers.push(Layer::blank("Layer 2"));
        frame.layers[0].data = Some(Arc::from("data:image/png;base64,AAAA"));

        let copy = frame.duplicate();
        assert_ne!(copy.id, frame.id);
        assert_ne!(copy.layers[0].id, copy.layers[1].id);
        for (a, b) in frame.layers.iter().zip(&copy.layers) {
            assert_ne!(a.id, b.id);
            assert_eq!(a.data, b.data);
        }
    }

    #[test]
    fn test_toggle_effect() {
        let mut frame = Frame::initial();
        frame.toggle_effect(EffectKind::SpeedLines, 0.4);
        assert!(frame.has_effect(EffectKind::SpeedLines));
        frame.toggle_effect(EffectKind::SpeedLines, 0.9);
        assert!(frame.effects.is_empty());
    }

    #[test]
    fn test_effect_kind_parse() {
        assert_eq!(
            "motion-blur".parse::<EffectKind>().unwrap(),
            EffectKind::MotionBlur
        );
        assert!("sparkle".parse::<EffectKind>().is_err());
    }

    #[test]
    fn test_frame_period() {
        let mut state = ProjectState::default();
        state.fps = 4;
        assert_eq!(state.frame_period(), Duration::from_millis(250));
    }

    #[test]
    fn test_frame_mut_copies_shared_frame() {
        let state = ProjectState::default();
        let mut edited = state.clone();
        edited.frame_mut(0).unwrap().id = "edited".to_string();
        assert_eq!(state.frames[0].id, INITIAL_FRAME_ID);
        assert_eq!(edited.frames[0].id, "edited");
    }

    #[test]
    fn test_serialized_keys_match_document_format() {
        let json = serde_json::to_value(ProjectState::default()).unwrap();
        assert!(json.get("currentFrameIndex").is_some());
        assert!(json.get("audioUrl").is_some());
        assert!(json["frames"][0].get("effectsLayer").is_some());
    }
}
