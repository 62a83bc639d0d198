//! Image import and editor tools.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AnimateError, Result};
use crate::export::decode::encode_data_url;

/// Shown when a local image cannot be read.
pub const LOCAL_IMPORT_FAILED: &str = "Failed to read local image file.";

/// Drawing tools. The active tool is editor view state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ToolType {
    #[default]
    Pen,
    Eraser,
    Fill,
    Move,
    Resize,
    Text,
    Shape,
}

impl ToolType {
    pub const ALL: [ToolType; 7] = [
        ToolType::Pen,
        ToolType::Eraser,
        ToolType::Fill,
        ToolType::Move,
        ToolType::Resize,
        ToolType::Text,
        ToolType::Shape,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::Pen => "PEN",
            ToolType::Eraser => "ERASER",
            ToolType::Fill => "FILL",
            ToolType::Move => "MOVE",
            ToolType::Resize => "RESIZE",
            ToolType::Text => "TEXT",
            ToolType::Shape => "SHAPE",
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ToolType {
    type Err = AnimateError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ToolType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AnimateError::InvalidState {
                reason: format!("unknown tool '{}'", s),
            })
    }
}

/// Where an imported image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// The image generation collaborator.
    Ai,
    /// A file on the local disk.
    Local,
}

impl ImageSource {
    pub fn import_message(&self) -> &'static str {
        match self {
            ImageSource::Ai => "Character generated! Position it with MOVE tool.",
            ImageSource::Local => "Image imported! Position it with MOVE tool.",
        }
    }
}

/// An image waiting to be placed on the canvas with the Move tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedImage {
    /// Data URL handed to the drawing surface.
    pub payload: String,
    pub source: ImageSource,
}

impl ImportedImage {
    pub fn new(payload: impl Into<String>, source: ImageSource) -> Self {
        Self {
            payload: payload.into(),
            source,
        }
    }
}

/// Read an image file into a data URL.
pub fn read_image_file(path: &Path) -> Result<ImportedImage> {
    let bytes = std::fs::read(path).map_err(|e| AnimateError::FileReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let payload = encode_data_url(&bytes)?;
    log::info!("[IMPORT] Read {} ({} bytes)", path.display(), bytes.len());
    Ok(ImportedImage::new(payload, ImageSource::Local))
}
