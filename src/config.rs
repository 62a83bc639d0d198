//! Editor configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes.

use std::path::Path;
use std::time::Duration;

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::{AnimateError, Result};
use crate::export::surface::parse_hex_color;
use crate::state::history::DEFAULT_HISTORY_CAPACITY;
use crate::state::project::{ProjectState, CANVAS_HEIGHT, CANVAS_WIDTH, DEFAULT_FPS};

/// How long a notification stays up.
pub const DEFAULT_NOTIFICATION_TTL_MS: u64 = 3000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub history_capacity: usize,
    pub notification_ttl_ms: u64,

    /// Export background as `#rrggbb`.
    pub background: String,

    pub gif_speed: i32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            fps: DEFAULT_FPS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            notification_ttl_ms: DEFAULT_NOTIFICATION_TTL_MS,
            background: "#ffffff".to_string(),
            gif_speed: 10,
        }
    }
}

impl EditorConfig {
    /// Load a JSON config file and check it.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AnimateError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| AnimateError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("[CONFIG] Loaded {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AnimateError::InvalidState {
                reason: format!("canvas {}x{} must be positive", self.width, self.height),
            });
        }
        if self.fps == 0 {
            return Err(AnimateError::InvalidState {
                reason: "fps must be positive".to_string(),
            });
        }
        if self.history_capacity == 0 {
            return Err(AnimateError::InvalidState {
                reason: "history capacity must be positive".to_string(),
            });
        }
        self.background_color()?;
        Ok(())
    }

    pub fn background_color(&self) -> Result<Rgba<u8>> {
        parse_hex_color(&self.background)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    /// The document a fresh session or "new project" starts from.
    pub fn initial_project(&self) -> ProjectState {
        ProjectState::new(self.width, self.height, self.fps)
    }
}
