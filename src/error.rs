//! Error types for the animation engine.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for animate operations.
pub type Result<T> = std::result::Result<T, AnimateError>;

/// Errors that can occur while editing, persisting or exporting a project.
#[derive(Error, Debug)]
pub enum AnimateError {
    // State Errors
    #[error("Invalid project state: {reason}")]
    InvalidState { reason: String },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Serialization Errors
    #[error("JSON serialization error: {0}")]
    JsonSerializationError(#[from] serde_json::Error),

    #[error("Invalid project schema version: {version}")]
    InvalidSchemaVersion { version: String },

    #[error("Migration failed from {from} to {to}: {reason}")]
    MigrationError {
        from: String,
        to: String,
        reason: String,
    },

    // Image Errors
    #[error("Failed to decode layer image: {reason}")]
    DecodeError { reason: String },

    #[error("Unsupported image payload: {reason}")]
    UnsupportedImage { reason: String },

    // Export Errors
    #[error("Surface allocation failed: {width}x{height}")]
    SurfaceError { width: u32, height: u32 },

    #[error("Encoder error: {reason}")]
    EncoderError { reason: String },

    #[error("An export is already in progress")]
    ExportInProgress,

    #[error("Export cancelled")]
    ExportCancelled,

    // Generic Errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnimateError {
    /// Short machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AnimateError::InvalidState { .. } => "INVALID_STATE",
            AnimateError::FileNotFound { .. } => "FILE_NOT_FOUND",
            AnimateError::FileReadError { .. } => "FILE_READ_ERROR",
            AnimateError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            AnimateError::JsonSerializationError(_) => "SERIALIZATION_ERROR",
            AnimateError::InvalidSchemaVersion { .. } => "INVALID_SCHEMA_VERSION",
            AnimateError::MigrationError { .. } => "MIGRATION_ERROR",
            AnimateError::DecodeError { .. } => "DECODE_ERROR",
            AnimateError::UnsupportedImage { .. } => "UNSUPPORTED_IMAGE",
            AnimateError::SurfaceError { .. } => "SURFACE_ERROR",
            AnimateError::EncoderError { .. } => "ENCODER_ERROR",
            AnimateError::ExportInProgress => "EXPORT_IN_PROGRESS",
            AnimateError::ExportCancelled => "EXPORT_CANCELLED",
            AnimateError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the editing session can carry on unchanged after this error.
    ///
    /// Every error the editor catches at an operation boundary is recoverable;
    /// only internal errors indicate a broken invariant.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AnimateError::Internal(_))
    }

    /// Returns a user-friendly recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            AnimateError::FileNotFound { .. } => Some("Check the file path and try again."),
            AnimateError::FileReadError { .. } => Some("Make sure the file is readable."),
            AnimateError::InvalidSchemaVersion { .. } => {
                Some("The project was saved by a newer version. Update and try again.")
            }
            AnimateError::DecodeError { .. } => {
                Some("A layer holds image data that could not be decoded. Clear or redraw it.")
            }
            AnimateError::ExportInProgress => Some("Wait for the current export to finish."),
            _ => None,
        }
    }

    /// Short message suitable for a transient notification.
    pub fn friendly_message(&self) -> String {
        match self {
            AnimateError::FileReadError { path, .. } | AnimateError::FileNotFound { path } => {
                format!("Failed to read {}", path.display())
            }
            AnimateError::DecodeError { .. }
            | AnimateError::SurfaceError { .. }
            | AnimateError::EncoderError { .. } => "Export failed".to_string(),
            AnimateError::ExportCancelled => "Export cancelled".to_string(),
            _ => self.to_string(),
        }
    }
}
