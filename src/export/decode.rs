//! Layer payload decoding.
//!
//! Layer pixel data travels as data URLs (`data:image/png;base64,...`).
//! Only export looks inside them.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use image::RgbaImage;

use crate::error::{AnimateError, Result};

/// Extract the encoded image bytes from a base64 data URL.
pub fn payload_bytes(payload: &str) -> Result<Vec<u8>> {
    let (header, body) = payload
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| AnimateError::UnsupportedImage {
            reason: "payload is not a data URL".to_string(),
        })?;

    if !header.ends_with(";base64") {
        return Err(AnimateError::UnsupportedImage {
            reason: format!("data URL '{}' is not base64 encoded", header),
        });
    }

    BASE64_STANDARD
        .decode(body.trim())
        .map_err(|e| AnimateError::DecodeError {
            reason: e.to_string(),
        })
}

/// Decode a layer payload into RGBA pixels.
pub fn decode_payload(payload: &str) -> Result<RgbaImage> {
    let bytes = payload_bytes(payload)?;
    let image = image::load_from_memory(&bytes).map_err(|e| AnimateError::DecodeError {
        reason: e.to_string(),
    })?;
    Ok(image.to_rgba8())
}

/// Decode off the async executor. Resolves once the image is ready.
pub async fn decode_layer(payload: Arc<str>) -> Result<RgbaImage> {
    tokio::task::spawn_blocking(move || decode_payload(&payload))
        .await
        .map_err(|e| AnimateError::Internal(format!("decode task failed: {}", e)))?
}

/// Wrap encoded image bytes in a data URL, sniffing the mime type.
pub fn encode_data_url(bytes: &[u8]) -> Result<String> {
    let format = image::guess_format(bytes).map_err(|e| AnimateError::UnsupportedImage {
        reason: e.to_string(),
    })?;
    Ok(format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        BASE64_STANDARD.encode(bytes)
    ))
}
