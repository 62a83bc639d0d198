//! Offscreen drawing surface used by export.

use image::{imageops, Rgba, RgbaImage};

use crate::error::{AnimateError, Result};

/// Largest surface export will allocate, in pixels.
pub const MAX_SURFACE_PIXELS: u64 = 8192 * 8192;

/// Background every exported frame is cleared to.
pub const DEFAULT_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// An RGBA surface that layer images are drawn onto, bottom to top.
#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let area = u64::from(width) * u64::from(height);
        if area == 0 || area > MAX_SURFACE_PIXELS {
            return Err(AnimateError::SurfaceError { width, height });
        }
        Ok(Self {
            pixels: RgbaImage::new(width, height),
        })
    }

    pub fn clear(&mut self, color: Rgba<u8>) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = color;
        }
    }

    /// Draw `image` at the origin over what is already on the surface.
    pub fn draw(&mut self, image: &RgbaImage) {
        imageops::overlay(&mut self.pixels, image, 0, 0);
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Parse `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex_color(value: &str) -> Result<Rgba<u8>> {
    let invalid = || AnimateError::InvalidState {
        reason: format!("invalid color '{}'", value),
    };
    let hex = value.strip_prefix('#').ok_or_else(invalid)?;
    if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
        return Err(invalid());
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, alpha]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_rejects_empty_surface() {
        assert!(matches!(
            Canvas::new(0, 10),
            Err(AnimateError::SurfaceError { .. })
        ));
        assert!(Canvas::new(u32::MAX, u32::MAX).is_err());
    }

    #[test]
    fn test_clear_and_draw() {
        let mut canvas = Canvas::new(4, 4).unwrap();
        canvas.clear(DEFAULT_BACKGROUND);
        assert_eq!(canvas.pixels().get_pixel(3, 3), &DEFAULT_BACKGROUND);

        let red = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        canvas.draw(&red);
        assert_eq!(canvas.pixels().get_pixel(1, 1), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.pixels().get_pixel(2, 2), &DEFAULT_BACKGROUND);
    }

    #[test]
    fn test_transparent_pixels_keep_background() {
        let mut canvas = Canvas::new(2, 2).unwrap();
        canvas.clear(DEFAULT_BACKGROUND);
        canvas.draw(&RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0])));
        assert_eq!(canvas.pixels().get_pixel(0, 0), &DEFAULT_BACKGROUND);
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ffffff").unwrap(), DEFAULT_BACKGROUND);
        assert_eq!(
            parse_hex_color("#0ea5e980").unwrap(),
            Rgba([0x0e, 0xa5, 0xe9, 0x80])
        );
        assert!(parse_hex_color("ffffff").is_err());
        assert!(parse_hex_color("#fff").is_err());
        assert!(parse_hex_color("#gggggg").is_err());
    }
}
