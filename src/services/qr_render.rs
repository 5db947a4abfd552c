//! QR image rendering (PNG and SVG).

use std::io::Cursor;

use image::{ImageFormat, Luma};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};

use crate::errors::{QrGenError, Result};

pub const MIN_IMAGE_SIZE: u32 = 64;
pub const MAX_IMAGE_SIZE: u32 = 2048;
pub const DEFAULT_IMAGE_SIZE: u32 = 256;

fn encode(content: &str) -> Result<QrCode> {
    QrCode::with_error_correction_level(content.as_bytes(), EcLevel::M)
        .map_err(|e| QrGenError::validation(format!("Content not encodable as QR: {}", e)))
}

/// Render `content` as a PNG at roughly `size` pixels square.
pub fn render_png(content: &str, size: u32) -> Result<Vec<u8>> {
    let size = size.clamp(MIN_IMAGE_SIZE, MAX_IMAGE_SIZE);
    let code = encode(content)?;
    let img = code
        .render::<Luma<u8>>()
        .min_dimensions(size, size)
        .build();

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| QrGenError::file_operation(format!("PNG encoding failed: {}", e)))?;
    Ok(buf)
}

/// Render `content` as an SVG document scaled to `size` units.
pub fn render_svg(content: &str, size: u32) -> Result<String> {
    let size = size.clamp(MIN_IMAGE_SIZE, MAX_IMAGE_SIZE);
    let code = encode(content)?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(size, size)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_png_with_signature() {
        let png = render_png("https://example.com/q/abc1234", 256).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }

    #[test]
    fn renders_svg_document() {
        let svg = render_svg("https://example.com/q/abc1234", 256).unwrap();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn size_is_clamped() {
        // A 10px request still yields a readable (>= MIN) image.
        let png = render_png("hello", 10).unwrap();
        assert!(!png.is_empty());
    }

    #[test]
    fn oversized_content_is_rejected() {
        let content = "x".repeat(8000);
        assert!(render_png(&content, 256).is_err());
    }
}
