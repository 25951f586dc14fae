//! Font seams for caption rendering.
//!
//! [`FontMetrics`] is all the wrapper needs; [`CaptionFont`] adds vertical
//! metrics and drawing for the compositor. [`RustTypeFont`] implements both
//! on a TrueType file via `rusttype`.

use image::{Rgb, RgbImage};
use rusttype::{Font, Scale, point};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("Failed to read font {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Not a usable TrueType/OpenType font: {0}")]
    Invalid(PathBuf),
    #[error("Font size must be positive, got {0}")]
    Size(f32),
}

/// Horizontal text measurement.
pub trait FontMetrics {
    /// Rendered width of `text` in pixels.
    fn measure_width(&self, text: &str) -> f32;
}

/// A font the compositor can lay out and draw with.
pub trait CaptionFont: FontMetrics + Send + Sync {
    /// Distance between consecutive baselines, in whole pixels.
    fn line_height(&self) -> u32;

    /// Draw one line with its top-left corner at `(x, y)`, blending glyph
    /// coverage onto `canvas`. Pixels outside the canvas are skipped.
    fn draw_line(&self, canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, text: &str);
}

/// A TrueType font at a fixed pixel size.
pub struct RustTypeFont {
    font: Font<'static>,
    scale: Scale,
}

impl RustTypeFont {
    pub fn from_file(path: &Path, px: f32) -> Result<Self, FontError> {
        let bytes = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes, px).map_err(|e| match e {
            FontError::Invalid(_) => FontError::Invalid(path.to_path_buf()),
            other => other,
        })
    }

    pub fn from_bytes(bytes: Vec<u8>, px: f32) -> Result<Self, FontError> {
        if !(px > 0.0) {
            return Err(FontError::Size(px));
        }
        let font = Font::try_from_vec(bytes).ok_or_else(|| FontError::Invalid(PathBuf::new()))?;
        Ok(Self {
            font,
            scale: Scale::uniform(px),
        })
    }
}

impl FontMetrics for RustTypeFont {
    fn measure_width(&self, text: &str) -> f32 {
        self.font
            .layout(text, self.scale, point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
    }
}

impl CaptionFont for RustTypeFont {
    fn line_height(&self) -> u32 {
        let v = self.font.v_metrics(self.scale);
        (v.ascent - v.descent + v.line_gap).ceil().max(1.0) as u32
    }

    fn draw_line(&self, canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, text: &str) {
        let ascent = self.font.v_metrics(self.scale).ascent;
        let origin = point(x as f32, y as f32 + ascent);
        let (width, height) = canvas.dimensions();

        for glyph in self.font.layout(text, self.scale, origin) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let px = gx as i32 + bb.min.x;
                let py = gy as i32 + bb.min.y;
                if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                    return;
                }
                let dst = canvas.get_pixel_mut(px as u32, py as u32);
                *dst = blend(color, *dst, coverage);
            });
        }
    }
}

/// `round(src * a + dst * (1 - a))` per channel, `a` in `[0, 1]`.
pub fn blend(src: Rgb<u8>, dst: Rgb<u8>, alpha: f32) -> Rgb<u8> {
    let a = alpha.clamp(0.0, 1.0);
    let mix = |s: u8, d: u8| (s as f32 * a + d as f32 * (1.0 - a)).round() as u8;
    Rgb([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_endpoints() {
        let white = Rgb([255, 255, 255]);
        let black = Rgb([0, 0, 0]);
        assert_eq!(blend(white, black, 1.0), white);
        assert_eq!(blend(white, black, 0.0), black);
    }

    #[test]
    fn blend_rounds_half_up() {
        // 255 * 0.5 = 127.5 -> 128
        assert_eq!(blend(Rgb([255, 0, 0]), Rgb([0, 0, 0]), 0.5), Rgb([128, 0, 0]));
    }

    #[test]
    fn blend_at_panel_opacity() {
        // 192/255 black over white: 255 * (63/255) = 63
        let out = blend(Rgb([0, 0, 0]), Rgb([255, 255, 255]), 192.0 / 255.0);
        assert_eq!(out, Rgb([63, 63, 63]));
    }

    #[test]
    fn missing_font_file_is_io_error() {
        let result = RustTypeFont::from_file(Path::new("/nonexistent/font.ttf"), 18.0);
        assert!(matches!(result, Err(FontError::Io { .. })));
    }

    #[test]
    fn garbage_font_file_is_invalid() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("bogus.ttf");
        std::fs::write(&path, b"not a font at all").unwrap();
        match RustTypeFont::from_file(&path, 18.0) {
            Err(FontError::Invalid(p)) => assert_eq!(p, path),
            Err(other) => panic!("expected Invalid, got {other}"),
            Ok(_) => panic!("expected Invalid, got a font"),
        }
    }

    #[test]
    fn non_positive_size_is_rejected() {
        assert!(matches!(
            RustTypeFont::from_bytes(Vec::new(), 0.0),
            Err(FontError::Size(_))
        ));
    }
}
