//! High-level image operations.
//!
//! These functions combine the pure geometry in
//! [`calculations`](super::calculations) with the `image` crate's pixel work:
//! decode raw bytes, lay the source out on the target canvas, encode.

use super::calculations::{cover_crop, fit_with_bars};
use super::params::{LayoutPolicy, RESIZE_FILTER, TargetSpec};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, imageops};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImagingError>;

/// Bars around `fit` content.
pub const BAR_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Decode raw bytes into canonical opaque RGB8.
///
/// Whatever the source color mode (RGBA, grayscale, palette, 16-bit), the
/// result is converted to RGB so layout and captioning only handle one
/// pixel type. Alpha is dropped, not composited.
pub fn decode(bytes: &[u8]) -> Result<RgbImage> {
    let format = image::guess_format(bytes).map_err(|e| ImagingError::Decode(e.to_string()))?;
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImagingError::Decode(e.to_string()))?;
    debug!(
        format = ?format,
        color = ?img.color(),
        width = img.width(),
        height = img.height(),
        "Decoded source image"
    );
    Ok(match img {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    })
}

/// Produce an image of exactly `target`'s dimensions using its layout policy.
pub fn apply_layout(source: &RgbImage, target: &TargetSpec) -> RgbImage {
    match target.layout {
        LayoutPolicy::Cover => cover(source, target.dimensions()),
        LayoutPolicy::Fit => fit(source, target.dimensions()),
    }
}

/// Center-crop to the target aspect ratio, then resize to exactly `target`.
pub fn cover(source: &RgbImage, target: (u32, u32)) -> RgbImage {
    let crop = cover_crop(source.dimensions(), target);
    debug!(
        width = crop.width,
        height = crop.height,
        left = crop.left,
        top = crop.top,
        "Cropping source"
    );
    let cropped =
        imageops::crop_imm(source, crop.left, crop.top, crop.width, crop.height).to_image();
    imageops::resize(&cropped, target.0, target.1, RESIZE_FILTER)
}

/// Resize to fit entirely within `target`, centered on a black canvas.
pub fn fit(source: &RgbImage, target: (u32, u32)) -> RgbImage {
    let placed = fit_with_bars(source.dimensions(), target);
    debug!(
        width = placed.width,
        height = placed.height,
        left = placed.left,
        top = placed.top,
        "Letterboxing source"
    );
    let scaled = imageops::resize(source, placed.width, placed.height, RESIZE_FILTER);
    let mut canvas = RgbImage::from_pixel(target.0, target.1, BAR_COLOR);
    imageops::replace(&mut canvas, &scaled, placed.left as i64, placed.top as i64);
    canvas
}

/// Encode as PNG into memory.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| ImagingError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

/// Write to `path`, choosing the format from its extension (PNG when the
/// extension is missing or unknown).
pub fn save(image: &RgbImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path)
        .ok()
        .filter(|f| f.writing_enabled())
        .unwrap_or(ImageFormat::Png);
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    image
        .write_to(&mut writer, format)
        .map_err(|e| ImagingError::Encode(format!("{}: {e}", path.display())))
}
