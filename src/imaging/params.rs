//! Parameter types for wallpaper layout.
//!
//! These describe *what* output to produce, not *how*. The pure geometry in
//! [`calculations`](super::calculations) and the pixel work in
//! [`operations`](super::operations) both consume them.
//!
//! ## Types
//!
//! - [`LayoutPolicy`]: `cover` (crop to fill) or `fit` (letterbox on black).
//! - [`TargetSpec`]: requested output width, height and layout policy.
//! - [`RESIZE_FILTER`]: the single resampling filter used for every resize.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resampling filter for all resizes, up or down.
///
/// Fixed on purpose: large downscales (APOD originals are often 4000px+)
/// look visibly worse with nearest/bilinear, and callers never get to pick.
pub const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// How the source image is mapped onto the target canvas.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LayoutPolicy {
    /// Crop to the target aspect ratio, then resize. No padding.
    Cover,
    /// Resize to fit entirely, pad the short axis with black bars.
    #[default]
    Fit,
}

impl fmt::Display for LayoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cover => f.write_str("cover"),
            Self::Fit => f.write_str("fit"),
        }
    }
}

impl FromStr for LayoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cover" => Ok(Self::Cover),
            "fit" => Ok(Self::Fit),
            other => Err(format!("unknown layout '{other}' (expected cover or fit)")),
        }
    }
}

/// Requested output: exact pixel dimensions plus layout policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSpec {
    pub width: u32,
    pub height: u32,
    pub layout: LayoutPolicy,
}

impl TargetSpec {
    pub fn new(width: u32, height: u32, layout: LayoutPolicy) -> Self {
        Self {
            width,
            height,
            layout,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
