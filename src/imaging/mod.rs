//! Image processing in pure Rust via the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory_with_format`, normalized to RGB8 |
//! | **Cover** | centered `crop_imm` + `resize` (Lanczos3) |
//! | **Fit** | `resize` (Lanczos3) + `replace` onto a black canvas |
//! | **Encode** | `write_to` (PNG for responses, extension-driven for files) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop/placement geometry (unit testable)
//! - **Parameters**: [`TargetSpec`], [`LayoutPolicy`] and the fixed [`RESIZE_FILTER`]
//! - **Operations**: Pixel work combining calculations with the `image` crate

mod calculations;
pub mod operations;
mod params;

pub use calculations::{Rect, cover_crop, fit_with_bars};
pub use operations::{ImagingError, apply_layout, decode, encode_png, save};
pub use params::{LayoutPolicy, RESIZE_FILTER, TargetSpec};
