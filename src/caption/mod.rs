//! Caption rendering: wrap the page's explanation text and draw it in a
//! translucent panel over the finished wallpaper.
//!
//! | Piece | Role |
//! |---|---|
//! | [`FontMetrics`] / [`CaptionFont`] | measurement and drawing seams |
//! | [`RustTypeFont`] | TrueType implementation via `rusttype` |
//! | [`wrap`] | greedy word wrap against a pixel width |
//! | [`layout_panel`] / [`composite`] | panel geometry and alpha blending |

mod compose;
mod font;
mod wrap;

pub use compose::{CaptionStyle, PanelLayout, composite, layout_panel};
pub use font::{CaptionFont, FontError, FontMetrics, RustTypeFont, blend};
pub use wrap::wrap;
