//! Caption panel layout and compositing.
//!
//! The panel sits in the bottom-right corner, a fixed fraction of the image
//! width, inset by a margin. Its height follows the wrapped text:
//!
//! ```text
//! +--------------------------------------------+
//! |                                            |
//! |                          +--------------+  |
//! |                          | padding      |  |
//! |                          |   line 1     |  |
//! |                          |   line 2     |  |
//! |                          |              |  |
//! |                          +--------------+  |
//! |                                   margin   |
//! +--------------------------------------------+
//! ```
//!
//! Geometry is computed by [`layout_panel`] without touching pixels;
//! [`composite`] applies it.

use super::font::{CaptionFont, blend};
use super::wrap::wrap;
use crate::imaging::Rect;
use image::{Rgb, RgbImage};
use tracing::debug;

/// Visual parameters of the caption panel.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionStyle {
    /// Panel width as a fraction of the image width.
    pub width_ratio: f32,
    /// Gap between the panel and the right/bottom image edges.
    pub margin: u32,
    /// Gap between the panel border and the text.
    pub padding: u32,
    /// Panel opacity, 0 (invisible) to 255 (solid).
    pub opacity: u8,
    pub panel_color: Rgb<u8>,
    pub text_color: Rgb<u8>,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            width_ratio: 0.30,
            margin: 16,
            padding: 12,
            opacity: 192,
            panel_color: Rgb([0, 0, 0]),
            text_color: Rgb([255, 255, 255]),
        }
    }
}

/// Where the panel goes and which lines it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelLayout {
    pub panel: Rect,
    pub lines: Vec<String>,
    pub line_height: u32,
}

/// Compute the panel for `caption` on an image of `image_size`.
///
/// Returns `None` when there is nothing to draw: an empty caption, a panel
/// too narrow for its own padding, or an image too short for a single line.
/// Lines beyond the available height are dropped from the end.
pub fn layout_panel(
    image_size: (u32, u32),
    caption: &str,
    font: &dyn CaptionFont,
    style: &CaptionStyle,
) -> Option<PanelLayout> {
    if caption.trim().is_empty() {
        return None;
    }
    let (img_w, img_h) = image_size;

    let margins = style.margin.saturating_mul(2);
    let paddings = style.padding.saturating_mul(2);

    let box_w = ((img_w as f32 * style.width_ratio).round() as u32)
        .min(img_w.saturating_sub(margins));
    if box_w <= paddings {
        debug!(box_w, padding = style.padding, "Caption panel too narrow, skipping");
        return None;
    }
    let text_w = box_w - paddings;

    let line_height = font.line_height().max(1);
    let max_text_h = img_h.saturating_sub(margins).saturating_sub(paddings);
    let max_lines = (max_text_h / line_height) as usize;

    let mut lines = wrap(text_w as f32, caption, font);
    if lines.len() > max_lines {
        debug!(
            wrapped = lines.len(),
            kept = max_lines,
            "Caption taller than image, dropping lines"
        );
        lines.truncate(max_lines);
    }
    if lines.is_empty() {
        return None;
    }

    let box_h = lines.len() as u32 * line_height + paddings;
    Some(PanelLayout {
        panel: Rect {
            left: img_w - style.margin - box_w,
            top: img_h - style.margin - box_h,
            width: box_w,
            height: box_h,
        },
        lines,
        line_height,
    })
}

/// Draw `caption` onto `image` in a translucent panel.
///
/// Returns `false` when nothing was drawn (see [`layout_panel`]).
pub fn composite(
    image: &mut RgbImage,
    caption: &str,
    font: &dyn CaptionFont,
    style: &CaptionStyle,
) -> bool {
    let Some(layout) = layout_panel(image.dimensions(), caption, font, style) else {
        return false;
    };
    let panel = layout.panel;
    debug!(
        left = panel.left,
        top = panel.top,
        width = panel.width,
        height = panel.height,
        lines = layout.lines.len(),
        "Compositing caption"
    );

    let alpha = style.opacity as f32 / 255.0;
    for y in panel.top..panel.bottom() {
        for x in panel.left..panel.right() {
            let dst = image.get_pixel_mut(x, y);
            *dst = blend(style.panel_color, *dst, alpha);
        }
    }

    let text_x = (panel.left + style.padding) as i32;
    let mut text_y = (panel.top + style.padding) as i32;
    for line in &layout.lines {
        font.draw_line(image, text_x, text_y, style.text_color, line);
        text_y += layout.line_height as i32;
    }
    true
}
