//! CLI output formatting.
//!
//! `fetch` prints a short report after writing the wallpaper:
//!
//! ```text
//! Orion Deep Field
//!     Source: https://apod.nasa.gov/apod/image/2401/Orion_big.jpg (4256x2832)
//!     Output: wall.png (1920x1080, fit, captioned)
//!     Cache: 1 cached, 0 fetched
//! ```
//!
//! [`format_run_summary`] returns the lines (pure, testable);
//! [`print_run_summary`] writes them to stdout.

use crate::cache::CacheStats;
use crate::imaging::LayoutPolicy;
use crate::pipeline::Wallpaper;
use std::path::Path;

/// Longest caption excerpt shown when the page has no title.
const EXCERPT_CHARS: usize = 60;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Title line, falling back to a caption excerpt.
fn heading(wallpaper: &Wallpaper) -> String {
    match wallpaper.reference.title.as_deref() {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => truncate(&wallpaper.reference.caption, EXCERPT_CHARS),
    }
}

pub fn format_run_summary(
    wallpaper: &Wallpaper,
    output: &Path,
    layout: LayoutPolicy,
    stats: &CacheStats,
) -> Vec<String> {
    let (width, height) = wallpaper.image.dimensions();
    let caption = if wallpaper.captioned {
        ", captioned"
    } else {
        ""
    };
    vec![
        heading(wallpaper),
        format!(
            "{}Source: {} ({}x{})",
            indent(1),
            wallpaper.reference.url,
            wallpaper.source_width,
            wallpaper.source_height
        ),
        format!(
            "{}Output: {} ({width}x{height}, {layout}{caption})",
            indent(1),
            output.display()
        ),
        format!("{}Cache: {stats}", indent(1)),
    ]
}

pub fn print_run_summary(
    wallpaper: &Wallpaper,
    output: &Path,
    layout: LayoutPolicy,
    stats: &CacheStats,
) {
    for line in format_run_summary(wallpaper, output, layout, stats) {
        println!("{line}");
    }
}
