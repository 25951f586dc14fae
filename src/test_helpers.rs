//! Shared test utilities for the apod-wallpaper test suite.
//!
//! Provides scripted network responses, a deterministic font, and synthetic
//! images/pages so unit tests never touch the network or system fonts.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let transport = Arc::new(
//!     ScriptedTransport::new()
//!         .respond(PAGE, Response::ok(apod_page("image/big.jpg", "A nebula.")))
//!         .respond(IMAGE, Response::ok(png_bytes(64, 48))),
//! );
//! let font = FixedWidthFont::new(6.0, 10);
//! ```

use image::{ImageFormat, Rgb, RgbImage};
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::Mutex;

use crate::caption::{CaptionFont, FontMetrics};
use crate::fetch::{Response, Transport, TransportError};

// =========================================================================
// Network
// =========================================================================

/// A [`Transport`] that replays queued outcomes per URL.
///
/// Outcomes are consumed in order; the final one repeats forever. Unknown
/// URLs answer 404. Every call is counted.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Result<Response, TransportError>>>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `url`.
    pub fn respond(self, url: &str, response: Response) -> Self {
        self.push(url, Ok(response))
    }

    /// Queue a connection-level failure for `url`.
    pub fn fail(self, url: &str, cause: &str) -> Self {
        self.push(url, Err(TransportError(cause.to_string())))
    }

    fn push(self, url: &str, outcome: Result<Response, TransportError>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    /// Number of GETs issued for `url` so far.
    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str) -> Result<Response, TransportError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;

        let mut scripts = self.scripts.lock().unwrap();
        let Some(queue) = scripts.get_mut(url) else {
            return Ok(Response::status(404));
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap_or(Ok(Response::status(404)))
        }
    }
}

// =========================================================================
// Fonts
// =========================================================================

/// Monospace stand-in for a real font: every char is `advance` wide and
/// drawn as a solid `advance x line_height` block (spaces are left blank).
pub struct FixedWidthFont {
    pub advance: f32,
    pub line_height: u32,
}

impl FixedWidthFont {
    pub fn new(advance: f32, line_height: u32) -> Self {
        Self {
            advance,
            line_height,
        }
    }
}

impl FontMetrics for FixedWidthFont {
    fn measure_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.advance
    }
}

impl CaptionFont for FixedWidthFont {
    fn line_height(&self) -> u32 {
        self.line_height
    }

    fn draw_line(&self, canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, text: &str) {
        let (width, height) = canvas.dimensions();
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let x0 = x + (i as f32 * self.advance) as i32;
            let x1 = x + ((i + 1) as f32 * self.advance) as i32;
            for py in y..y + self.line_height as i32 {
                for px in x0..x1 {
                    if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                        canvas.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
    }
}

// =========================================================================
// Images
// =========================================================================

/// Deterministic RGB gradient, distinct along both axes.
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

/// [`gradient_image`] encoded as PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    gradient_image(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

// =========================================================================
// Pages
// =========================================================================

/// A page shaped like the real site: title, preview image wrapped in a link
/// to `image_href`, credits, then the labelled caption.
///
/// `caption_html` is inserted verbatim and may contain markup.
pub fn apod_page(image_href: &str, caption_html: &str) -> String {
    format!(
        r##"<html>
<head>
<title> APOD: 2024 January 5 - Orion Deep Field
</title>
</head>
<body bgcolor="#F4F4FF" text="#000000">
<center>
<h1> Astronomy Picture of the Day </h1>
<p>
<a href="archivepix.html">Discover the cosmos!</a>
<p>
2024 January 5
<br>
<a href="{image_href}">
<img src="image/2401/Orion_1024.jpg" alt="See Explanation." style="max-width:100%"></a>
</center>
<center>
<b> Orion Deep Field </b> <br>
<b> Image Credit &amp; Copyright: </b> <a href="https://example.org/">Someone</a>
</center>
<p>
<b> Explanation: </b>
{caption_html}
<p>
<center>
<b> Tomorrow's picture: </b>outer space
</center>
</body>
</html>
"##
    )
}
