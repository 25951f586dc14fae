//! APOD page discovery and parsing.
//!
//! The site's markup has been stable for decades and this module depends on
//! exactly two features of it:
//!
//! 1. The picture is shown as a preview `<img>` wrapped in an `<a href>` that
//!    points at the full-resolution original.
//! 2. The caption follows a bolded `Explanation:` label inside the same block.
//!
//! Anything else about the page is ignored. If either feature is missing the
//! page is rejected with a [`ParseError`]; video days (an `<iframe>` instead
//! of an image) fail this way too.
//!
//! Pages are addressed by [`PageSelector`]: the front page for the latest
//! picture, or `apYYMMDD.html` for a historical date.

use chrono::NaiveDate;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("static selector"));
static BOLD_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("b").expect("static selector"));
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("static selector"));

/// The fixed label preceding every caption.
const CAPTION_LABEL: &str = "Explanation:";

/// The first picture ever published; earlier dates have no page.
pub const FIRST_APOD: NaiveDate = match NaiveDate::from_ymd_opt(1995, 6, 16) {
    Some(date) => date,
    None => panic!("valid date"),
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no image link found")]
    NoImageLink,
    #[error("no \"{CAPTION_LABEL}\" caption found")]
    NoCaption,
    #[error("invalid image URL '{href}': {reason}")]
    InvalidImageUrl { href: String, reason: String },
    #[error("invalid page URL '{url}': {reason}")]
    InvalidPageUrl { url: String, reason: String },
}

/// Which day's page to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSelector {
    #[default]
    Latest,
    Date(NaiveDate),
}

impl PageSelector {
    /// Absolute URL of the page, relative to the site's base (the directory
    /// that serves the front page).
    pub fn page_url(&self, base: &str) -> Result<Url, ParseError> {
        let invalid = |reason: String| ParseError::InvalidPageUrl {
            url: base.to_string(),
            reason,
        };
        let base = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
        match self {
            Self::Latest => Ok(base),
            Self::Date(date) => base
                .join(&date.format("ap%y%m%d.html").to_string())
                .map_err(|e| invalid(e.to_string())),
        }
    }
}

impl fmt::Display for PageSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl FromStr for PageSelector {
    type Err = String;

    /// `latest` or a `YYYY-MM-DD` date no earlier than [`FIRST_APOD`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| format!("invalid date '{s}' (expected YYYY-MM-DD or 'latest'): {e}"))?;
        if date < FIRST_APOD {
            return Err(format!(
                "no picture before {} (got {s})",
                FIRST_APOD.format("%Y-%m-%d")
            ));
        }
        Ok(Self::Date(date))
    }
}

/// What a page yields: where the original image lives and what it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Absolute URL of the full-resolution image.
    pub url: String,
    /// Caption text, whitespace-normalized, without the label.
    pub caption: String,
    /// Picture title from `<title>`, when present.
    pub title: Option<String>,
}

/// Extract the image link and caption from an APOD page.
///
/// `base_url` is the URL the page was fetched from; relative links resolve
/// against it.
pub fn parse(html: &str, base_url: &str) -> Result<ImageReference, ParseError> {
    let document = Html::parse_document(html);

    let href = find_image_link(&document).ok_or(ParseError::NoImageLink)?;
    let url = resolve(href, base_url)?;
    let caption = find_caption(&document).ok_or(ParseError::NoCaption)?;
    let title = find_title(&document);

    debug!(url = %url, title = ?title, caption_len = caption.len(), "Parsed page");
    Ok(ImageReference {
        url,
        caption,
        title,
    })
}

/// `href` of the first `<img>` (document order) whose parent is `<a href>`.
fn find_image_link(document: &Html) -> Option<&str> {
    document.select(&IMG_SELECTOR).find_map(|img| {
        let parent = img.parent().and_then(ElementRef::wrap)?;
        if parent.value().name() != "a" {
            return None;
        }
        parent.value().attr("href")
    })
}

fn resolve(href: &str, base_url: &str) -> Result<String, ParseError> {
    let invalid = |reason: &str| ParseError::InvalidImageUrl {
        href: href.to_string(),
        reason: reason.to_string(),
    };
    let href = href.trim();
    if href.is_empty() {
        return Err(invalid("empty href"));
    }
    let base = Url::parse(base_url).map_err(|e| invalid(&format!("bad base URL: {e}")))?;
    let url = base.join(href).map_err(|e| invalid(&e.to_string()))?;
    Ok(url.to_string())
}

/// Text of the block enclosing the bolded label, label stripped.
fn find_caption(document: &Html) -> Option<String> {
    let label = document
        .select(&BOLD_SELECTOR)
        .find(|b| collapse_whitespace(&b.text().collect::<String>()) == CAPTION_LABEL)?;
    let block = label.parent().and_then(ElementRef::wrap)?;
    let text = collapse_whitespace(&block.text().collect::<String>());
    let caption = match text.find(CAPTION_LABEL) {
        Some(at) => &text[at + CAPTION_LABEL.len()..],
        None => text.as_str(),
    };
    Some(caption.trim_start().to_string())
}

/// `<title>` with the `APOD: <date> - ` prefix removed.
fn find_title(document: &Html) -> Option<String> {
    let raw = document.select(&TITLE_SELECTOR).next()?.text().collect::<String>();
    let title = collapse_whitespace(&raw);
    let title = match title.split_once(" - ") {
        Some((prefix, rest)) if prefix.starts_with("APOD") => rest.trim().to_string(),
        _ => title,
    };
    (!title.is_empty()).then_some(title)
}

/// Collapse every whitespace run to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
