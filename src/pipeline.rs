//! End-to-end wallpaper production.
//!
//! ```text
//! PageSelector ─→ fetch page ─→ parse ─→ ImageReference
//!                                             │
//!                cache.get_or_decode(url) ←───┘
//!                                │
//!                             decode ─→ layout ─→ caption ─→ Wallpaper
//! ```
//!
//! A [`Pipeline`] is built once (from config, or by hand in tests) and run
//! any number of times. It is `Send + Sync`; the server shares one behind an
//! `Arc` and runs it on the blocking pool.

use crate::cache::{CacheStats, FsStore, ImageCache, MemoryStore};
use crate::caption::{CaptionFont, CaptionStyle, RustTypeFont, composite};
use crate::config::AppConfig;
use crate::fetch::{FetchError, Fetcher, HttpTransport, TransportError};
use crate::imaging::{self, ImagingError, TargetSpec};
use crate::page::{self, ImageReference, PageSelector, ParseError};
use image::RgbImage;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Page parse failed: {0}")]
    Parse(#[from] ParseError),
    #[error("Image error: {0}")]
    Imaging(#[from] ImagingError),
    #[error("HTTP client setup failed: {0}")]
    Client(#[from] TransportError),
}

impl PipelineError {
    /// True when the failure came from the remote site (unreachable, bad
    /// page, undecodable image) rather than from this process.
    pub fn is_upstream(&self) -> bool {
        match self {
            Self::Fetch(_) | Self::Parse(_) => true,
            Self::Imaging(e) => matches!(e, ImagingError::Decode(_)),
            Self::Client(_) => false,
        }
    }
}

/// One rendering job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderRequest {
    pub page: PageSelector,
    pub target: TargetSpec,
    /// Draw the caption panel (when a caption font is available).
    pub caption: bool,
}

/// A finished wallpaper and where it came from.
#[derive(Debug, Clone)]
pub struct Wallpaper {
    /// Exactly `target.width x target.height`.
    pub image: RgbImage,
    pub reference: ImageReference,
    pub source_width: u32,
    pub source_height: u32,
    /// Whether a caption panel was drawn.
    pub captioned: bool,
}

pub struct Pipeline {
    fetcher: Fetcher,
    cache: ImageCache,
    page_base: String,
    caption: Option<(Arc<dyn CaptionFont>, CaptionStyle)>,
}

impl Pipeline {
    /// A pipeline without caption support; see [`with_caption`](Self::with_caption).
    pub fn new(fetcher: Fetcher, cache: ImageCache, page_base: impl Into<String>) -> Self {
        Self {
            fetcher,
            cache,
            page_base: page_base.into(),
            caption: None,
        }
    }

    pub fn with_caption(mut self, font: Arc<dyn CaptionFont>, style: CaptionStyle) -> Self {
        self.caption = Some((font, style));
        self
    }

    /// Build the production pipeline.
    ///
    /// A cache directory that cannot be created falls back to an in-memory
    /// cache, and a font that cannot be loaded disables captions; both only
    /// warn. Only a failure to build the HTTP client is an error.
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let transport = HttpTransport::new(config.fetch.timeout(), &config.fetch.user_agent)?;
        let fetcher = Fetcher::new(Arc::new(transport), config.fetch.retry_policy());

        let cache_dir = config.cache.resolved_dir();
        let cache = match FsStore::new(&cache_dir) {
            Ok(store) => {
                debug!(dir = %cache_dir.display(), "Using disk cache");
                ImageCache::new(Arc::new(store))
            }
            Err(e) => {
                warn!(error = %e, "Cache directory unavailable, caching in memory");
                ImageCache::new(Arc::new(MemoryStore::new()))
            }
        };

        let mut pipeline = Self::new(fetcher, cache, config.source.page_url.clone());
        if config.caption.enabled {
            match RustTypeFont::from_file(&config.caption.font_path, config.caption.font_size) {
                Ok(font) => {
                    pipeline = pipeline.with_caption(Arc::new(font), config.caption.style());
                }
                Err(e) => warn!(error = %e, "Caption font unavailable, captions disabled"),
            }
        }
        Ok(pipeline)
    }

    pub fn has_caption_font(&self) -> bool {
        self.caption.is_some()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Locate the page's picture without downloading the image itself.
    pub fn resolve(&self, selector: PageSelector) -> Result<ImageReference, PipelineError> {
        let page_url = selector.page_url(&self.page_base)?;
        let html = self.fetcher.fetch_text(page_url.as_str())?;
        let reference = page::parse(&html, page_url.as_str())?;
        info!(
            page = %selector,
            title = reference.title.as_deref().unwrap_or("untitled"),
            url = %reference.url,
            "Found picture"
        );
        Ok(reference)
    }

    pub fn run(&self, request: &RenderRequest) -> Result<Wallpaper, PipelineError> {
        let reference = self.resolve(request.page)?;

        // Only bytes that decode are cached; an error page served with 200
        // must not stick.
        let source = self.cache.get_or_decode(
            &reference.url,
            |url| Ok::<_, PipelineError>(self.fetcher.fetch(url)?),
            |bytes| Ok(imaging::decode(bytes)?),
        )?;
        let (source_width, source_height) = source.dimensions();

        let mut image = imaging::apply_layout(&source, &request.target);
        drop(source);

        let captioned = match (&self.caption, request.caption) {
            (Some((font, style)), true) => {
                composite(&mut image, &reference.caption, &**font, style)
            }
            _ => false,
        };

        debug!(
            width = image.width(),
            height = image.height(),
            layout = %request.target.layout,
            captioned,
            "Rendered wallpaper"
        );
        Ok(Wallpaper {
            image,
            reference,
            source_width,
            source_height,
            captioned,
        })
    }

    /// [`run`](Self::run), then encode as PNG.
    pub fn render_png(&self, request: &RenderRequest) -> Result<Vec<u8>, PipelineError> {
        let wallpaper = self.run(request)?;
        Ok(imaging::encode_png(&wallpaper.image)?)
    }
}
