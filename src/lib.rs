//! # apod-wallpaper
//!
//! Turns NASA's Astronomy Picture of the Day into a desktop wallpaper of an
//! exact resolution, with the day's explanation drawn in a translucent panel.
//!
//! # Architecture: One Synchronous Pipeline
//!
//! Every entry point (the `fetch` command, the HTTP server) runs the same
//! pipeline:
//!
//! ```text
//! 1. Fetch    page URL   →  HTML              (retry + backoff)
//! 2. Parse    HTML       →  ImageReference    (image link + caption)
//! 3. Cache    image URL  →  raw bytes         (download once, keep forever)
//! 4. Layout   bytes      →  RGB8 at target    (cover crop or fit letterbox)
//! 5. Caption  RGB8       →  RGB8              (wrap + translucent panel)
//! ```
//!
//! Each stage is a plain function over owned data behind a small seam
//! ([`fetch::Transport`], [`cache::CacheStore`], [`caption::FontMetrics`]),
//! so tests run the whole pipeline without a network, a disk, or a system
//! font.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`fetch`] | HTTP GET with bounded exponential-backoff retry |
//! | [`page`] | Page addressing (latest / dated) and image + caption extraction |
//! | [`cache`] | URL-keyed raw byte cache with pluggable storage |
//! | [`imaging`] | Pure crop/letterbox geometry and the pixel operations applying it |
//! | [`caption`] | Greedy text wrapping and caption panel compositing |
//! | [`pipeline`] | Wires the stages together; built once from [`config`] |
//! | [`config`] | TOML config merged over stock defaults, validated |
//! | [`server`] | `GET /latest.png` over axum |
//! | [`desktop`] | Screen size detection and background setting via external commands |
//! | [`output`] | CLI run summary formatting |
//!
//! # Design Decisions
//!
//! ## Cache Raw Bytes, Not Results
//!
//! A published picture never changes, but the requested size, layout and
//! caption do. Caching the original download makes every re-render a local
//! operation while keeping one entry per picture. Entries are published by
//! rename, so the server's concurrent requests need no locking.
//!
//! ## Exact Output Dimensions
//!
//! Both layouts produce exactly the requested size. `cover` crops the
//! overflow; `fit` letterboxes onto black. The binding axis is chosen by
//! comparing aspect ratios, never by trying one axis and checking for
//! overflow, so bars are never negative.
//!
//! ## Failure Is Loud, Except Where It Can't Matter
//!
//! Network, page structure and decode failures end the run. Cache and font
//! problems only cost performance or the caption, so they are logged and the
//! wallpaper is still produced.

pub mod cache;
pub mod caption;
pub mod config;
pub mod desktop;
pub mod fetch;
pub mod imaging;
pub mod output;
pub mod page;
pub mod pipeline;
pub mod server;

#[cfg(test)]
pub(crate) mod test_helpers;
