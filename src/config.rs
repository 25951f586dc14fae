//! Application configuration.
//!
//! Handles loading, validating, and merging the TOML config file. Stock
//! defaults are the base layer; a user file (passed with `--config`) only
//! needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [source]
//! page_url = "https://apod.nasa.gov/apod/"  # Front page; dated pages live beside it
//!
//! [fetch]
//! max_retries = 5           # Retries after the first attempt
//! backoff_base_ms = 1000    # Delay before the first retry, doubled each time
//! timeout_secs = 30         # Per-request timeout
//! user_agent = "apod-wallpaper/<version>"
//!
//! [cache]
//! # dir = "/var/cache/apod"  # Default: <system temp dir>/apod-wallpaper
//!
//! [output]
//! width = 1920              # Default target size for server requests
//! height = 1080
//! max_dimension = 3840      # Largest width/height a server request may ask for
//! layout = "fit"            # "fit" (letterbox) or "cover" (crop)
//!
//! [caption]
//! enabled = true
//! font_path = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"
//! font_size = 18.0          # Pixels
//! width_percent = 30        # Panel width as a share of the image width
//! margin = 16               # Panel inset from the bottom-right corner
//! padding = 12              # Text inset inside the panel
//! opacity = 192             # Panel opacity, 0-255
//!
//! [server]
//! listen = "127.0.0.1:8080"
//! request_timeout_secs = 120
//!
//! [desktop]
//! set_command = ["feh", "--bg-max", "{path}"]  # {path} = absolute output path
//! resolution_command = ["xdpyinfo"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::caption::CaptionStyle;
use crate::fetch::{DEFAULT_RETRYABLE_STATUSES, RetryPolicy};
use crate::imaging::LayoutPolicy;
use image::Rgb;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application configuration.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Where pictures come from.
    pub source: SourceConfig,
    /// HTTP retry and timeout settings.
    pub fetch: FetchConfig,
    /// Raw image cache location.
    pub cache: CacheConfig,
    /// Target size and layout defaults.
    pub output: OutputConfig,
    /// Caption panel appearance.
    pub caption: CaptionConfig,
    /// `serve` command settings.
    pub server: ServerConfig,
    /// Desktop integration commands.
    pub desktop: DesktopConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        reqwest::Url::parse(&self.source.page_url).map_err(|e| {
            ConfigError::Validation(format!(
                "source.page_url '{}' is not a URL: {e}",
                self.source.page_url
            ))
        })?;
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fetch.timeout_secs must be positive".into(),
            ));
        }
        if self.output.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "output.max_dimension must be positive".into(),
            ));
        }
        for (name, value) in [("width", self.output.width), ("height", self.output.height)] {
            if value == 0 || value > self.output.max_dimension {
                return Err(ConfigError::Validation(format!(
                    "output.{name} must be 1-{}",
                    self.output.max_dimension
                )));
            }
        }
        if !(self.caption.font_size > 0.0) {
            return Err(ConfigError::Validation(
                "caption.font_size must be positive".into(),
            ));
        }
        if self.caption.width_percent == 0 || self.caption.width_percent > 100 {
            return Err(ConfigError::Validation(
                "caption.width_percent must be 1-100".into(),
            ));
        }
        self.server.listen.parse::<SocketAddr>().map_err(|e| {
            ConfigError::Validation(format!(
                "server.listen '{}' is not a socket address: {e}",
                self.server.listen
            ))
        })?;
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "server.request_timeout_secs must be positive".into(),
            ));
        }
        if self.desktop.set_command.is_empty() {
            return Err(ConfigError::Validation(
                "desktop.set_command must not be empty".into(),
            ));
        }
        if self.desktop.resolution_command.is_empty() {
            return Err(ConfigError::Validation(
                "desktop.resolution_command must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Front page URL; dated pages are resolved relative to it.
    pub page_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            page_url: "https://apod.nasa.gov/apod/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_base_ms: 1000,
            timeout_secs: 30,
            user_agent: concat!("apod-wallpaper/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Cache directory. `None` means the system temp dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl CacheConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(crate::cache::default_cache_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub width: u32,
    pub height: u32,
    pub max_dimension: u32,
    pub layout: LayoutPolicy,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            max_dimension: 3840,
            layout: LayoutPolicy::Fit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionConfig {
    pub enabled: bool,
    pub font_path: PathBuf,
    pub font_size: f32,
    pub width_percent: u32,
    pub margin: u32,
    pub padding: u32,
    pub opacity: u8,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            font_path: PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
            font_size: 18.0,
            width_percent: 30,
            margin: 16,
            padding: 12,
            opacity: 192,
        }
    }
}

impl CaptionConfig {
    pub fn style(&self) -> CaptionStyle {
        CaptionStyle {
            width_ratio: self.width_percent as f32 / 100.0,
            margin: self.margin,
            padding: self.padding,
            opacity: self.opacity,
            panel_color: Rgb([0, 0, 0]),
            text_color: Rgb([255, 255, 255]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub listen: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DesktopConfig {
    /// Background setter argv; `{path}` is replaced by the image path.
    pub set_command: Vec<String>,
    /// Command whose output contains `dimensions: WxH pixels`.
    pub resolution_command: Vec<String>,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            set_command: vec!["feh".into(), "--bg-max".into(), "{path}".into()],
            resolution_command: vec!["xdpyinfo".into()],
        }
    }
}

/// Parse a requested width or height.
///
/// `None` yields `default`. Anything other than an integer in `1..=max` is a
/// validation error.
pub fn parse_dimension(
    name: &str,
    raw: Option<&str>,
    default: u32,
    max: u32,
) -> Result<u32, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value: u32 = raw.trim().parse().map_err(|_| {
        ConfigError::Validation(format!("{name} must be an integer, got '{raw}'"))
    })?;
    if value == 0 || value > max {
        return Err(ConfigError::Validation(format!(
            "{name} must be 1-{max}, got {value}"
        )));
    }
    Ok(value)
}

/// Check a CLI output size.
///
/// Only zero is rejected. `output.max_dimension` bounds what HTTP clients may
/// ask for; a local screen (or several side by side) can be larger.
pub fn check_output_size(width: u32, height: u32) -> Result<(u32, u32), ConfigError> {
    for (name, value) in [("width", width), ("height", height)] {
        if value == 0 {
            return Err(ConfigError::Validation(format!("{name} must be positive")));
        }
    }
    Ok((width, height))
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config: stock defaults, overridden by `path` if given.
///
/// An explicitly named file that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = path.map(load_raw_config).transpose()?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# apod-wallpaper configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Pass this file with: apod-wallpaper --config <file> <command>
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Picture source
# ---------------------------------------------------------------------------
[source]
# Front page of the archive. Dated pages (apYYMMDD.html) are resolved
# relative to this URL.
page_url = "https://apod.nasa.gov/apod/"

# ---------------------------------------------------------------------------
# Network
# ---------------------------------------------------------------------------
[fetch]
# Retries after the first attempt for timeouts, connection failures and
# HTTP 413, 429, 500, 502, 503, 504. Other errors fail immediately.
max_retries = 5
# Delay before the first retry in milliseconds; doubles on each retry.
backoff_base_ms = 1000
# Per-request timeout in seconds.
timeout_secs = 30
# User-Agent header sent with every request.
# user_agent = "apod-wallpaper/<version>"

# ---------------------------------------------------------------------------
# Raw image cache
# ---------------------------------------------------------------------------
[cache]
# Directory for downloaded originals (<sha256-of-url>.cache). Entries are
# never evicted; delete the directory to reclaim space.
# Default: <system temp dir>/apod-wallpaper
# dir = "/var/cache/apod-wallpaper"

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Default target size. The CLI detects the screen size when -W/-H are not
# given; the server uses these when the query omits them.
width = 1920
height = 1080
# Largest width or height a server request may ask for. The CLI renders
# any positive size.
max_dimension = 3840
# "fit"   - scale to fit, black bars on the free axis (nothing cropped)
# "cover" - scale to fill, centered crop of the overflow
layout = "fit"

# ---------------------------------------------------------------------------
# Caption panel
# ---------------------------------------------------------------------------
[caption]
# Draw the picture's explanation in a translucent panel.
enabled = true
# TrueType font used for the caption. If it cannot be loaded the caption
# is skipped with a warning.
font_path = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"
# Font size in pixels.
font_size = 18.0
# Panel width as a percentage of the image width (1-100).
width_percent = 30
# Panel inset from the bottom-right corner, in pixels.
margin = 16
# Text inset inside the panel, in pixels.
padding = 12
# Panel opacity: 0 = invisible, 255 = solid black.
opacity = 192

# ---------------------------------------------------------------------------
# HTTP server (apod-wallpaper serve)
# ---------------------------------------------------------------------------
[server]
listen = "127.0.0.1:8080"
# Requests taking longer than this answer 504.
request_timeout_secs = 120

# ---------------------------------------------------------------------------
# Desktop integration (apod-wallpaper fetch --set-background)
# ---------------------------------------------------------------------------
[desktop]
# Command that sets the background; {path} is the absolute image path.
set_command = ["feh", "--bg-max", "{path}"]
# Command printing "dimensions: WxH pixels", used when -W/-H are omitted.
resolution_command = ["xdpyinfo"]
"##
}
