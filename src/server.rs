//! HTTP endpoint serving freshly rendered wallpapers.
//!
//! | Route | Response |
//! |---|---|
//! | `GET /latest.png?width=&height=&layout=&caption=` | `image/png` of exactly the requested size |
//! | `GET /healthz` | `ok` |
//!
//! Omitted query parameters fall back to the `[output]` config section.
//!
//! ## Status codes
//!
//! | Status | Cause |
//! |---|---|
//! | 400 | width/height not an integer in `1..=max_dimension`, unknown layout |
//! | 502 | the site is unreachable, its page has no picture, or the image is undecodable |
//! | 500 | anything else going wrong locally |
//! | 504 | rendering took longer than `server.request_timeout_secs` |
//!
//! Error bodies are JSON: `{"status": 502, "code": "upstream", "message": "..."}`.
//!
//! Each request runs the whole synchronous pipeline on tokio's blocking
//! pool. Requests share nothing but the [`Pipeline`] (and through it, the
//! cache directory).

use crate::config::{AppConfig, OutputConfig, parse_dimension};
use crate::imaging::{LayoutPolicy, TargetSpec};
use crate::page::PageSelector;
use crate::pipeline::{Pipeline, PipelineError, RenderRequest};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("invalid listen address '{0}'")]
    Address(String),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared per-server state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub defaults: OutputConfig,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, config: &AppConfig) -> Self {
        Self {
            pipeline,
            defaults: config.output.clone(),
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct ErrorBody {
    pub status: u16,
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "upstream", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, "timeout", message)
    }

    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        if e.is_upstream() {
            Self::bad_gateway(e.to_string())
        } else {
            Self::internal(e.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: self.status.as_u16(),
            code: self.code.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Raw query; values stay strings so bad input gets our 400 body.
#[derive(Debug, Default, Deserialize)]
pub struct WallpaperQuery {
    pub width: Option<String>,
    pub height: Option<String>,
    pub layout: Option<String>,
    pub caption: Option<String>,
}

/// Validate a query against the output defaults and limits.
pub fn render_request(
    query: &WallpaperQuery,
    defaults: &OutputConfig,
) -> Result<RenderRequest, ApiError> {
    let max = defaults.max_dimension;
    let width = parse_dimension("width", query.width.as_deref(), defaults.width, max)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let height = parse_dimension("height", query.height.as_deref(), defaults.height, max)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let layout = match query.layout.as_deref() {
        Some(raw) => raw.parse::<LayoutPolicy>().map_err(ApiError::bad_request)?,
        None => defaults.layout,
    };
    let caption = match query.caption.as_deref().map(str::trim) {
        None | Some("1" | "true" | "yes") => true,
        Some("0" | "false" | "no") => false,
        Some(other) => {
            return Err(ApiError::bad_request(format!(
                "caption must be true or false, got '{other}'"
            )));
        }
    };
    Ok(RenderRequest {
        page: PageSelector::Latest,
        target: TargetSpec::new(width, height, layout),
        caption,
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/latest.png", get(latest_png))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn latest_png(
    State(state): State<AppState>,
    Query(query): Query<WallpaperQuery>,
) -> Result<Response, ApiError> {
    let request = render_request(&query, &state.defaults)?;
    let started = Instant::now();

    let pipeline = state.pipeline.clone();
    let task = tokio::task::spawn_blocking(move || pipeline.render_png(&request));
    let png = match tokio::time::timeout(state.request_timeout, task).await {
        Ok(Ok(Ok(png))) => png,
        Ok(Ok(Err(e))) => {
            warn!(error = %e, "Render failed");
            return Err(e.into());
        }
        Ok(Err(join)) => {
            error!(error = %join, "Render task aborted");
            return Err(ApiError::internal("render task aborted"));
        }
        Err(_) => {
            warn!(timeout_secs = state.request_timeout.as_secs(), "Render timed out");
            return Err(ApiError::gateway_timeout(format!(
                "rendering took longer than {}s",
                state.request_timeout.as_secs()
            )));
        }
    };

    info!(
        width = request.target.width,
        height = request.target.height,
        layout = %request.target.layout,
        bytes = png.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Served wallpaper"
    );
    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        ],
        png,
    )
        .into_response())
}

// =============================================================================
// Serving
// =============================================================================

/// Bind `listen` and serve until Ctrl-C.
pub async fn serve(listen: &str, state: AppState) -> Result<(), ServerError> {
    let addr: SocketAddr = listen
        .parse()
        .map_err(|_| ServerError::Address(listen.to_string()))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(addr = %addr, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
