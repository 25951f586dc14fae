//! HTTP retrieval with bounded retry and exponential backoff.
//!
//! Two seams keep this testable without a network:
//!
//! - [`Transport`] performs a single GET. [`HttpTransport`] is the
//!   production implementation (blocking `reqwest`); tests script responses.
//! - [`RetryPolicy`] wraps *any* single-attempt call and decides whether to
//!   try again. It knows nothing about HTTP clients.
//!
//! ## Retry rules
//!
//! | Outcome | Action |
//! |---|---|
//! | 2xx | success, body returned |
//! | status in `retryable_statuses` (413, 429, 500, 502, 503, 504) | retry |
//! | transport failure (timeout, reset, DNS) | retry |
//! | any other status | fail immediately |
//!
//! Retry *n* (1-based) sleeps `backoff_base * 2^(n-1)` first. After
//! `max_retries` retries the last status or cause is reported in
//! [`FetchError`].

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Statuses treated as transient.
pub const DEFAULT_RETRYABLE_STATUSES: &[u16] = &[413, 429, 500, 502, 503, 504];

/// What went wrong on the final attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    Status(u16),
    Transport(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {code}"),
            Self::Transport(cause) => f.write_str(cause),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("GET {url} failed after {attempts} attempt(s): {last}")]
pub struct FetchError {
    pub url: String,
    pub attempts: u32,
    pub last: FetchFailure,
}

/// Connection-level failure reported by a [`Transport`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Outcome of a single GET that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A single-attempt HTTP GET.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<Response, TransportError>;
}

/// Production transport backed by a blocking `reqwest` client.
///
/// Must not be created or dropped inside an async context; the server runs
/// the pipeline on tokio's blocking pool.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Response, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Ok(Response::status(status));
        }
        let body = response
            .bytes()
            .map_err(|e| TransportError(format!("reading body: {e}")))?;
        Ok(Response {
            status,
            body: body.to_vec(),
        })
    }
}

/// Bounded exponential-backoff retry, independent of any HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (so `max_retries + 1` attempts total).
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each further retry.
    pub backoff_base: Duration,
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_base: Duration::from_secs(1),
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.backoff_base.saturating_mul(factor)
    }

    pub fn is_retryable(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Run `attempt` until it succeeds, fails permanently, or retries run out.
    pub fn run<F>(&self, url: &str, mut attempt: F) -> Result<Vec<u8>, FetchError>
    where
        F: FnMut() -> Result<Response, TransportError>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let failure = match attempt() {
                Ok(response) if response.is_success() => return Ok(response.body),
                Ok(response) if !self.is_retryable(response.status) => {
                    return Err(FetchError {
                        url: url.to_string(),
                        attempts,
                        last: FetchFailure::Status(response.status),
                    });
                }
                Ok(response) => FetchFailure::Status(response.status),
                Err(TransportError(cause)) => FetchFailure::Transport(cause),
            };

            if attempts > self.max_retries {
                return Err(FetchError {
                    url: url.to_string(),
                    attempts,
                    last: failure,
                });
            }

            let delay = self.backoff(attempts);
            warn!(
                url,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                failure = %failure,
                "Transient fetch failure, retrying"
            );
            thread::sleep(delay);
        }
    }
}

/// Retrying GET client used by the pipeline.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(url, "Fetching");
        let body = self.policy.run(url, || self.transport.get(url))?;
        debug!(url, bytes = body.len(), "Fetched");
        Ok(body)
    }

    /// Fetch and decode as text, replacing invalid UTF-8.
    pub fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let body = self.fetch(url)?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
