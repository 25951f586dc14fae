//! Raw image byte cache keyed by source URL.
//!
//! Original images are large and never change once published, so the
//! pipeline keeps the downloaded bytes and skips the network on later runs.
//! Decoded or resized images are never cached: layout and caption settings
//! change per request, the source does not.
//!
//! # Design
//!
//! ## Cache keys
//!
//! The key is a pure function of the URL: SHA-256 of the URL string as
//! lowercase hex (64 chars). The key function is a constructor parameter so
//! tests can use readable keys.
//!
//! ## Storage
//!
//! Storage goes through the [`CacheStore`] trait:
//!
//! | Store | Use |
//! |---|---|
//! | [`FsStore`] | one `<key>.cache` file per entry in a directory |
//! | [`MemoryStore`] | tests and throwaway runs |
//!
//! [`FsStore`] writes into a temp file in the cache directory and renames it
//! into place, so a `<key>.cache` file that exists is always complete and
//! concurrent writers of the same key are harmless. Nothing is ever evicted.
//!
//! ## Failure handling
//!
//! The cache never fails a run. A store that cannot be read counts as a
//! miss, and bytes that cannot be persisted are still returned; both are
//! logged at warn.
//!
//! [`ImageCache::get_or_decode`] only persists bytes its decoder accepts,
//! so an error page served with status 200 is never kept.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

/// File extension of cache entries.
const ENTRY_EXTENSION: &str = "cache";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}

/// SHA-256 of the URL, returned as a hex string.
pub fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Default cache directory: `<system temp dir>/apod-wallpaper`.
pub fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("apod-wallpaper")
}

/// Byte storage behind [`ImageCache`].
pub trait CacheStore: Send + Sync {
    /// `Ok(None)` when the key is absent; `Err` only for real failures.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError>;
}

// =========================================================================
// Filesystem store
// =========================================================================

/// Directory of `<key>.cache` files.
#[derive(Debug, Clone)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    /// Use `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| CacheError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXTENSION}"))
    }

    fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CacheError + '_ {
        move |source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl CacheStore for FsStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.entry_path(key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(&path)(e)),
        }
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(Self::io_error(&self.dir))?;
        tmp.write_all(bytes).map_err(Self::io_error(tmp.path()))?;
        tmp.flush().map_err(Self::io_error(&path))?;
        tmp.persist(&path)
            .map_err(|e| Self::io_error(&path)(e.error))?;
        debug!(path = %path.display(), size = bytes.len(), "Stored cache entry");
        Ok(())
    }
}

// =========================================================================
// In-memory store
// =========================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Unavailable("memory store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Unavailable("memory store lock poisoned".into()))?;
        entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

// =========================================================================
// Cache front
// =========================================================================

/// Get-or-fetch front over a [`CacheStore`], counting hits and misses.
pub struct ImageCache {
    store: Arc<dyn CacheStore>,
    key_fn: fn(&str) -> String,
    hits: AtomicU32,
    misses: AtomicU32,
}

impl ImageCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            key_fn: cache_key,
            hits: AtomicU32::new(0),
            misses: AtomicU32::new(0),
        }
    }

    /// Replace the URL-to-key function.
    pub fn with_key_fn(mut self, key_fn: fn(&str) -> String) -> Self {
        self.key_fn = key_fn;
        self
    }

    pub fn key(&self, url: &str) -> String {
        (self.key_fn)(url)
    }

    /// Return cached bytes for `url`, or call `fetch` and remember its result.
    ///
    /// Only `fetch` errors propagate; cache failures are logged and absorbed.
    pub fn get_or_fetch<E, F>(&self, url: &str, fetch: F) -> Result<Vec<u8>, E>
    where
        F: FnOnce(&str) -> Result<Vec<u8>, E>,
        E: fmt::Display,
    {
        self.get_or_decode(url, fetch, |bytes| Ok(bytes.to_vec()))
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch), but only bytes that `decode`
    /// accepts are ever stored.
    ///
    /// A cached entry that no longer decodes is logged and replaced by a
    /// fresh download. A download that does not decode returns the decode
    /// error and leaves the store untouched.
    pub fn get_or_decode<T, E, F, D>(&self, url: &str, fetch: F, decode: D) -> Result<T, E>
    where
        F: FnOnce(&str) -> Result<Vec<u8>, E>,
        D: Fn(&[u8]) -> Result<T, E>,
        E: fmt::Display,
    {
        let key = self.key(url);
        match self.store.load(&key) {
            Ok(Some(bytes)) => match decode(&bytes) {
                Ok(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(url, key = %key, size = bytes.len(), "Cache hit");
                    return Ok(value);
                }
                Err(e) => warn!(url, key = %key, error = %e, "Cached entry unusable, refetching"),
            },
            Ok(None) => debug!(url, key = %key, "Cache miss"),
            Err(e) => warn!(url, key = %key, error = %e, "Cache read failed, fetching"),
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let bytes = fetch(url)?;
        let value = decode(&bytes)?;
        if let Err(e) = self.store.store(&key, &bytes) {
            warn!(url, key = %key, error = %e, "Cache write failed, continuing");
        }
        Ok(value)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of cache activity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cached, {} fetched", self.hits, self.misses)
    }
}
