//! External capabilities the engine depends on.
//!
//! - [`ManifestSource`] retrieves the current tool catalog.
//! - [`Fetcher`] downloads an archive and unpacks it into a directory.
//!
//! [`http`] implements both over HTTP, [`file::FileSource`] reads catalogs
//! from a local directory.
//!
//! # Testing
//!
//! Use [`StaticSource`] and [`MockFetcher`] for testing without network
//! access:
//!
//! ```
//! use ninjakit::backend::{Fetcher, ManifestSource, MockFetcher, StaticSource};
//!
//! let source = StaticSource::new(r#"{"list": []}"#);
//! assert!(source.load().unwrap().is_some());
//!
//! let fetcher = MockFetcher::new();
//! assert_eq!(fetcher.fetch_count(), 0);
//! ```

pub mod file;
pub mod http;

use crate::archive;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Source of the tool catalog.
pub trait ManifestSource: Send + Sync {
    /// Identifier of the catalog at the download service.
    fn id(&self) -> &str;

    /// Load the raw catalog payload.
    ///
    /// Returns `None` when the service has no catalog (yet).
    fn load(&self) -> Result<Option<String>>;
}

/// Downloads an archive and unpacks it.
pub trait Fetcher: Send + Sync {
    /// Make `dest` hold the unpacked content of `url`.
    ///
    /// Returns `false` when the fetcher decided nothing had to be done.
    ///
    /// # Errors
    ///
    /// Returns `Error::TransferFailed` if the download or unpacking fails.
    fn fetch_and_unpack(&self, url: &str, dest: &Path) -> Result<bool>;
}

/// In-memory catalog, replaceable at runtime.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    payload: Arc<Mutex<Option<String>>>,
}

impl StaticSource {
    /// Create a source serving `payload`.
    #[must_use]
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: Arc::new(Mutex::new(Some(payload.into()))),
        }
    }

    /// Create a source without a catalog.
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    /// Replace the served payload.
    pub fn set_payload(&self, payload: impl Into<String>) {
        *self.payload.lock().unwrap_or_else(PoisonError::into_inner) = Some(payload.into());
    }
}

impl ManifestSource for StaticSource {
    fn id(&self) -> &str {
        "static"
    }

    fn load(&self) -> Result<Option<String>> {
        Ok(self
            .payload
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

/// Fetcher serving in-memory archives.
///
/// Archives are registered per URL; fetching an unknown URL fails like a
/// broken download would. Every fetch is counted.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    archives: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fetches: Arc<AtomicUsize>,
}

impl MockFetcher {
    /// Create a new empty mock fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `data` for `url`.
    pub fn add_archive(&self, url: impl Into<String>, data: Vec<u8>) {
        self.archives
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), data);
    }

    /// Number of fetches performed so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Fetcher for MockFetcher {
    fn fetch_and_unpack(&self, url: &str, dest: &Path) -> Result<bool> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let data = self
            .archives
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
            .ok_or_else(|| Error::transfer(url, "HTTP 404"))?;

        archive::unpack(&data, dest).map_err(|e| Error::transfer(url, e))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::zipped;
    use tempfile::TempDir;

    #[test]
    fn test_static_source() {
        let source = StaticSource::new("{}");
        assert_eq!(source.load().unwrap().as_deref(), Some("{}"));

        source.set_payload(r#"{"list": []}"#);
        assert_eq!(source.load().unwrap().as_deref(), Some(r#"{"list": []}"#));
    }

    #[test]
    fn test_static_source_absent() {
        let source = StaticSource::absent();
        assert_eq!(source.load().unwrap(), None);
    }

    #[test]
    fn test_mock_fetcher_unpacks() {
        let root = TempDir::new().unwrap();
        let dest = root.path().join("ninja");
        let fetcher = MockFetcher::new();
        fetcher.add_archive("mock://ninja.zip", zipped(&[("ninja", "bin")]));

        assert!(fetcher.fetch_and_unpack("mock://ninja.zip", &dest).unwrap());

        assert!(dest.join("ninja").is_file());
        assert_eq!(fetcher.fetch_count(), 1);
    }

    #[test]
    fn test_mock_fetcher_unknown_url() {
        let root = TempDir::new().unwrap();
        let fetcher = MockFetcher::new();

        let result = fetcher.fetch_and_unpack("mock://missing.zip", &root.path().join("x"));

        assert!(matches!(result, Err(Error::TransferFailed { .. })));
        assert_eq!(fetcher.fetch_count(), 1);
    }

    #[test]
    fn test_mock_fetcher_clones_share_counter() {
        let fetcher = MockFetcher::new();
        let clone = fetcher.clone();
        let root = TempDir::new().unwrap();

        let _ = clone.fetch_and_unpack("mock://missing.zip", &root.path().join("x"));

        assert_eq!(fetcher.fetch_count(), 1);
    }
}
