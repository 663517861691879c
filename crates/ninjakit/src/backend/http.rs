//! HTTP backend.
//!
//! [`HttpSource`] fetches the catalog as `<base_url>/<id>.json`.
//! [`HttpFetcher`] downloads archives and skips the unpack when the server
//! reports the same `Last-Modified` value as the one recorded in the
//! destination's timestamp file.

use crate::archive;
use crate::backend::{Fetcher, ManifestSource};
use crate::error::{Error, Result};
use crate::layout::TIMESTAMP_FILE;
use std::fs;
use std::path::Path;

/// Maximum download size (100 MB covers every ninja release by far).
const MAX_BODY_SIZE: u64 = 100 * 1024 * 1024;

/// User agent sent with every request.
const USER_AGENT: &str = concat!("ninjakit/", env!("CARGO_PKG_VERSION"));

/// Catalog served by an HTTP download service.
pub struct HttpSource {
    agent: ureq::Agent,
    base_url: String,
    id: String,
}

impl HttpSource {
    /// Create a source for catalog `id` below `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            base_url: base_url.into(),
            id: id.into(),
        }
    }

    /// URL of the catalog document.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}/{}.json", self.base_url.trim_end_matches('/'), self.id)
    }
}

impl ManifestSource for HttpSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self) -> Result<Option<String>> {
        let url = self.url();
        log::debug!("loading tool manifest from {url}");

        let mut response = match self
            .agent
            .get(&url)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(404)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let body = response.body_mut().read_to_string()?;
        Ok(Some(body))
    }
}

/// Downloads archives over HTTP and unpacks them.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a new HTTP fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    fn download(&self, url: &str, dest: &Path) -> Result<bool> {
        let mut response = self
            .agent
            .get(url)
            .header("Accept", "application/octet-stream")
            .header("User-Agent", USER_AGENT)
            .call()?;

        let last_modified = response
            .headers()
            .get("Last-Modified")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        if let Some(stamp) = &last_modified
            && is_current(dest, stamp)
        {
            log::debug!("{} unchanged since {stamp}, skipping", url);
            return Ok(false);
        }

        let data = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_SIZE)
            .read_to_vec()?;

        archive::unpack(&data, dest)?;

        if let Some(stamp) = last_modified {
            let path = dest.join(TIMESTAMP_FILE);
            fs::write(&path, stamp).map_err(|e| Error::io(path, e))?;
        }

        Ok(true)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_and_unpack(&self, url: &str, dest: &Path) -> Result<bool> {
        self.download(url, dest)
            .map_err(|e| Error::transfer(url, e))
    }
}

/// Whether `dest` holds an unpack stamped with `stamp`.
fn is_current(dest: &Path, stamp: &str) -> bool {
    fs::read_to_string(dest.join(TIMESTAMP_FILE)).is_ok_and(|recorded| recorded == stamp)
}
