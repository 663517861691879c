//! Catalogs kept in a local directory as `<dir>/<id>.json`.

use crate::backend::ManifestSource;
use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Catalog read from a local updates directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
    id: String,
}

impl FileSource {
    /// Create a source for catalog `id` in `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, id: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            id: id.into(),
        }
    }

    /// Path of the catalog document.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.id))
    }
}

impl ManifestSource for FileSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self) -> Result<Option<String>> {
        let path = self.path();
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(path, e)),
        }
    }
}
