//! Install-state tracking.
//!
//! An install directory is up to date when its provenance marker holds the
//! URL of the currently resolved variant. The catalog publishes a new URL
//! whenever the content changes, so URL identity is the only freshness
//! signal.

use crate::error::{Error, Result};
use crate::manifest::ToolVariant;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Provenance marker holding the last installed URL.
pub const MARKER_FILE: &str = ".installedFrom";

/// URL recorded in the marker of `install_dir`, if any.
#[must_use]
pub fn installed_from(install_dir: &Path) -> Option<String> {
    fs::read_to_string(install_dir.join(MARKER_FILE)).ok()
}

/// Whether `install_dir` already holds `variant`.
#[must_use]
pub fn is_up_to_date(install_dir: &Path, variant: &ToolVariant) -> bool {
    installed_from(install_dir).is_some_and(|url| url == variant.url)
}

/// Record that `variant` is installed in `install_dir`.
///
/// Must run after everything else of an install has succeeded. The marker is
/// replaced atomically so a concurrent reader sees either the old or the new
/// URL.
pub fn record_installed(install_dir: &Path, variant: &ToolVariant) -> Result<()> {
    let marker = install_dir.join(MARKER_FILE);

    let mut staged = tempfile::Builder::new()
        .prefix(".installedFrom-")
        .tempfile_in(install_dir)
        .map_err(|e| Error::io(install_dir, e))?;
    staged
        .write_all(variant.url.as_bytes())
        .map_err(|e| Error::io(staged.path().to_path_buf(), e))?;
    staged
        .persist(&marker)
        .map_err(|e| Error::io(&marker, e.error))?;

    log::debug!("recorded {} in {}", variant.url, marker.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn variant(url: &str) -> ToolVariant {
        ToolVariant {
            os_site_name: "linux".to_string(),
            arch_site_name: "-".to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_missing_marker_is_not_up_to_date() {
        let dir = TempDir::new().unwrap();
        assert!(!is_up_to_date(dir.path(), &variant("https://example.com/a.zip")));
        assert_eq!(installed_from(dir.path()), None);
    }

    #[test]
    fn test_record_then_up_to_date() {
        let dir = TempDir::new().unwrap();
        let v = variant("https://example.com/a.zip");

        record_installed(dir.path(), &v).unwrap();

        assert!(is_up_to_date(dir.path(), &v));
        assert_eq!(
            fs::read_to_string(dir.path().join(MARKER_FILE)).unwrap(),
            "https://example.com/a.zip"
        );
    }

    #[test]
    fn test_different_url_is_stale() {
        let dir = TempDir::new().unwrap();
        record_installed(dir.path(), &variant("https://example.com/a.zip")).unwrap();
        assert!(!is_up_to_date(dir.path(), &variant("https://example.com/b.zip")));
    }

    #[test]
    fn test_record_overwrites_previous_url() {
        let dir = TempDir::new().unwrap();
        record_installed(dir.path(), &variant("https://example.com/a.zip")).unwrap();
        record_installed(dir.path(), &variant("https://example.com/b.zip")).unwrap();

        assert_eq!(
            installed_from(dir.path()).as_deref(),
            Some("https://example.com/b.zip")
        );
    }

    #[test]
    fn test_comparison_is_verbatim() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MARKER_FILE), "https://example.com/a.zip\n").unwrap();
        assert!(!is_up_to_date(dir.path(), &variant("https://example.com/a.zip")));
    }

    #[test]
    fn test_record_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        record_installed(dir.path(), &variant("https://example.com/a.zip")).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from(MARKER_FILE)]);
    }

    #[test]
    fn test_record_into_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let result = record_installed(&missing, &variant("https://example.com/a.zip"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
