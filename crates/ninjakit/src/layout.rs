//! Install directory layout.
//!
//! Archives commonly wrap their content in a single versioned directory
//! (`ninja-1.10.0-linux/ninja`). After unpacking, that wrapper is pulled up
//! so the executable always sits directly in the install directory.
//!
//! Several provisioners may normalize the same directory at once. Entries
//! that disappear while being moved are taken as the work of a concurrent
//! provisioner and skipped.

use crate::error::{Error, Result};
use crate::state::MARKER_FILE;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Timestamp artifact left behind by the HTTP fetcher.
pub const TIMESTAMP_FILE: &str = ".timestamp";

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9_.-]+").unwrap_or_else(|e| panic!("invalid pattern: {e}"))
});

/// Make `s` usable as a single path component.
///
/// Every run of characters outside `[A-Za-z0-9_.-]` becomes one `_`.
#[must_use]
pub fn sanitize(s: &str) -> String {
    UNSAFE_CHARS.replace_all(s, "_").into_owned()
}

/// Directory to pull up, if `dir` holds nothing but a single directory.
///
/// The provenance marker and the fetcher's timestamp are not counted.
pub fn find_pull_up_directory(dir: &Path) -> Result<Option<PathBuf>> {
    let mut candidate = None;
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let name = entry.file_name();
        if name == MARKER_FILE || name == TIMESTAMP_FILE {
            continue;
        }
        if candidate.is_some() {
            return Ok(None);
        }
        candidate = Some(entry.path());
    }

    Ok(candidate.filter(|path| path.is_dir()))
}

/// Pull a single wrapping directory up into `dir`.
///
/// Returns `true` when a wrapper was found and removed.
pub fn pull_up(dir: &Path) -> Result<bool> {
    let Some(wrapper) = find_pull_up_directory(dir)? else {
        return Ok(false);
    };

    // Move the wrapper aside first, its children may share its name.
    let parked = tempfile::Builder::new()
        .prefix(".pullup-")
        .tempdir_in(dir)
        .map_err(|e| Error::io(dir, e))?;
    let source = parked.path().join("content");
    match fs::rename(&wrapper, &source) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("{} vanished, pulled up concurrently", wrapper.display());
            return Ok(false);
        }
        Err(e) => return Err(Error::io(&wrapper, e)),
    }

    log::debug!("pulling up {} into {}", wrapper.display(), dir.display());
    for entry in fs::read_dir(&source).map_err(|e| Error::io(&source, e))? {
        let entry = entry.map_err(|e| Error::io(&source, e))?;
        let target = dir.join(entry.file_name());
        match fs::rename(entry.path(), &target) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("{} vanished while pulling up", entry.path().display());
            }
            Err(e) => return Err(Error::io(&target, e)),
        }
    }

    // Dropping `parked` removes the emptied wrapper.
    drop(parked);
    Ok(true)
}

/// Mark every regular file below `dir` executable for everyone.
///
/// Unpacking does not reliably preserve permission bits. No-op on hosts
/// without an execute bit.
pub fn make_executable(dir: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        use walkdir::WalkDir;

        for entry in WalkDir::new(dir).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.io_error().is_some_and(|io| io.kind() == io::ErrorKind::NotFound) => {
                    continue;
                }
                Err(e) => {
                    let path = e.path().unwrap_or(dir).to_path_buf();
                    return Err(Error::io(path, io::Error::other(e.to_string())));
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let mut perms = match fs::metadata(path) {
                Ok(meta) => meta.permissions(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(Error::io(path, e)),
            };
            perms.set_mode(perms.mode() | 0o111);
            match fs::set_permissions(path, perms) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::io(path, e)),
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = dir;
    }

    Ok(())
}

/// Remove the fetcher's timestamp artifact, if present.
pub fn discard_timestamp(dir: &Path) -> Result<()> {
    let path = dir.join(TIMESTAMP_FILE);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}
