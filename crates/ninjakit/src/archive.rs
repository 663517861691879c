//! Archive unpacking.
//!
//! Downloads are unpacked into a staging directory next to the destination
//! and then swapped into place, so a destination directory only ever holds
//! one complete unpack. Directories the installer does not own are merged
//! into instead. Gzip-compressed tarballs and zip files are recognized by
//! their magic bytes.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::fs;
use std::io::{self, Cursor};
use std::path::Path;
use tar::Archive;

/// How often the swap is retried when a concurrent unpack wins the race.
const SWAP_ATTEMPTS: usize = 5;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// `.tar.gz` / `.tgz`.
    TarGz,
    /// `.zip`.
    Zip,
}

impl ArchiveKind {
    /// Detect the format from the leading bytes.
    #[must_use]
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x1f, 0x8b]) {
            Some(Self::TarGz)
        } else if data.starts_with(b"PK\x03\x04") || data.starts_with(b"PK\x05\x06") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

/// Replace the content of `dest` with the unpacked `data`.
pub fn unpack(data: &[u8], dest: &Path) -> Result<()> {
    let kind = ArchiveKind::detect(data)
        .ok_or_else(|| Error::Archive("unrecognized archive format".to_string()))?;

    let parent = dest
        .parent()
        .ok_or_else(|| Error::Archive(format!("{} has no parent directory", dest.display())))?;
    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(parent)
        .map_err(|e| Error::io(parent, e))?;

    match kind {
        ArchiveKind::TarGz => unpack_targz(data, staging.path())?,
        ArchiveKind::Zip => unpack_zip(data, staging.path())?,
    }

    replace_dir(staging.path(), dest)
}

fn unpack_targz(data: &[u8], into: &Path) -> Result<()> {
    let mut archive = Archive::new(GzDecoder::new(data));
    archive.set_preserve_permissions(true);
    archive
        .unpack(into)
        .map_err(|e| Error::Archive(format!("tar.gz: {e}")))
}

fn unpack_zip(data: &[u8], into: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    archive.extract(into)?;
    Ok(())
}

/// Move the directory `staged` to `dest`, displacing whatever is there.
///
/// Both must live on the same filesystem.
pub(crate) fn replace_dir(staged: &Path, dest: &Path) -> Result<()> {
    let parent = dest
        .parent()
        .ok_or_else(|| Error::Archive(format!("{} has no parent directory", dest.display())))?;

    for _ in 0..SWAP_ATTEMPTS {
        let displaced = tempfile::Builder::new()
            .prefix(".replaced-")
            .tempdir_in(parent)
            .map_err(|e| Error::io(parent, e))?;

        match fs::rename(dest, displaced.path().join("old")) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(dest, e)),
        }

        match fs::rename(staged, dest) {
            Ok(()) => return Ok(()),
            // Another unpack landed between the two renames.
            Err(_) if dest.exists() => {
                log::debug!("{} replaced concurrently, retrying", dest.display());
            }
            Err(e) => return Err(Error::io(dest, e)),
        }
    }

    Err(Error::Archive(format!(
        "could not move unpacked archive into {}",
        dest.display()
    )))
}

/// Move the entries of `staged` into `dest`, replacing entries of the same
/// name. Everything else in `dest` is left alone.
pub(crate) fn merge_dir(staged: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).map_err(|e| Error::io(dest, e))?;

    for entry in fs::read_dir(staged).map_err(|e| Error::io(staged, e))? {
        let entry = entry.map_err(|e| Error::io(staged, e))?;
        let target = dest.join(entry.file_name());
        remove_entry(&target)?;
        fs::rename(entry.path(), &target).map_err(|e| Error::io(&target, e))?;
    }
    Ok(())
}

fn remove_entry(path: &Path) -> Result<()> {
    let removed = match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => Err(e),
    };
    removed.map_err(|e| Error::io(path, e))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::TempDir;

    /// Build a gzip-compressed tarball from `(path, content)` pairs.
    pub(crate) fn targz(entries: &[(&str, &str)]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    /// Build a zip file from `(path, content)` pairs.
    pub(crate) fn zipped(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (path, content) in entries {
            writer.start_file(*path, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_detect_kind() {
        assert_eq!(ArchiveKind::detect(&targz(&[("a", "b")])), Some(ArchiveKind::TarGz));
        assert_eq!(ArchiveKind::detect(&zipped(&[("a", "b")])), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::detect(b"<html>"), None);
        assert_eq!(ArchiveKind::detect(&[]), None);
    }

    #[test]
    fn test_unpack_targz() {
        let root = TempDir::new().unwrap();
        let dest = root.path().join("ninja_1.10.0");
        let data = targz(&[("ninja-1.10.0/ninja", "bin"), ("ninja-1.10.0/README", "docs")]);

        unpack(&data, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("ninja-1.10.0/ninja")).unwrap(), "bin");
        assert!(dest.join("ninja-1.10.0/README").is_file());
    }

    #[test]
    fn test_unpack_zip() {
        let root = TempDir::new().unwrap();
        let dest = root.path().join("ninja_1.10.0");
        let data = zipped(&[("ninja", "bin")]);

        unpack(&data, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("ninja")).unwrap(), "bin");
    }

    #[test]
    fn test_unpack_replaces_previous_content() {
        let root = TempDir::new().unwrap();
        let dest = root.path().join("ninja");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("stale"), "old").unwrap();

        unpack(&zipped(&[("ninja", "new")]), &dest).unwrap();

        assert!(!dest.join("stale").exists());
        assert_eq!(fs::read_to_string(dest.join("ninja")).unwrap(), "new");
    }

    #[test]
    fn test_unpack_leaves_no_staging_dirs() {
        let root = TempDir::new().unwrap();
        let dest = root.path().join("ninja");

        unpack(&targz(&[("ninja", "bin")]), &dest).unwrap();
        unpack(&targz(&[("ninja", "bin2")]), &dest).unwrap();

        let entries: Vec<_> = fs::read_dir(root.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("ninja")]);
    }

    #[test]
    fn test_unpack_garbage_fails_without_touching_dest() {
        let root = TempDir::new().unwrap();
        let dest = root.path().join("ninja");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("ninja"), "keep").unwrap();

        let result = unpack(b"definitely not an archive", &dest);

        assert!(matches!(result, Err(Error::Archive(_))));
        assert_eq!(fs::read_to_string(dest.join("ninja")).unwrap(), "keep");
    }

    #[test]
    fn test_unpack_truncated_zip_fails() {
        let root = TempDir::new().unwrap();
        let dest = root.path().join("ninja");
        let data = zipped(&[("ninja", "bin")]);

        let result = unpack(&data[..10], &dest);

        assert!(matches!(result, Err(Error::Archive(_))));
        assert!(!dest.exists());
    }

    #[test]
    fn test_merge_dir_keeps_unrelated_entries() {
        let root = TempDir::new().unwrap();
        let staged = root.path().join("staged");
        let dest = root.path().join("dest");
        fs::create_dir_all(staged.join("doc")).unwrap();
        fs::write(staged.join("ninja"), "new").unwrap();
        fs::write(staged.join("doc").join("manual.html"), "manual").unwrap();
        fs::create_dir_all(dest.join("doc")).unwrap();
        fs::write(dest.join("ninja"), "old").unwrap();
        fs::write(dest.join("doc").join("stale.html"), "stale").unwrap();
        fs::write(dest.join("keep.txt"), "mine").unwrap();

        merge_dir(&staged, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("ninja")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dest.join("keep.txt")).unwrap(), "mine");
        assert!(dest.join("doc").join("manual.html").is_file());
        assert!(!dest.join("doc").join("stale.html").exists());
    }
}
