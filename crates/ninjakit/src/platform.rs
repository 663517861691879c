//! Platform classification for variant selection.
//!
//! Nodes describe themselves with JVM-style strings (`"Linux"`,
//! `"Windows Server 2016"`, `"Mac OS X"`, `"amd64"`). This module maps the OS
//! name onto the small set of families the download site publishes builds
//! for.
//!
//! # Example
//!
//! ```
//! use ninjakit::platform::{self, OsFamily};
//!
//! assert_eq!(platform::classify("Windows 10"), Some(OsFamily::Windows));
//! assert_eq!(OsFamily::Windows.site_name(), "win");
//! assert_eq!(platform::classify("SunOS"), None);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating system families with published downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    /// Linux.
    Linux,
    /// Any Windows edition.
    Windows,
    /// macOS (reported as "Mac OS X").
    Osx,
}

impl OsFamily {
    /// The OS token the download site uses in the manifest.
    #[must_use]
    pub fn site_name(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "win",
            Self::Osx => "mac",
        }
    }

    /// Separator for path-like environment variables on this family.
    #[must_use]
    pub fn path_separator(&self) -> char {
        match self {
            Self::Windows => ';',
            Self::Linux | Self::Osx => ':',
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.site_name())
    }
}

/// Classify a raw `os.name` value.
///
/// Rules are checked in order and are case-sensitive:
///
/// | `os.name`                  | Family    |
/// |----------------------------|-----------|
/// | exactly `Linux`            | Linux     |
/// | starts with `Windows`      | Windows   |
/// | contains `OS X`            | Osx       |
/// | anything else              | `None`    |
#[must_use]
pub fn classify(os_name: &str) -> Option<OsFamily> {
    if os_name == "Linux" {
        Some(OsFamily::Linux)
    } else if os_name.starts_with("Windows") {
        Some(OsFamily::Windows)
    } else if os_name.contains("OS X") {
        Some(OsFamily::Osx)
    } else {
        None
    }
}

/// The platform identity a node reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformSignature {
    /// Raw `os.name` value.
    pub os_name: String,
    /// Raw `os.arch` value.
    pub os_arch: String,
}

impl PlatformSignature {
    /// Create a new signature.
    #[must_use]
    pub fn new(os_name: impl Into<String>, os_arch: impl Into<String>) -> Self {
        Self {
            os_name: os_name.into(),
            os_arch: os_arch.into(),
        }
    }

    /// The OS family of this signature, if recognized.
    #[must_use]
    pub fn family(&self) -> Option<OsFamily> {
        classify(&self.os_name)
    }
}

impl fmt::Display for PlatformSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os_name, self.os_arch)
    }
}

/// Describe the current machine the way a node reports itself.
#[must_use]
pub fn detect() -> PlatformSignature {
    let os_name = match std::env::consts::OS {
        "linux" => "Linux",
        "windows" => "Windows",
        "macos" => "Mac OS X",
        other => other,
    };
    let os_arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        other => other,
    };

    PlatformSignature::new(os_name, os_arch)
}
