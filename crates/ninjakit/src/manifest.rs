//! The versioned tool catalog.
//!
//! The catalog is a JSON document published by the download service:
//!
//! ```json
//! {
//!   "list": [
//!     {
//!       "id": "1.10.0",
//!       "name": "Ninja 1.10.0",
//!       "variants": [
//!         { "os": "linux", "arch": "-", "url": "https://example.com/ninja-linux.zip" },
//!         { "os": "win",   "arch": "-", "url": "https://example.com/ninja-win.zip" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Decoding goes through private wire structs whose defaults are spelled out
//! (`list`, `variants`, `os` and `arch` may be absent) and is then validated
//! (`id` and `url` must be present and non-empty).

use crate::backend::ManifestSource;
use crate::error::{Error, Result};
use serde::Deserialize;

/// One downloadable artifact for a specific platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolVariant {
    /// OS token as used by the download site (`linux`, `win`, `mac`).
    pub os_site_name: String,
    /// Architecture token as used by the download site.
    pub arch_site_name: String,
    /// Download URL of the archive.
    pub url: String,
}

/// An installable tool version with its platform variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallableTool {
    /// Stable identifier, also used as install directory discriminator.
    pub id: String,
    /// Human-readable label, if the catalog provides one.
    pub name: Option<String>,
    /// Platform variants in catalog order.
    pub variants: Vec<ToolVariant>,
}

impl InstallableTool {
    /// Label for listings: the catalog name, falling back to the id.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// The catalog of installable tools.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Tools in catalog order.
    pub tools: Vec<InstallableTool>,
}

impl Manifest {
    /// An empty catalog.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decode a catalog payload.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedManifest` when the payload is not JSON or does
    /// not follow the catalog schema.
    pub fn parse(payload: &str) -> Result<Self> {
        let raw: RawManifest = serde_json::from_str(payload)
            .map_err(|e| Error::MalformedManifest(e.to_string()))?;
        raw.validate()
    }

    /// Decode a catalog for listing purposes.
    ///
    /// An absent or malformed payload yields an empty catalog, so that a
    /// temporarily unavailable download service only shows up as "nothing to
    /// install".
    #[must_use]
    pub fn parse_or_empty(payload: Option<&str>) -> Self {
        let Some(payload) = payload else {
            return Self::empty();
        };
        match Self::parse(payload) {
            Ok(manifest) => manifest,
            Err(e) => {
                log::warn!("ignoring tool manifest: {e}");
                Self::empty()
            }
        }
    }

    /// Load the current catalog for provisioning.
    ///
    /// A source without a catalog yields an empty one, which makes every
    /// resolution unsupported.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedManifest` when the payload cannot be decoded,
    /// or the source's own error when loading fails.
    pub fn load(source: &dyn ManifestSource) -> Result<Self> {
        match source.load()? {
            Some(payload) => Self::parse(&payload),
            None => {
                log::debug!("no tool manifest published as `{}`", source.id());
                Ok(Self::empty())
            }
        }
    }

    /// Find a tool by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&InstallableTool> {
        self.tools.iter().find(|tool| tool.id == id)
    }

    /// Whether the catalog lists no tools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    list: Vec<RawTool>,
}

#[derive(Debug, Deserialize)]
struct RawTool {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    variants: Vec<RawVariant>,
}

#[derive(Debug, Deserialize)]
struct RawVariant {
    url: String,
    #[serde(default)]
    os: String,
    #[serde(default)]
    arch: String,
}

impl RawManifest {
    fn validate(self) -> Result<Manifest> {
        let tools = self
            .list
            .into_iter()
            .enumerate()
            .map(|(index, tool)| tool.validate(index))
            .collect::<Result<Vec<_>>>()?;
        Ok(Manifest { tools })
    }
}

impl RawTool {
    fn validate(self, index: usize) -> Result<InstallableTool> {
        if self.id.trim().is_empty() {
            return Err(Error::MalformedManifest(format!(
                "tool #{index} has an empty id"
            )));
        }

        let mut variants = Vec::with_capacity(self.variants.len());
        for (variant_index, variant) in self.variants.into_iter().enumerate() {
            if variant.url.trim().is_empty() {
                return Err(Error::MalformedManifest(format!(
                    "tool `{}` variant #{variant_index} has an empty url",
                    self.id
                )));
            }
            variants.push(ToolVariant {
                os_site_name: variant.os,
                arch_site_name: variant.arch,
                url: variant.url,
            });
        }

        Ok(InstallableTool {
            id: self.id,
            name: self.name.filter(|n| !n.trim().is_empty()),
            variants,
        })
    }
}
