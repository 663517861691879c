//! # ninjakit
//!
//! Pure Rust library for provisioning the ninja build tool onto build nodes.
//!
//! This crate provides functionality for:
//! - Reading the versioned catalog of ninja downloads
//! - Matching a node's platform against the catalog
//! - Installing the matching archive idempotently, also under concurrent
//!   provisioners
//! - Exposing the installed tool to build environments
//!
//! ## Example
//!
//! ```no_run
//! use ninjakit::Client;
//! use ninjakit::node::LocalNode;
//! use ninjakit::registry::ToolInstallation;
//!
//! let client = Client::new();
//! let node = LocalNode::new("local", "/opt/tools");
//!
//! // Provision catalog tool `1.10.0` onto this machine
//! let tool = ToolInstallation::new("ninja-1.10", None).with_installer("1.10.0");
//! let resolved = client.translate(&tool, &node).expect("provisioning failed");
//!
//! println!("ninja is at {}", resolved.home);
//! ```
//!
//! ## Catalog
//!
//! The catalog is published by a download service as `<id>.json`:
//!
//! | Backend | Source |
//! |---------|--------|
//! | [`backend::http::HttpSource`] | `<base url>/<id>.json` |
//! | [`backend::file::FileSource`] | `<dir>/<id>.json` |
//! | [`backend::StaticSource`] | in memory |
//!
//! ## Platform Detection
//!
//! Nodes report their raw OS name and architecture, which are classified into
//! the download site's OS families:
//!
//! ```
//! use ninjakit::platform::{self, OsFamily};
//!
//! assert_eq!(platform::classify("Windows Server 2019"), Some(OsFamily::Windows));
//! assert_eq!(platform::classify("Mac OS X"), Some(OsFamily::Osx));
//! assert_eq!(platform::classify("SunOS"), None);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod archive;
pub mod backend;
pub mod env;
pub mod error;
pub mod installer;
pub mod layout;
pub mod manifest;
pub mod node;
pub mod platform;
pub mod registry;
pub mod resolver;
pub mod state;
pub mod wrapper;

pub use error::{Error, ErrorCategory, Result};
pub use installer::{ManifestInstaller, ProvisionRequest, Provisioned, ToolInstaller};
pub use manifest::{InstallableTool, Manifest, ToolVariant};
pub use platform::{OsFamily, PlatformSignature};
pub use registry::{Registry, ResolvedInstallation, ToolInstallation};

use backend::http::{HttpFetcher, HttpSource};
use backend::{Fetcher, ManifestSource};
use node::Node;
use std::sync::Arc;

/// Download service publishing the ninja catalog.
pub const DEFAULT_UPDATES_URL: &str = "https://updates.jenkins.io/updates";

/// Catalog id of the ninja downloads at the download service.
pub const DEFAULT_SOURCE_ID: &str = "org.jenkinsci.plugins.ninja.NinjaInstaller";

/// High-level client for provisioning operations.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use ninjakit::Client;
/// use ninjakit::backend::StaticSource;
///
/// let source = StaticSource::new(r#"{"list": [{"id": "1.10.0"}]}"#);
/// let client = Client::new().with_source(Arc::new(source));
///
/// let ids: Vec<_> = client.installables().into_iter().map(|t| t.id).collect();
/// assert_eq!(ids, vec!["1.10.0"]);
/// ```
#[derive(Clone)]
pub struct Client {
    source: Arc<dyn ManifestSource>,
    fetcher: Arc<dyn Fetcher>,
    executable_name: String,
}

impl Client {
    /// Create a new Client against the default download service.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: Arc::new(HttpSource::new(DEFAULT_UPDATES_URL, DEFAULT_SOURCE_ID)),
            fetcher: Arc::new(HttpFetcher::new()),
            executable_name: installer::DEFAULT_EXECUTABLE.to_string(),
        }
    }

    /// Use a different catalog source (useful for testing).
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn ManifestSource>) -> Self {
        self.source = source;
        self
    }

    /// Use a different fetcher (useful for testing).
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Name of the executable inside install directories.
    #[must_use]
    pub fn executable_name(mut self, name: impl Into<String>) -> Self {
        self.executable_name = name.into();
        self
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Tools available for installation, in catalog order.
    ///
    /// Never fails: an unreachable or malformed catalog lists nothing.
    #[must_use]
    pub fn installables(&self) -> Vec<InstallableTool> {
        let payload = match self.source.load() {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("cannot load tool manifest `{}`: {e}", self.source.id());
                None
            }
        };
        Manifest::parse_or_empty(payload.as_deref()).tools
    }

    /// Load the catalog for provisioning.
    pub fn load_manifest(&self) -> Result<Manifest> {
        Manifest::load(self.source.as_ref())
    }

    /// Variant of `tool_id` that would be installed on a node with `signature`.
    pub fn resolve(&self, tool_id: &str, signature: &PlatformSignature) -> Result<ToolVariant> {
        let manifest = self.load_manifest()?;
        resolver::resolve(&manifest, tool_id, signature)
            .cloned()
            .map_err(|unsupported| unsupported.on_node(&signature.to_string()))
    }

    // =========================================================================
    // Provisioning
    // =========================================================================

    /// Installer for catalog tool `tool_id`.
    #[must_use]
    pub fn installer(&self, tool_id: &str) -> ManifestInstaller {
        ManifestInstaller::new(tool_id, Arc::clone(&self.source), Arc::clone(&self.fetcher))
            .executable_name(&self.executable_name)
    }

    /// Make `tool` usable on `node`.
    ///
    /// Auto-installed tools are provisioned and resolve to the installed
    /// executable; fixed installations resolve to their configured home. A
    /// tool with a home is fixed even if it also names an install source, and
    /// nothing is written to its home.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` for a fixed installation without a home,
    /// or any provisioning error.
    pub fn translate(&self, tool: &ToolInstallation, node: &dyn Node) -> Result<ResolvedInstallation> {
        if let Some(id) = tool.installer_id().filter(|_| tool.is_auto_install()) {
            let executable = self.installer(id).resolve_and_install(node, tool)?;
            return Ok(ResolvedInstallation {
                name: tool.name.clone(),
                home: executable.display().to_string(),
                auto_installed: true,
            });
        }

        let home = tool.home.clone().ok_or_else(|| {
            Error::Configuration(format!("Ninja installation `{}` has no home", tool.name))
        })?;
        Ok(ResolvedInstallation {
            name: tool.name.clone(),
            home,
            auto_installed: false,
        })
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}
