//! Provisioning the tool onto a node.
//!
//! [`ManifestInstaller`] installs one catalog tool id:
//!
//! 1. pick the install directory: the home given in the request, or
//!    `<tools root>/<sanitized id>`;
//! 2. resolve the variant for the node's platform;
//! 3. stop if the directory was installed from that variant's URL;
//! 4. fetch and unpack the variant;
//! 5. normalize the unpack (pull up a wrapping directory, mark files
//!    executable) and record the URL;
//! 6. hand back the executable inside the directory.
//!
//! No lock is taken. The fetch and normalization happen in a staging
//! directory next to the install directory which is then swapped into
//! place, so concurrent provisioners of the same tool each publish a
//! complete installation and the last one wins. A configured home is owned
//! by the user: the staged files are moved into it over entries of the same
//! name and nothing else there is touched.

use crate::archive;
use crate::backend::{Fetcher, ManifestSource};
use crate::error::{Error, Result};
use crate::layout;
use crate::manifest::{Manifest, ToolVariant};
use crate::node::{self, Node};
use crate::platform::OsFamily;
use crate::registry::ToolInstallation;
use crate::resolver;
use crate::state;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Executable looked up in an install directory by default.
pub const DEFAULT_EXECUTABLE: &str = "ninja";

/// Extension point for installing a tool onto a node.
pub trait ToolInstaller: Send + Sync {
    /// Catalog tool id this installer provisions.
    fn id(&self) -> &str;

    /// Make the tool available on `node` for `tool` and return the executable.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be resolved for the node, or if
    /// downloading, unpacking or normalizing it fails.
    fn resolve_and_install(&self, node: &dyn Node, tool: &ToolInstallation) -> Result<PathBuf>;
}

/// Where to provision.
#[derive(Clone, Copy)]
pub struct ProvisionRequest<'a> {
    /// Node receiving the tool.
    pub node: &'a dyn Node,
    /// Configured install directory, if any.
    pub home: Option<&'a Path>,
}

impl<'a> ProvisionRequest<'a> {
    /// Provision into the node's default location.
    #[must_use]
    pub fn new(node: &'a dyn Node) -> Self {
        Self { node, home: None }
    }

    /// Provision into `home`.
    #[must_use]
    pub fn home(mut self, home: &'a Path) -> Self {
        self.home = Some(home);
        self
    }
}

/// Outcome of a provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    /// Path of the executable.
    pub executable: PathBuf,
    /// Install directory.
    pub install_dir: PathBuf,
    /// URL of the installed variant.
    pub url: String,
    /// Whether anything was downloaded this time.
    pub fetched: bool,
}

/// Installs a catalog tool id.
#[derive(Clone)]
pub struct ManifestInstaller {
    id: String,
    source: Arc<dyn ManifestSource>,
    fetcher: Arc<dyn Fetcher>,
    executable_name: String,
}

impl ManifestInstaller {
    /// Create an installer for catalog tool `id`.
    #[must_use]
    pub fn new(id: impl Into<String>, source: Arc<dyn ManifestSource>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            id: id.into(),
            source,
            fetcher,
            executable_name: DEFAULT_EXECUTABLE.to_string(),
        }
    }

    /// Use a different executable name inside the install directory.
    #[must_use]
    pub fn executable_name(mut self, name: impl Into<String>) -> Self {
        self.executable_name = name.into();
        self
    }

    /// Install directory for the request.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` when the tool id does not yield a
    /// usable directory name.
    pub fn install_dir(&self, request: &ProvisionRequest<'_>) -> Result<PathBuf> {
        if let Some(home) = request.home {
            if home.exists() && !home.is_dir() {
                return Err(Error::Configuration(format!(
                    "{} is not a directory",
                    home.display()
                )));
            }
            return Ok(home.to_path_buf());
        }

        let dir_name = layout::sanitize(&self.id);
        if matches!(dir_name.as_str(), "" | "." | "..") {
            return Err(Error::Configuration(format!(
                "tool id `{}` cannot be used as a directory name",
                self.id
            )));
        }
        Ok(request.node.tools_root().join(dir_name))
    }

    /// Provision the tool against an already loaded catalog.
    ///
    /// # Errors
    ///
    /// Returns `Error::Unsupported` when the catalog has no variant for the
    /// node, `Error::TransferFailed` when fetching fails, and I/O or node
    /// errors raised while normalizing the install directory.
    pub fn provision(&self, request: &ProvisionRequest<'_>, manifest: &Manifest) -> Result<Provisioned> {
        let node = request.node;
        let install_dir = self.install_dir(request)?;

        let signature = node::query_node_properties(node)?;
        let variant = resolver::resolve(manifest, &self.id, &signature)
            .map_err(|unsupported| unsupported.on_node(node.name()))?;

        let fetched = if state::is_up_to_date(&install_dir, variant) {
            log::debug!(
                "{} on {} is up to date with {}",
                install_dir.display(),
                node.name(),
                variant.url
            );
            false
        } else {
            log::info!(
                "Unpacking {} to {} on {}",
                variant.url,
                install_dir.display(),
                node.name()
            );
            let target = if request.home.is_some() {
                Target::InPlace(&install_dir)
            } else {
                Target::Replace(&install_dir)
            };
            self.install(node, target, variant, signature.family())?
        };

        Ok(Provisioned {
            executable: install_dir.join(&self.executable_name),
            install_dir,
            url: variant.url.clone(),
            fetched,
        })
    }

    fn install(
        &self,
        node: &dyn Node,
        target: Target<'_>,
        variant: &ToolVariant,
        family: Option<OsFamily>,
    ) -> Result<bool> {
        let parent = match target {
            Target::Replace(dir) => dir.parent().ok_or_else(|| {
                Error::Configuration(format!("{} has no parent directory", dir.display()))
            })?,
            Target::InPlace(dir) => dir,
        };
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

        let staging = tempfile::Builder::new()
            .prefix(".provision-")
            .tempdir_in(parent)
            .map_err(|e| Error::io(parent, e))?;
        let staged = staging.path().join("content");

        if !self.fetcher.fetch_and_unpack(&variant.url, &staged)? {
            log::debug!("nothing fetched for {}", variant.url);
            return Ok(false);
        }

        layout::discard_timestamp(&staged)?;
        layout::pull_up(&staged)?;
        if family != Some(OsFamily::Windows) {
            node::make_executable(node, &staged)?;
        }

        match target {
            Target::Replace(dir) => {
                state::record_installed(&staged, variant)?;
                archive::replace_dir(&staged, dir)?;
            }
            Target::InPlace(dir) => {
                archive::merge_dir(&staged, dir)?;
                state::record_installed(dir, variant)?;
            }
        }
        Ok(true)
    }
}

/// How the staged tree reaches the install directory.
#[derive(Clone, Copy)]
enum Target<'a> {
    /// Directory owned by the installer, swapped as a whole.
    Replace(&'a Path),
    /// User-chosen directory, overwritten entry by entry.
    InPlace(&'a Path),
}

impl ToolInstaller for ManifestInstaller {
    fn id(&self) -> &str {
        &self.id
    }

    /// Installs into the node's tools root. A tool with a configured home is
    /// a fixed installation and is rejected.
    fn resolve_and_install(&self, node: &dyn Node, tool: &ToolInstallation) -> Result<PathBuf> {
        if let Some(home) = &tool.home {
            return Err(Error::Configuration(format!(
                "Ninja installation `{}` uses the fixed home {home} and is not installed",
                tool.name
            )));
        }
        let manifest = Manifest::load(self.source.as_ref())?;
        Ok(self.provision(&ProvisionRequest::new(node), &manifest)?.executable)
    }
}
