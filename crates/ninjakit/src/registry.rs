//! Configured tool installations.
//!
//! A [`Registry`] is an explicit, owned list of [`ToolInstallation`]s with a
//! load/save lifecycle. Nothing is global: callers load it, hand it to
//! whatever needs it and save it back when they changed it.
//!
//! ```toml
//! [[installation]]
//! name = "ninja-1.10"
//!
//! [[installation.properties]]
//! type = "install_source"
//! installers = [{ id = "1.10.0" }]
//!
//! [[installation]]
//! name = "system"
//! home = "/usr/bin/ninja"
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the installation created when nothing is configured.
pub const DEFAULT_NAME: &str = "InSearchPath";

/// Home of the default installation: the tool on the executable search path.
pub const DEFAULT_HOME: &str = "ninja";

/// Reference to a catalog tool an installation is provisioned from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerRef {
    /// Catalog tool id.
    pub id: String,
}

/// Property attached to an installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolProperty {
    /// The installation is provisioned on demand by the listed installers.
    InstallSource {
        /// Installers, the first one is used.
        #[serde(default)]
        installers: Vec<InstallerRef>,
    },
}

/// A named installation of the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInstallation {
    /// Name jobs select the installation by.
    pub name: String,
    /// Fixed location of the executable, or the install directory when
    /// provisioned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    /// Attached properties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<ToolProperty>,
}

impl ToolInstallation {
    /// Create an installation. Name and home are trimmed, an empty home is
    /// dropped.
    #[must_use]
    pub fn new(name: &str, home: Option<&str>) -> Self {
        Self {
            name: name.trim().to_string(),
            home: home
                .map(str::trim)
                .filter(|home| !home.is_empty())
                .map(str::to_string),
            properties: Vec::new(),
        }
    }

    /// Provision this installation from catalog tool `id`.
    #[must_use]
    pub fn with_installer(mut self, id: impl Into<String>) -> Self {
        self.properties.push(ToolProperty::InstallSource {
            installers: vec![InstallerRef { id: id.into() }],
        });
        self
    }

    /// Catalog tool id this installation is provisioned from, if any.
    #[must_use]
    pub fn installer_id(&self) -> Option<&str> {
        self.properties.iter().find_map(|property| match property {
            ToolProperty::InstallSource { installers } => {
                installers.first().map(|installer| installer.id.as_str())
            }
        })
    }

    /// Whether the tool is provisioned on demand. A configured home always
    /// wins over an install source.
    #[must_use]
    pub fn is_auto_install(&self) -> bool {
        self.home.is_none() && self.installer_id().is_some()
    }

    /// Location of a fixed installation's executable.
    ///
    /// A bare command name is looked up on `PATH`; anything else is taken as
    /// a path. Returns `None` without a home or when the command is not
    /// found.
    #[must_use]
    pub fn locate(&self) -> Option<PathBuf> {
        let home = self.home.as_deref()?;
        if home.contains(['/', '\\']) {
            Some(PathBuf::from(home))
        } else {
            which::which(home).ok()
        }
    }

    fn normalize(&mut self) {
        let trimmed = Self::new(&self.name, self.home.as_deref());
        self.name = trimmed.name;
        self.home = trimmed.home;
    }
}

/// An installation made usable on a specific node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInstallation {
    /// Name of the installation.
    pub name: String,
    /// Executable as seen by the node.
    pub home: String,
    /// Whether the executable was provisioned on demand.
    pub auto_installed: bool,
}

/// The configured installations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default, rename = "installation")]
    installations: Vec<ToolInstallation>,
}

impl Registry {
    /// Load the registry from `path`; a missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("{} does not exist, no installations configured", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut registry: Self = toml::from_str(&content)
            .map_err(|e| Error::Configuration(format!("{}: {e}", path.display())))?;
        for installation in &mut registry.installations {
            installation.normalize();
        }

        log::debug!(
            "loaded {} installation(s) from {}",
            registry.installations.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Write the registry to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("cannot serialize installations: {e}")))?;
        fs::write(path, content).map_err(|e| Error::io(path, e))?;

        log::debug!("saved installations to {}", path.display());
        Ok(())
    }

    /// All installations in configuration order.
    #[must_use]
    pub fn installations(&self) -> &[ToolInstallation] {
        &self.installations
    }

    /// Installation names, for selection lists.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.installations
            .iter()
            .map(|installation| installation.name.as_str())
            .collect()
    }

    /// Find an installation by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ToolInstallation> {
        self.installations
            .iter()
            .find(|installation| installation.name == name)
    }

    /// Whether nothing is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.installations.is_empty()
    }

    /// Add an installation.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` when the name is empty or taken.
    pub fn add(&mut self, mut installation: ToolInstallation) -> Result<()> {
        installation.normalize();
        check_name(&installation)?;
        if self.find(&installation.name).is_some() {
            return Err(Error::Configuration(format!(
                "Ninja installation `{}` already exists",
                installation.name
            )));
        }
        self.installations.push(installation);
        Ok(())
    }

    /// Remove an installation by name; returns whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.installations.len();
        self.installations
            .retain(|installation| installation.name != name);
        self.installations.len() != before
    }

    /// Check every installation.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` for the first installation without a
    /// name.
    pub fn validate(&self) -> Result<()> {
        self.installations.iter().try_for_each(check_name)
    }

    /// Add the default installation when nothing is configured.
    ///
    /// Returns `true` when the registry changed.
    pub fn ensure_default(&mut self) -> bool {
        if !self.installations.is_empty() {
            return false;
        }
        log::info!("no Ninja installation configured, adding `{DEFAULT_NAME}`");
        self.installations
            .push(ToolInstallation::new(DEFAULT_NAME, Some(DEFAULT_HOME)));
        true
    }
}

fn check_name(installation: &ToolInstallation) -> Result<()> {
    if installation.name.is_empty() {
        return Err(Error::Configuration(
            "Ninja installation requires a name".to_string(),
        ));
    }
    Ok(())
}
