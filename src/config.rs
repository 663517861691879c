use crate::paths;
use anyhow::{Context, Result};
use ninjakit::Client;
use ninjakit::backend::file::FileSource;
use ninjakit::backend::http::{HttpFetcher, HttpSource};
use ninjakit::backend::ManifestSource;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================================
// Config Schema
// ============================================================================

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where the tool catalog comes from
    #[serde(default)]
    pub manifest: ManifestConfig,

    /// Root directory of provisioned tools
    #[serde(default)]
    pub tools_dir: Option<String>,

    /// Executable name inside install directories
    #[serde(default)]
    pub executable: Option<String>,
}

/// The `[manifest]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Base URL of the download service
    #[serde(default)]
    pub url: Option<String>,

    /// Catalog id at the download service
    #[serde(default)]
    pub source_id: Option<String>,

    /// Local directory holding `<source_id>.json`; takes precedence over `url`
    #[serde(default)]
    pub dir: Option<String>,
}

impl Config {
    /// Load `config.toml` from the config directory
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file()?)
    }

    /// Load a config file, or return defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("Config file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))
    }

    /// Catalog id at the download service
    pub fn source_id(&self) -> &str {
        self.manifest
            .source_id
            .as_deref()
            .unwrap_or(ninjakit::DEFAULT_SOURCE_ID)
    }

    /// Executable name inside install directories
    pub fn executable(&self) -> &str {
        self.executable
            .as_deref()
            .unwrap_or(ninjakit::installer::DEFAULT_EXECUTABLE)
    }

    /// Root directory of provisioned tools
    pub fn tools_dir(&self) -> Result<PathBuf> {
        match &self.tools_dir {
            Some(dir) => Ok(paths::expand(dir)),
            None => paths::default_tools_dir(),
        }
    }

    /// Catalog source selected by the config
    pub fn manifest_source(&self) -> Arc<dyn ManifestSource> {
        if let Some(dir) = &self.manifest.dir {
            return Arc::new(FileSource::new(paths::expand(dir), self.source_id()));
        }
        let url = self
            .manifest
            .url
            .as_deref()
            .unwrap_or(ninjakit::DEFAULT_UPDATES_URL);
        Arc::new(HttpSource::new(url, self.source_id()))
    }

    /// Client wired up according to the config
    pub fn client(&self) -> Client {
        Client::new()
            .with_source(self.manifest_source())
            .with_fetcher(Arc::new(HttpFetcher::new()))
            .executable_name(self.executable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.source_id(), ninjakit::DEFAULT_SOURCE_ID);
        assert_eq!(config.executable(), "ninja");
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
tools_dir = "/opt/tools"
executable = "ninja.exe"

[manifest]
url = "https://mirror.example.com/updates"
source_id = "ninja"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.tools_dir().unwrap(), PathBuf::from("/opt/tools"));
        assert_eq!(config.executable(), "ninja.exe");
        assert_eq!(config.source_id(), "ninja");
        assert_eq!(config.manifest_source().id(), "ninja");
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "tools_dir = [").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_manifest_dir_takes_precedence() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("ninja.json"),
            r#"{"list": [{"id": "1.10.0", "name": "Ninja 1.10.0"}]}"#,
        )
        .unwrap();
        let config = Config {
            manifest: ManifestConfig {
                url: Some("https://unreachable.invalid".to_string()),
                source_id: Some("ninja".to_string()),
                dir: Some(dir.path().display().to_string()),
            },
            ..Config::default()
        };

        let tools = config.client().installables();

        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].label(), "Ninja 1.10.0");
    }
}
