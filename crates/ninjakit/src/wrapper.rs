//! Setting up a build to use a configured installation.

use crate::Client;
use crate::env::{self, EnvContribution};
use crate::error::{Error, Result};
use crate::node::{self, Node};
use crate::registry::{Registry, ResolvedInstallation, ToolInstallation};
use std::collections::BTreeMap;

const NO_INSTALLATION: &str =
    "There is no Ninja installation selected. Please review the job configuration.";

/// Selects the installation a build runs with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildWrapper {
    /// Name of the selected installation.
    pub installation_name: Option<String>,
}

impl BuildWrapper {
    /// Select installation `name`; blank names select nothing.
    #[must_use]
    pub fn new(name: Option<&str>) -> Self {
        Self {
            installation_name: name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        }
    }

    /// The selected installation.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` when nothing is selected or the
    /// selection is not configured.
    pub fn installation<'r>(&self, registry: &'r Registry) -> Result<&'r ToolInstallation> {
        self.installation_name
            .as_deref()
            .and_then(|name| registry.find(name))
            .ok_or_else(|| Error::Configuration(NO_INSTALLATION.to_string()))
    }

    /// Check the selection before any node work starts.
    pub fn validate(&self, registry: &Registry) -> Result<()> {
        registry.validate()?;
        self.installation(registry).map(|_| ())
    }

    /// Make the selected installation usable on `node`.
    pub fn set_up(&self, client: &Client, registry: &Registry, node: &dyn Node) -> Result<BuildEnvironment> {
        let tool = self.installation(registry)?;
        let installation = client.translate(tool, node)?;
        let contribution = env::contribute_env(&installation.home, installation.auto_installed);

        let separator = node::query_node_properties(node)?
            .family()
            .map_or(':', |family| family.path_separator());

        log::debug!(
            "using Ninja installation `{}` at {} on {}",
            installation.name,
            installation.home,
            node.name()
        );
        Ok(BuildEnvironment {
            installation,
            contribution,
            separator,
        })
    }
}

/// Environment of a build that was set up with a [`BuildWrapper`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnvironment {
    /// The installation in use.
    pub installation: ResolvedInstallation,
    /// What the installation adds to the environment.
    pub contribution: EnvContribution,
    separator: char,
}

impl BuildEnvironment {
    /// Add the installation's entries to a subprocess environment.
    pub fn build_env_vars(&self, env: &mut BTreeMap<String, String>) {
        self.contribution.apply(env, self.separator);
    }

    /// `PATH` separator of the node.
    #[must_use]
    pub fn separator(&self) -> char {
        self.separator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::targz;
    use crate::backend::{MockFetcher, StaticSource};
    use crate::node::LocalNode;
    use crate::platform;
    use std::sync::Arc;
    use tempfile::TempDir;

    const URL: &str = "mock://ninja-1.10.0.tar.gz";

    fn client() -> Client {
        let site_name = platform::detect()
            .family()
            .map_or("linux", |family| family.site_name());
        let payload = format!(
            r#"{{"list": [{{"id": "1.10.0", "variants": [{{"os": "{site_name}", "url": "{URL}"}}]}}]}}"#
        );
        let fetcher = MockFetcher::new();
        fetcher.add_archive(URL, targz(&[("ninja-1.10.0/ninja", "bin")]));
        Client::new()
            .with_source(Arc::new(StaticSource::new(payload)))
            .with_fetcher(Arc::new(fetcher))
    }

    fn registry() -> Registry {
        let mut registry = Registry::default();
        registry
            .add(ToolInstallation::new("ninja-1.10", None).with_installer("1.10.0"))
            .unwrap();
        registry
            .add(ToolInstallation::new("system", Some("/usr/bin/ninja")))
            .unwrap();
        registry
    }

    #[test]
    fn test_new_blank_name_selects_nothing() {
        assert_eq!(BuildWrapper::new(Some("  ")).installation_name, None);
        assert_eq!(
            BuildWrapper::new(Some(" system ")).installation_name.as_deref(),
            Some("system")
        );
    }

    #[test]
    fn test_validate_without_selection() {
        let result = BuildWrapper::new(None).validate(&registry());
        match result {
            Err(Error::Configuration(msg)) => assert_eq!(msg, NO_INSTALLATION),
            other => panic!("Expected Configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_unknown_selection() {
        let result = BuildWrapper::new(Some("gone")).validate(&registry());
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_validate_known_selection() {
        BuildWrapper::new(Some("system")).validate(&registry()).unwrap();
    }

    #[test]
    fn test_set_up_fixed_installation() {
        let node = LocalNode::new("local", "/nonexistent");
        let wrapper = BuildWrapper::new(Some("system"));

        let environment = wrapper.set_up(&client(), &registry(), &node).unwrap();

        assert_eq!(environment.installation.home, "/usr/bin/ninja");
        assert!(environment.contribution.is_empty());

        let mut vars = BTreeMap::from([("PATH".to_string(), "/bin".to_string())]);
        environment.build_env_vars(&mut vars);
        assert_eq!(vars["PATH"], "/bin");
    }

    #[test]
    fn test_set_up_auto_installation() {
        if platform::detect().family().is_none() {
            return;
        }
        let root = TempDir::new().unwrap();
        let node = LocalNode::new("local", root.path());
        let wrapper = BuildWrapper::new(Some("ninja-1.10"));

        let environment = wrapper.set_up(&client(), &registry(), &node).unwrap();

        let dir = root.path().join("1.10.0");
        assert!(environment.installation.auto_installed);
        assert!(dir.join("ninja").is_file());
        assert_eq!(
            environment.contribution.get(env::PATH_KEY),
            Some(dir.display().to_string().as_str())
        );

        let mut vars = BTreeMap::from([("PATH".to_string(), "/bin".to_string())]);
        environment.build_env_vars(&mut vars);
        let separator = environment.separator();
        assert_eq!(vars["PATH"], format!("{}{separator}/bin", dir.display()));
    }

    #[test]
    fn test_set_up_without_selection_does_no_node_work() {
        let root = TempDir::new().unwrap();
        let node = LocalNode::new("local", root.path());

        let result = BuildWrapper::default().set_up(&client(), &registry(), &node);

        assert!(matches!(result, Err(Error::Configuration(_))));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
