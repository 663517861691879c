//! Command implementations.

pub mod env;
pub mod installables;
pub mod installations;
pub mod provision;
pub mod resolve;

use crate::config::Config;
use crate::paths;
use anyhow::{Context as _, Result};
use ninjakit::Registry;
use ninjakit::node::LocalNode;
use ninjakit::wrapper::{BuildEnvironment, BuildWrapper};
use std::path::Path;

/// Name this machine goes by in messages
const LOCAL_NODE: &str = "local";

/// Load the installation registry, creating the default installation on
/// first use.
pub fn load_registry() -> Result<Registry> {
    load_registry_from(&paths::installations_file()?)
}

fn load_registry_from(path: &Path) -> Result<Registry> {
    let mut registry = Registry::load(path)
        .with_context(|| format!("Failed to load installations from {}", path.display()))?;

    if registry.ensure_default() {
        registry
            .save(path)
            .with_context(|| format!("Failed to save installations to {}", path.display()))?;
    }

    registry.validate()?;
    Ok(registry)
}

/// Wrapper for the installation called `name`, or for the only configured
/// installation when no name is given.
pub fn select(registry: &Registry, name: Option<&str>) -> BuildWrapper {
    match (name, registry.names().as_slice()) {
        (Some(name), _) => BuildWrapper::new(Some(name)),
        (None, [only]) => BuildWrapper::new(Some(*only)),
        (None, _) => BuildWrapper::default(),
    }
}

/// Set up the selected installation on this machine.
pub fn set_up(name: Option<&str>) -> Result<BuildEnvironment> {
    let config = Config::load()?;
    let registry = load_registry()?;

    let wrapper = select(&registry, name);
    wrapper.validate(&registry)?;

    let node = LocalNode::new(LOCAL_NODE, config.tools_dir()?);
    Ok(wrapper.set_up(&config.client(), &registry, &node)?)
}
