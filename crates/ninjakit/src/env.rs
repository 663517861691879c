//! Environment contributions for build subprocesses.
//!
//! An auto-installed tool is exposed by prepending its directory to `PATH`.
//! The contribution uses the `PATH+NAME` key convention: the value is
//! prepended to `PATH` when the contribution is applied, rather than
//! replacing it.

use std::collections::BTreeMap;

/// Key under which the tool directory is contributed.
pub const PATH_KEY: &str = "PATH+NINJA";

/// Environment entries contributed to a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvContribution {
    entries: BTreeMap<String, String>,
}

impl EnvContribution {
    /// The raw entries, keyed by variable name.
    #[must_use]
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Whether nothing is contributed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value contributed for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Merge into `env`.
    ///
    /// `PATH+NAME` entries are prepended to the variable before the `+`
    /// using `separator`; other entries overwrite.
    pub fn apply(&self, env: &mut BTreeMap<String, String>, separator: char) {
        for (key, value) in &self.entries {
            match key.split_once('+') {
                Some((variable, _)) => {
                    let merged = match env.get(variable) {
                        Some(existing) if !existing.is_empty() => {
                            format!("{value}{separator}{existing}")
                        }
                        _ => value.clone(),
                    };
                    env.insert(variable.to_string(), merged);
                }
                None => {
                    env.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

/// Compute the environment contribution for a tool whose executable is `home`.
///
/// Only auto-installed tools contribute; a fixed installation is expected to
/// be reachable already. The directory part is split off at the last `/`,
/// or at the last `\` past the drive prefix, since the node computing it may
/// run a different OS than the one that will use it.
#[must_use]
pub fn contribute_env(home: &str, auto_installed: bool) -> EnvContribution {
    let mut contribution = EnvContribution::default();
    if !auto_installed {
        return contribution;
    }

    if let Some(dir) = parent_dir(home) {
        contribution
            .entries
            .insert(PATH_KEY.to_string(), dir.to_string());
    }
    contribution
}

fn parent_dir(path: &str) -> Option<&str> {
    let idx = match path.rfind('/') {
        Some(idx) => idx,
        None => path.rfind('\\').filter(|&idx| idx > 1)?,
    };
    Some(&path[..idx])
}
