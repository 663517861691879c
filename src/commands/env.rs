use crate::ui;
use anyhow::Result;
use std::collections::BTreeMap;

/// Print `export` lines for everything the installation changes.
pub fn run(name: Option<&str>) -> Result<()> {
    let environment = super::set_up(name)?;

    let before: BTreeMap<String, String> = std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect();
    let mut after = before.clone();
    environment.build_env_vars(&mut after);

    for line in exports(&before, &after) {
        println!("{line}");
    }
    Ok(())
}

/// Shell statements turning `before` into `after`.
fn exports(before: &BTreeMap<String, String>, after: &BTreeMap<String, String>) -> Vec<String> {
    after
        .iter()
        .filter(|(key, value)| before.get(*key) != Some(*value))
        .map(|(key, value)| format!("export {key}={}", ui::shell_quote(value)))
        .collect()
}
