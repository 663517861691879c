use crate::Context;
use crate::paths;
use crate::ui;
use anyhow::{Context as _, Result, bail};
use colored::Colorize;
use ninjakit::ToolInstallation;

/// List configured installations.
pub fn list(ctx: &Context) -> Result<()> {
    let registry = super::load_registry()?;

    if ctx.quiet {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    ui::header("Ninja Installations");
    println!();
    for installation in registry.installations() {
        println!("  {}", installation.name.bold());
        if let Some(home) = &installation.home {
            ui::kv("    Home", home);
        }
        match installation.installer_id().filter(|_| installation.is_auto_install()) {
            Some(id) => ui::kv("    Install from", id),
            None => {
                let located = installation
                    .locate()
                    .map_or_else(|| "not found".to_string(), |path| path.display().to_string());
                ui::kv("    Found at", &located);
            }
        }
    }
    Ok(())
}

/// Add an installation.
pub fn add(ctx: &Context, name: &str, home: Option<&str>, installer: Option<&str>) -> Result<()> {
    match (home, installer) {
        (None, None) => bail!("Installation '{name}' needs --home or --installer"),
        (Some(_), Some(_)) => bail!("Installation '{name}' takes either --home or --installer"),
        _ => {}
    }

    let path = paths::installations_file()?;
    let mut registry = super::load_registry()?;

    let mut installation = ToolInstallation::new(name, home);
    if let Some(id) = installer {
        installation = installation.with_installer(id);
    }
    registry.add(installation)?;
    registry
        .save(&path)
        .with_context(|| format!("Failed to save installations to {}", path.display()))?;

    if !ctx.quiet {
        ui::success(&format!("Added Ninja installation '{}'", name.trim()));
    }
    Ok(())
}

/// Remove an installation.
pub fn rm(ctx: &Context, name: &str) -> Result<()> {
    let path = paths::installations_file()?;
    let mut registry = super::load_registry()?;

    if !registry.remove(name) {
        bail!("Ninja installation '{name}' not found");
    }
    registry
        .save(&path)
        .with_context(|| format!("Failed to save installations to {}", path.display()))?;

    if !ctx.quiet {
        ui::success(&format!("Removed Ninja installation '{name}'"));
    }
    Ok(())
}
