use crate::Context;
use crate::ui;
use anyhow::Result;

/// Set up an installation and report where the executable is.
pub fn run(ctx: &Context, name: Option<&str>) -> Result<()> {
    let environment = super::set_up(name)?;
    let installation = &environment.installation;

    if ctx.quiet {
        println!("{}", installation.home);
        return Ok(());
    }

    ui::success(&format!("Ninja installation '{}' is ready", installation.name));
    ui::kv("Executable", &installation.home);
    ui::kv(
        "Source",
        if installation.auto_installed {
            "provisioned on demand"
        } else {
            "fixed location"
        },
    );
    if let Some(dir) = environment.contribution.get(ninjakit::env::PATH_KEY) {
        ui::kv("Adds to PATH", dir);
    }
    Ok(())
}
