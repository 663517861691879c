use crate::Context;
use crate::config::Config;
use crate::ui;
use anyhow::Result;
use colored::Colorize;
use ninjakit::InstallableTool;

/// List the versions the download service offers.
pub fn run(ctx: &Context) -> Result<()> {
    let config = Config::load()?;
    let tools = config.client().installables();

    if tools.is_empty() {
        ui::info("The download service lists no installable Ninja versions.");
        ui::info("Check [manifest] in config.toml, or re-run with -v for details.");
        return Ok(());
    }

    if ctx.quiet {
        for tool in &tools {
            println!("{}", tool.id);
        }
        return Ok(());
    }

    ui::header("Installable Ninja Versions");
    println!();
    for tool in &tools {
        println!("  {:<12} {}", tool.id.bold(), tool.label());
        ui::dim(&format!("    {}", platforms(tool)));
    }
    Ok(())
}

/// Download site OS names a tool is published for.
fn platforms(tool: &InstallableTool) -> String {
    if tool.variants.is_empty() {
        return "no downloads".to_string();
    }
    tool.variants
        .iter()
        .map(|variant| variant.os_site_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
