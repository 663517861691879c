mod cli;
mod commands;
mod config;
mod paths;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, InstallationsCommand};
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context { quiet: cli.quiet };

    match run(&ctx, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Provision { name } => commands::provision::run(ctx, name.as_deref()),
        Command::Env { name } => commands::env::run(name.as_deref()),
        Command::Installables => commands::installables::run(ctx),
        Command::Resolve {
            id,
            os_name,
            os_arch,
        } => commands::resolve::run(ctx, &id, os_name, os_arch),
        Command::Installations(cmd) => match cmd {
            InstallationsCommand::List => commands::installations::list(ctx),
            InstallationsCommand::Add {
                name,
                home,
                installer,
            } => commands::installations::add(ctx, &name, home.as_deref(), installer.as_deref()),
            InstallationsCommand::Rm { name } => commands::installations::rm(ctx, &name),
        },
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "ninja-provision", &mut io::stdout());
            Ok(())
        }
    }
}

/// Print a failure with the advice for its category
fn report(err: &anyhow::Error) {
    ui::error(&format!("{err:#}"));
    if let Some(err) = err.downcast_ref::<ninjakit::Error>() {
        let category = err.category();
        ui::hint(&format!("{}: {}", category.description(), category.advice()));
        if err.is_transient() {
            ui::hint("This is usually temporary; re-running the command may succeed.");
        }
    }
}
