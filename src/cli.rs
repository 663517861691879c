use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "ninja-provision")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Provision the ninja build tool on demand", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Set up an installation on this machine and print the executable
    Provision {
        /// Installation to set up (defaults to the only configured one)
        name: Option<String>,
    },

    /// Print shell exports that put an installation on PATH
    Env {
        /// Installation to set up (defaults to the only configured one)
        name: Option<String>,
    },

    /// List the versions the download service offers
    Installables,

    /// Show which download applies to a platform
    Resolve {
        /// Catalog tool id (e.g. 1.10.0)
        id: String,

        /// OS name as reported by the node (defaults to this machine)
        #[arg(long)]
        os_name: Option<String>,

        /// Architecture as reported by the node (defaults to this machine)
        #[arg(long)]
        os_arch: Option<String>,
    },

    /// Manage configured installations
    #[command(subcommand)]
    Installations(InstallationsCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Installations Commands
// ============================================================================

#[derive(Subcommand)]
pub enum InstallationsCommand {
    /// List configured installations
    List,

    /// Add an installation
    Add {
        /// Installation name
        name: String,

        /// Fixed executable, used as is
        #[arg(long, conflicts_with = "installer", required_unless_present = "installer")]
        home: Option<String>,

        /// Provision on demand from this catalog tool id
        #[arg(long)]
        installer: Option<String>,
    },

    /// Remove an installation
    Rm {
        /// Installation name
        name: String,
    },
}
