use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "brain-install")]
#[command(about = "Install the brain agent kit into AI coding tools", long_about = None)]
#[command(version = env!("BRAIN_INSTALL_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Tool descriptor file (defaults to the embedded set)
    #[arg(long)]
    pub descriptors: Option<PathBuf>,

    /// State directory for install manifests
    #[arg(long = "state-dir")]
    pub state_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and place the kit for the listed tools (or all declared)
    Install {
        /// Comma-separated tool names
        #[arg(long, value_delimiter = ',')]
        tools: Vec<String>,

        /// Install scope (defaults to each tool's default scope)
        #[arg(long)]
        scope: Option<String>,

        /// Template source directory (defaults to the current directory)
        #[arg(long)]
        source: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Reverse installs using their manifests
    Uninstall {
        /// Comma-separated tool names
        #[arg(long, value_delimiter = ',')]
        tools: Vec<String>,

        /// Scope the kit was installed under
        #[arg(long)]
        scope: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Report which tools look like they have the kit installed
    Detect {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Validate a tool descriptor file
    Validate {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// List the tools the descriptor set declares
    List {
        #[command(flatten)]
        common: CommonArgs,
    },
}
