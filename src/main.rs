#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;

use brain_install::cli::{Cli, Commands};
use brain_install::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let exit_code = match &cli.command {
        Commands::Install {
            tools,
            scope,
            source,
            common,
        } => commands::install::execute(tools, scope.as_deref(), source.clone(), common)?,
        Commands::Uninstall {
            tools,
            scope,
            common,
        } => commands::uninstall::execute(tools, scope.as_deref(), common)?,
        Commands::Detect { common } => commands::detect::execute(common)?,
        Commands::Validate { common } => commands::validate::execute(common)?,
        Commands::List { common } => commands::list::execute(common)?,
    };

    std::process::exit(exit_code);
}
