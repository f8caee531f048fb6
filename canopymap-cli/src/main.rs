//! CanopyMap CLI.
//!
//! Command-line interface to the CanopyMap engine: run the simulated demo,
//! browse the planting-organization catalog, and manage provider
//! credentials.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use console::style;

use commands::{demo, orgs, token};

#[derive(Debug, Parser)]
#[command(
    name = "canopymap",
    version = canopymap::VERSION,
    about = "Reforestation project maps on interchangeable providers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a scripted demo of the engine against the simulated backend
    Demo(demo::DemoArgs),
    /// List planting organizations from the catalog
    Orgs(orgs::OrgsArgs),
    /// Manage provider credentials
    Token {
        #[command(subcommand)]
        action: token::TokenAction,
    },
}

#[tokio::main]
async fn main() {
    canopymap::telemetry::init("info");

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Demo(args) => demo::run(args).await,
        Commands::Orgs(args) => orgs::run(args),
        Commands::Token { action } => token::run(action),
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("error:").red().bold(), e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_reports_library_version() {
        assert_eq!(
            Cli::command().get_version(),
            Some(canopymap::VERSION),
            "binary version tracks the library"
        );
    }
}
