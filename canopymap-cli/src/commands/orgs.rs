//! Planting organization catalog listing.

use clap::{Args, ValueEnum};
use console::style;

use canopymap::catalog::{filter_organizations, organizations, OrgKind};

use crate::error::CliError;

/// Organization type filter for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    /// Non-governmental organizations
    Ngo,
    /// Government programs
    Government,
    /// Community-led initiatives
    Community,
}

impl From<KindArg> for OrgKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Ngo => OrgKind::Ngo,
            KindArg::Government => OrgKind::Government,
            KindArg::Community => OrgKind::Community,
        }
    }
}

#[derive(Debug, Args)]
pub struct OrgsArgs {
    /// Only show organizations of this type
    #[arg(long, value_enum)]
    kind: Option<KindArg>,

    /// Only show organizations whose name or region matches
    #[arg(long)]
    search: Option<String>,
}

/// List catalog organizations, optionally filtered.
pub fn run(args: OrgsArgs) -> Result<(), CliError> {
    let all = organizations();
    let matches = filter_organizations(&all, args.kind.map(Into::into), args.search.as_deref());

    if matches.is_empty() {
        println!("No organizations match.");
        return Ok(());
    }

    for org in &matches {
        println!(
            "{} {} {}",
            style(&org.name).green().bold(),
            style(format!("[{}]", org.kind)).dim(),
            style(&org.region).cyan(),
        );
        println!(
            "  {} trees planted since {}",
            org.trees_planted, org.year_founded
        );
        println!("  {}", org.description);
    }
    println!(
        "\n{} of {} organizations",
        matches.len(),
        all.len()
    );
    Ok(())
}
