//! Provider credential management.
//!
//! Tokens are entered through a hidden prompt and persisted to the per-user
//! credential file. The stored values are never printed; `status` only
//! reports whether a token is present.

use clap::Subcommand;
use console::style;
use dialoguer::Password;

use canopymap::credential::{Credential, CredentialKind, CredentialStore, FileCredentialStore};

use crate::error::CliError;

use super::common::ProviderArg;

/// Credential action subcommands.
#[derive(Debug, Subcommand)]
pub enum TokenAction {
    /// Store a provider token (prompted, input hidden)
    Set {
        /// Provider the token belongs to
        #[arg(value_enum)]
        provider: ProviderArg,
    },
    /// Show which providers have a token stored
    Status,
}

/// Run a token subcommand.
pub fn run(action: TokenAction) -> Result<(), CliError> {
    let store = FileCredentialStore::open_default()?;

    match action {
        TokenAction::Set { provider } => {
            let kind = canopymap::provider::ProviderKind::from(provider).credential_kind();
            let value = Password::new()
                .with_prompt(format!("Token for the {kind} provider"))
                .allow_empty_password(true)
                .interact()?;

            let credential = Credential::new(value)
                .ok_or_else(|| CliError::Input("token must not be empty".to_string()))?;
            store.set(kind, credential)?;
            println!(
                "{} token stored for {} in {}",
                style("✓").green().bold(),
                kind,
                store.path().display()
            );
            Ok(())
        }
        TokenAction::Status => {
            println!("Credential file: {}", store.path().display());
            for kind in [CredentialKind::Satellite, CredentialKind::Hybrid] {
                let status = if store.get(kind).is_some() {
                    style("present").green()
                } else {
                    style("missing").yellow()
                };
                println!("  {:<10} {}", kind.to_string(), status);
            }
            Ok(())
        }
    }
}
