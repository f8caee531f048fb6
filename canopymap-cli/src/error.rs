//! CLI error types.

use thiserror::Error;

use canopymap::credential::CredentialStoreError;
use canopymap::provider::ProviderError;

/// Errors surfaced to the CLI user.
#[derive(Debug, Error)]
pub enum CliError {
    /// A provider failed to mount.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The credential store could not be read or written.
    #[error("credential store error: {0}")]
    CredentialStore(#[from] CredentialStoreError),

    /// Invalid user input.
    #[error("{0}")]
    Input(String),

    /// Terminal interaction failed.
    #[error("terminal error: {0}")]
    Terminal(#[from] dialoguer::Error),
}
