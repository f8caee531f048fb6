//! Common types shared across CLI commands.

use clap::ValueEnum;

use canopymap::provider::ProviderKind;

/// Map provider selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum ProviderArg {
    /// Globe-style satellite imagery with pin markers
    Satellite,
    /// Hybrid satellite imagery with circle markers and info windows
    Hybrid,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Satellite => ProviderKind::Satellite,
            ProviderArg::Hybrid => ProviderKind::Hybrid,
        }
    }
}
