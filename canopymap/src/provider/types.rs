//! Shared types for the provider adapters.

use thiserror::Error;

use crate::credential::{Credential, CredentialKind};

/// Which provider implementation an adapter wraps.
///
/// The selector holds this tag and constructs the matching adapter; instance
/// state is never shared between variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// The satellite provider (globe-style imagery, pin markers).
    Satellite,
    /// The hybrid/earth provider (satellite+labels imagery, circle markers).
    Hybrid,
}

impl ProviderKind {
    /// The credential kind this provider requires.
    pub fn credential_kind(&self) -> CredentialKind {
        match self {
            ProviderKind::Satellite => CredentialKind::Satellite,
            ProviderKind::Hybrid => CredentialKind::Hybrid,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Satellite => write!(f, "satellite"),
            ProviderKind::Hybrid => write!(f, "hybrid"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "satellite" => Ok(ProviderKind::Satellite),
            "hybrid" => Ok(ProviderKind::Hybrid),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Mount-time configuration threaded into an adapter at construction.
///
/// The credential is an explicitly passed, caller-owned value; there is no
/// ambient credential cache inside the engine.
#[derive(Debug, Clone)]
pub struct MountConfig {
    /// Identifier of the host container the surface renders into.
    pub container: String,
    /// CSS height of the surface.
    pub height: String,
    /// Provider access token; `None` blocks mounting entirely.
    pub credential: Option<Credential>,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            container: "map-root".to_string(),
            height: "500px".to_string(),
            credential: None,
        }
    }
}

/// Errors from mounting a provider adapter.
///
/// Per-marker render failures never surface here; they are logged and the
/// affected marker is skipped so one bad location cannot blank the map.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    /// No credential is available; the caller should render a
    /// credential-entry affordance instead of a map.
    #[error("no credential available for this provider")]
    CapabilityUnavailable,

    /// The native SDK rejected setup (library load, auth, network).
    /// Recoverable by retrying after the credential changes.
    #[error("provider initialization failed: {0}")]
    InitializationFailure(String),
}
