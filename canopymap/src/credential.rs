//! Credential gate for map provider access tokens.
//!
//! Each provider requires an opaque access token before a map surface may be
//! created. Tokens are supplied once by the user, cached for the session, and
//! reused across mounts. This is a local development convenience, not a
//! security boundary; even so, persisted values are treated as low-trust input
//! and are never written to logs: [`Credential`] redacts its value in both
//! `Debug` and `Display` output.
//!
//! Two stores are provided: [`MemoryCredentialStore`] for session-only use and
//! tests, and [`FileCredentialStore`] which persists tokens as JSON under the
//! user configuration directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;

/// An opaque provider access token.
///
/// The wrapped value is only reachable through [`Credential::expose`]; the
/// `Debug` and `Display` implementations redact it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token value, trimming surrounding whitespace.
    ///
    /// Returns `None` for an empty (or all-whitespace) value, matching the
    /// input affordance which ignores empty submissions.
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The raw token value, for handing to a backend.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

/// Which provider a credential unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    /// Access token for the satellite provider.
    Satellite,
    /// API key for the hybrid/earth provider.
    Hybrid,
}

impl CredentialKind {
    /// Storage key used in the persisted credential file.
    pub fn storage_key(&self) -> &'static str {
        match self {
            CredentialKind::Satellite => "satellite_access_token",
            CredentialKind::Hybrid => "hybrid_api_key",
        }
    }
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialKind::Satellite => write!(f, "satellite"),
            CredentialKind::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Errors from the persisted credential store.
#[derive(Debug, Error)]
pub enum CredentialStoreError {
    /// No user configuration directory could be determined.
    #[error("no configuration directory available on this system")]
    NoConfigDir,

    /// Reading or writing the credential file failed.
    #[error("credential file I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The credential file exists but is not valid JSON.
    #[error("credential file at {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Key-value storage for provider credentials.
pub trait CredentialStore: Send + Sync {
    /// Look up the credential for a provider, if one has been supplied.
    fn get(&self, kind: CredentialKind) -> Option<Credential>;

    /// Persist a credential for a provider for the remainder of the session.
    fn set(&self, kind: CredentialKind, credential: Credential) -> Result<(), CredentialStoreError>;
}

/// Session-only credential store.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<CredentialKind, Credential>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, kind: CredentialKind) -> Option<Credential> {
        self.entries.lock().get(&kind).cloned()
    }

    fn set(&self, kind: CredentialKind, credential: Credential) -> Result<(), CredentialStoreError> {
        self.entries.lock().insert(kind, credential);
        Ok(())
    }
}

/// File-backed credential store.
///
/// The file is read once when the store is opened; `set` updates both the
/// in-memory view and the file.
pub struct FileCredentialStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileCredentialStore {
    /// Open the store at the default per-user location.
    pub fn open_default() -> Result<Self, CredentialStoreError> {
        let dir = dirs::config_dir().ok_or(CredentialStoreError::NoConfigDir)?;
        Self::open(dir.join("canopymap").join("credentials.json"))
    }

    /// Open the store at a specific path, loading existing entries.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CredentialStoreError> {
        let path = path.into();
        let entries = Self::load(&path)?;
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<HashMap<String, String>, CredentialStoreError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| CredentialStoreError::Malformed {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(source) => Err(CredentialStoreError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), CredentialStoreError> {
        let io_err = |source| CredentialStoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let contents = serde_json::to_string_pretty(entries).map_err(|source| {
            CredentialStoreError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, contents).map_err(io_err)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, kind: CredentialKind) -> Option<Credential> {
        let entries = self.entries.lock();
        entries
            .get(kind.storage_key())
            .and_then(|value| Credential::new(value))
    }

    fn set(&self, kind: CredentialKind, credential: Credential) -> Result<(), CredentialStoreError> {
        let mut entries = self.entries.lock();
        entries.insert(
            kind.storage_key().to_string(),
            credential.expose().to_string(),
        );
        self.persist(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_trims_and_rejects_empty() {
        assert!(Credential::new("   ").is_none());
        assert!(Credential::new("").is_none());
        let cred = Credential::new("  pk.abc123  ").unwrap();
        assert_eq!(cred.expose(), "pk.abc123");
    }

    #[test]
    fn test_credential_debug_and_display_redact_value() {
        let cred = Credential::new("super-secret-token").unwrap();
        assert_eq!(format!("{:?}", cred), "Credential(***)");
        assert_eq!(format!("{}", cred), "***");
        assert!(!format!("{:?}", cred).contains("secret"));
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryCredentialStore::new();
        assert!(store.get(CredentialKind::Satellite).is_none());

        let cred = Credential::new("pk.test").unwrap();
        store.set(CredentialKind::Satellite, cred.clone()).unwrap();
        assert_eq!(store.get(CredentialKind::Satellite), Some(cred));
        assert!(store.get(CredentialKind::Hybrid).is_none());
    }

    #[test]
    fn test_file_store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let store = FileCredentialStore::open(&path).unwrap();
        store
            .set(CredentialKind::Hybrid, Credential::new("AIza-test").unwrap())
            .unwrap();

        let reopened = FileCredentialStore::open(&path).unwrap();
        let cred = reopened.get(CredentialKind::Hybrid).unwrap();
        assert_eq!(cred.expose(), "AIza-test");
        assert!(reopened.get(CredentialKind::Satellite).is_none());
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::open(dir.path().join("nope.json")).unwrap();
        assert!(store.get(CredentialKind::Satellite).is_none());
    }

    #[test]
    fn test_file_store_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileCredentialStore::open(&path),
            Err(CredentialStoreError::Malformed { .. })
        ));
    }

    #[test]
    fn test_storage_keys_are_distinct() {
        assert_ne!(
            CredentialKind::Satellite.storage_key(),
            CredentialKind::Hybrid.storage_key()
        );
    }
}
