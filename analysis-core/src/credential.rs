//! Provider credential storage.
//!
//! The credential is read on every analysis call. [`CredentialStore`] keeps
//! it cached in memory and persisted as one raw entry in a storage directory;
//! [`StaticCredential`] serves a key resolved once from configuration.

use secrecy::{ExposeSecret, Secret};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

/// Storage key (and file name) of the persisted credential.
pub const CREDENTIAL_STORAGE_KEY: &str = "google_ai_api_key";

/// Every Google AI API key starts with this prefix.
pub const API_KEY_PREFIX: &str = "AIza";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Please enter your Google AI API key")]
    Empty,

    #[error("Google AI API keys should start with 'AIza'")]
    InvalidPrefix,

    #[error("Invalid API key. Please check and try again.")]
    Rejected,

    #[error("Failed to access credential storage: {0}")]
    Storage(#[from] io::Error),
}

/// A provider API key. Never printed by `Debug`.
#[derive(Debug, Clone)]
pub struct Credential(Secret<String>);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Secret::new(key.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Anything able to hand out the current credential.
pub trait CredentialSource: Send + Sync {
    fn credential(&self) -> Option<Credential>;
}

/// Check that a user-supplied key is plausibly a provider key.
///
/// Surrounding whitespace is dropped. Liveness is a separate network check,
/// see `GeminiTextProvider::verify_credential`.
pub fn validate_format(key: &str) -> Result<Credential, CredentialError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(CredentialError::Empty);
    }
    if !key.starts_with(API_KEY_PREFIX) {
        return Err(CredentialError::InvalidPrefix);
    }
    Ok(Credential::new(key))
}

/// Credential fixed at startup, e.g. the relay's own provider key.
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(Option<Credential>);

impl StaticCredential {
    pub fn new(credential: Option<Credential>) -> Self {
        Self(credential)
    }
}

impl CredentialSource for StaticCredential {
    fn credential(&self) -> Option<Credential> {
        self.0.clone()
    }
}

/// In-memory cache backed by a single file in a storage directory.
#[derive(Debug)]
pub struct CredentialStore {
    dir: PathBuf,
    cached: RwLock<Option<Credential>>,
}

impl CredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cached: RwLock::new(None),
        }
    }

    /// Location of the persisted entry.
    pub fn path(&self) -> PathBuf {
        self.dir.join(CREDENTIAL_STORAGE_KEY)
    }

    /// Cache the credential and persist it.
    pub fn set_credential(&self, credential: Credential) -> Result<(), CredentialError> {
        fs::create_dir_all(&self.dir)?;
        write_private(&self.path(), credential.expose())?;

        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = Some(credential);
        tracing::info!(path = %self.path().display(), "Stored provider credential");
        Ok(())
    }

    /// Cached credential, else the persisted one, else `None`.
    ///
    /// Unreadable storage is logged and treated as absent.
    pub fn get_credential(&self) -> Option<Credential> {
        if let Some(credential) = self
            .cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Some(credential);
        }

        let loaded = match self.load() {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(path = %self.path().display(), error = %e, "Failed to read stored credential");
                None
            }
        };

        if let Some(credential) = &loaded {
            *self.cached.write().unwrap_or_else(PoisonError::into_inner) =
                Some(credential.clone());
        }
        loaded
    }

    /// Forget the credential, both cached and persisted.
    pub fn clear_credential(&self) -> Result<(), CredentialError> {
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = None;
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn load(&self) -> io::Result<Option<Credential>> {
        match fs::read_to_string(self.path()) {
            Ok(raw) => {
                let key = raw.trim();
                Ok((!key.is_empty()).then(|| Credential::new(key)))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl CredentialSource for CredentialStore {
    fn credential(&self) -> Option<Credential> {
        self.get_credential()
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &str) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &str) -> io::Result<()> {
    fs::write(path, contents)
}
