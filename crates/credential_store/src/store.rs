use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use crate::credential::Credential;
use crate::error::CredentialStoreError;
use crate::paths::{staging_path, TOKEN_KEY};

/// Holder of at most one active credential.
///
/// Implementations are shared between components through `Arc<dyn CredentialStore>`;
/// any component may read, only the session layer writes.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<Credential>, CredentialStoreError>;

    /// Replaces any previously stored credential.
    fn store(&self, credential: &Credential) -> Result<(), CredentialStoreError>;

    /// Removes the credential. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), CredentialStoreError>;

    /// Read failures count as "no credential".
    fn is_present(&self) -> bool {
        matches!(self.load(), Ok(Some(_)))
    }
}

/// In-process store; the credential lives as long as the handle.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialStoreError> {
        Ok(lock_unpoisoned(&self.slot).clone())
    }

    fn store(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        *lock_unpoisoned(&self.slot) = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        lock_unpoisoned(&self.slot).take();
        Ok(())
    }
}

/// JSON file holding `{"token": "..."}`.
///
/// Writes go through a sibling staging file and an atomic rename. A missing or
/// empty file reads as "no credential".
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Option<Map<String, Value>>, CredentialStoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(source) if source.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CredentialStoreError::io(
                    "reading credential file",
                    &self.path,
                    source,
                ))
            }
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str::<Value>(&content)
            .map_err(|source| CredentialStoreError::parse(&self.path, source))?
        {
            Value::Object(document) => Ok(Some(document)),
            _ => Err(CredentialStoreError::NotAnObject {
                path: self.path.clone(),
            }),
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<(), CredentialStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| {
                CredentialStoreError::io("creating credential directory", parent, source)
            })?;
        }

        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|source| CredentialStoreError::serialize(&self.path, source))?;
        let staging = staging_path(&self.path);

        let mut file = create_private_file(&staging).map_err(|source| {
            CredentialStoreError::io("creating staging credential file", &staging, source)
        })?;
        file.write_all(&bytes).map_err(|source| {
            CredentialStoreError::io("writing staging credential file", &staging, source)
        })?;
        file.sync_all().map_err(|source| {
            CredentialStoreError::io("syncing staging credential file", &staging, source)
        })?;
        drop(file);

        fs::rename(&staging, &self.path).map_err(|source| {
            CredentialStoreError::io("replacing credential file", &self.path, source)
        })
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialStoreError> {
        let Some(document) = self.read_document()? else {
            return Ok(None);
        };

        Ok(document
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .and_then(Credential::new))
    }

    fn store(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        let mut document = self.read_document()?.unwrap_or_default();
        document.insert(
            TOKEN_KEY.to_owned(),
            Value::String(credential.expose().to_owned()),
        );
        self.write_document(&document)?;
        tracing::debug!(path = %self.path.display(), "stored credential");
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "cleared credential");
                Ok(())
            }
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CredentialStoreError::io(
                "removing credential file",
                &self.path,
                source,
            )),
        }
    }
}

#[cfg(unix)]
fn create_private_file(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_private_file(path: &Path) -> std::io::Result<File> {
    File::create(path)
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
