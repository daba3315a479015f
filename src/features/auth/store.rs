//! Durable storage for the single bearer credential.
//!
//! The store is pure persistence: it never inspects the credential's shape or
//! expiry. Absence of the entry means "never logged in". The file-backed store
//! scopes its entry by API origin so two backends never share a credential.

use crate::app_lib::AppError;
use secrecy::{ExposeSecret, SecretString};
use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use tracing::debug;
use url::Url;

/// Name of the single persisted entry.
pub const CREDENTIAL_ENTRY: &str = "jwt_token";

/// Swappable backing store for the bearer credential.
pub trait CredentialStore: Send + Sync {
    /// Persists `credential`, replacing any previous value.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the backing store cannot be written.
    fn save(&self, credential: &SecretString) -> Result<(), AppError>;

    /// Reads the persisted credential, `None` when absent.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the backing store cannot be read.
    fn load(&self) -> Result<Option<SecretString>, AppError>;

    /// Removes the entry. Clearing an empty store succeeds.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the entry exists but cannot be removed.
    fn clear(&self) -> Result<(), AppError>;
}

/// One file per origin under a base directory: `<dir>/<origin>/jwt_token`.
#[derive(Clone, Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store scoped to the origin (scheme, host, port) of `api_base_url`.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the URL cannot be parsed.
    pub fn for_origin(base_dir: &Path, api_base_url: &str) -> Result<Self, AppError> {
        let origin = origin_key(api_base_url)?;
        Ok(Self {
            path: base_dir.join(origin).join(CREDENTIAL_ENTRY),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, credential: &SecretString) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| storage_error("create store directory", &err))?;
        }

        let mut file = open_private(&self.path).map_err(|err| storage_error("open credential", &err))?;
        file.write_all(credential.expose_secret().as_bytes())
            .map_err(|err| storage_error("write credential", &err))?;

        debug!(path = %self.path.display(), "credential persisted");
        Ok(())
    }

    fn load(&self) -> Result<Option<SecretString>, AppError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(SecretString::from(token.to_string())))
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(storage_error("read credential", &err)),
        }
    }

    fn clear(&self) -> Result<(), AppError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "credential removed");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_error("remove credential", &err)),
        }
    }
}

/// Process-local store, used by tests and embedders without a filesystem.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<SecretString>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_credential(credential: SecretString) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, credential: &SecretString) -> Result<(), AppError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(credential.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<SecretString>, AppError> {
        Ok(self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn clear(&self) -> Result<(), AppError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Filesystem-safe key for the origin of `url`, e.g. `http_localhost_8080`.
fn origin_key(url: &str) -> Result<String, AppError> {
    let parsed = Url::parse(url.trim())
        .map_err(|err| AppError::Config(format!("Invalid API base URL: {err}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| AppError::Config("API base URL has no host.".to_string()))?;
    let port = parsed.port_or_known_default().unwrap_or_default();

    let key: String = format!("{}_{host}_{port}", parsed.scheme())
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    Ok(key)
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

fn storage_error(action: &str, err: &std::io::Error) -> AppError {
    AppError::Storage(format!("Failed to {action}: {err}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_store_dir() -> PathBuf {
        std::env::temp_dir().join(format!("zerotrust-store-{}", Uuid::new_v4().simple()))
    }

    struct DirGuard(PathBuf);

    impl Drop for DirGuard {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn origin_key_includes_scheme_host_and_port() {
        assert_eq!(
            origin_key("http://localhost:8080/api").unwrap(),
            "http_localhost_8080"
        );
        assert_eq!(
            origin_key("https://zt.example.com/api").unwrap(),
            "https_zt.example.com_443"
        );
        assert!(origin_key("not a url").is_err());
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = temp_store_dir();
        let _guard = DirGuard(dir.clone());
        let store = FileCredentialStore::for_origin(&dir, "http://localhost:8080/api").unwrap();

        assert!(store.load().unwrap().is_none());

        store
            .save(&SecretString::from("abc.def.ghi".to_string()))
            .unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.expose_secret(), "abc.def.ghi");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn file_store_is_scoped_by_origin() {
        let dir = temp_store_dir();
        let _guard = DirGuard(dir.clone());
        let local = FileCredentialStore::for_origin(&dir, "http://localhost:8080/api").unwrap();
        let other = FileCredentialStore::for_origin(&dir, "http://localhost:9090/api").unwrap();

        local
            .save(&SecretString::from("local-token".to_string()))
            .unwrap();

        assert!(other.load().unwrap().is_none());
        assert_ne!(local.path(), other.path());
    }

    #[test]
    fn blank_entry_is_treated_as_absent() {
        let dir = temp_store_dir();
        let _guard = DirGuard(dir.clone());
        let store = FileCredentialStore::for_origin(&dir, "http://localhost:8080/api").unwrap();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "  \n").unwrap();

        assert!(store.load().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn file_store_writes_owner_only_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = temp_store_dir();
        let _guard = DirGuard(dir.clone());
        let store = FileCredentialStore::for_origin(&dir, "http://localhost:8080/api").unwrap();
        store
            .save(&SecretString::from("abc.def.ghi".to_string()))
            .unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().unwrap().is_none());
        store
            .save(&SecretString::from("abc".to_string()))
            .unwrap();
        assert_eq!(store.load().unwrap().unwrap().expose_secret(), "abc");
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
