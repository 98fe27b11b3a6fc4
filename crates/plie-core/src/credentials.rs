//! Auth token storage and retrieval.
//!
//! A single bearer token is persisted under the fixed key `authToken`.
//! The file-backed store writes `<base>/credentials.json` with restricted
//! permissions (0600). Tokens are never logged or displayed in full.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::StorageError;

/// Storage key of the bearer token.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Future returned by every storage operation.
pub type StoreFuture<'a, T> = BoxFuture<'a, Result<T, StorageError>>;

/// Durable key-value persistence for the auth token.
///
/// All operations may suspend on I/O and must be awaited before dependent
/// logic proceeds.
pub trait CredentialStore: Send + Sync {
    /// Replaces the stored token.
    fn put<'a>(&'a self, token: &'a str) -> StoreFuture<'a, ()>;
    /// Reads the stored token, if any.
    fn get(&self) -> StoreFuture<'_, Option<String>>;
    /// Removes the stored token. Clearing an empty store succeeds.
    fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Returns a log-safe prefix of a token.
pub fn redact_token(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    format!("{prefix}…")
}

// ============================================================================
// File store
// ============================================================================

/// On-disk shape of the credentials file.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(rename = "authToken", default, skip_serializing_if = "Option::is_none")]
    auth_token: Option<String>,
}

/// Credential store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn run_blocking<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, StorageError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || op(&path))
            .await
            .map_err(|e| StorageError::new(format!("storage task failed: {e}")))?
    }
}

impl CredentialStore for FileCredentialStore {
    fn put<'a>(&'a self, token: &'a str) -> StoreFuture<'a, ()> {
        let token = token.to_string();
        Box::pin(self.run_blocking(move |path| write_token(path, &token)))
    }

    fn get(&self) -> StoreFuture<'_, Option<String>> {
        Box::pin(self.run_blocking(read_token))
    }

    fn clear(&self) -> StoreFuture<'_, ()> {
        Box::pin(self.run_blocking(remove_token))
    }
}

fn read_token(path: &Path) -> Result<Option<String>, StorageError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StorageError::new(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };

    let file: CredentialFile = serde_json::from_str(&contents)
        .map_err(|e| StorageError::new(format!("failed to parse {}: {e}", path.display())))?;
    Ok(file.auth_token.filter(|t| !t.is_empty()))
}

fn write_token(path: &Path, token: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            StorageError::new(format!("failed to create {}: {e}", parent.display()))
        })?;
    }

    let file = CredentialFile {
        auth_token: Some(token.to_string()),
    };
    let contents = serde_json::to_string_pretty(&file)
        .map_err(|e| StorageError::new(format!("failed to serialize credentials: {e}")))?;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut handle = options
        .open(path)
        .map_err(|e| StorageError::new(format!("failed to open {}: {e}", path.display())))?;
    handle
        .write_all(contents.as_bytes())
        .map_err(|e| StorageError::new(format!("failed to write {}: {e}", path.display())))
}

fn remove_token(path: &Path) -> Result<(), StorageError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::new(format!(
            "failed to remove {}: {e}",
            path.display()
        ))),
    }
}

// ============================================================================
// Memory store
// ============================================================================

/// In-process credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn put<'a>(&'a self, token: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
            Ok(())
        })
    }

    fn get(&self) -> StoreFuture<'_, Option<String>> {
        Box::pin(async move {
            Ok(self
                .token
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone())
        })
    }

    fn clear(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
            Ok(())
        })
    }
}

// ============================================================================
// Credentials handle (store + synchronous cache)
// ============================================================================

/// Handle to the credential store plus an in-memory token cache.
///
/// The cache is what the gateway reads synchronously when attaching the
/// bearer header; it is refreshed by every successful `get`/`put`/`clear`.
#[derive(Clone)]
pub struct Credentials {
    store: Arc<dyn CredentialStore>,
    cache: Arc<RwLock<Option<String>>>,
    timeout: Duration,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("cached", &self.cached().as_deref().map(redact_token))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            cache: Arc::new(RwLock::new(None)),
            timeout: Duration::from_millis(Config::DEFAULT_STORAGE_TIMEOUT_MS),
        }
    }

    /// Sets the upper bound for each storage operation.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Persists the token, then updates the cache.
    ///
    /// # Errors
    /// Returns an error if the token is empty or the store write fails.
    pub async fn put(&self, token: &str) -> Result<(), StorageError> {
        if token.trim().is_empty() {
            return Err(StorageError::new("refusing to store an empty token"));
        }
        self.bounded(self.store.put(token)).await?;
        self.set_cached(Some(token.to_string()));
        tracing::debug!(token = %redact_token(token), "stored auth token");
        Ok(())
    }

    /// Reads the token from the store, refreshing the cache.
    ///
    /// Read failures are treated as "absent" so the caller can still render
    /// a logged-out screen.
    pub async fn get(&self) -> Option<String> {
        match self.bounded(self.store.get()).await {
            Ok(token) => {
                let token = token.filter(|t| !t.is_empty());
                self.set_cached(token.clone());
                token
            }
            Err(err) => {
                tracing::warn!(error = %err, "credential read failed; treating as logged out");
                self.set_cached(None);
                None
            }
        }
    }

    /// Removes the token from the store, then from the cache.
    ///
    /// # Errors
    /// Returns an error if the store cannot be cleared; the cache is left
    /// untouched in that case.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.bounded(self.store.clear()).await?;
        self.set_cached(None);
        tracing::debug!("cleared auth token");
        Ok(())
    }

    /// Synchronous read of the cached token.
    pub fn cached(&self) -> Option<String> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drops the cached token without touching the store.
    pub fn clear_cached(&self) {
        self.set_cached(None);
    }

    fn set_cached(&self, token: Option<String>) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    async fn bounded<T>(&self, fut: StoreFuture<'_, T>) -> Result<T, StorageError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|elapsed| StorageError::new(format!("storage operation timed out ({elapsed})")))?
    }
}

#[cfg(test)]
mod tests {
    use std::future;

    use tempfile::tempdir;

    use super::*;

    /// Store whose every operation fails.
    struct BrokenStore;

    impl CredentialStore for BrokenStore {
        fn put<'a>(&'a self, _token: &'a str) -> StoreFuture<'a, ()> {
            Box::pin(async { Err(StorageError::new("read-only")) })
        }
        fn get(&self) -> StoreFuture<'_, Option<String>> {
            Box::pin(async { Err(StorageError::new("corrupt")) })
        }
        fn clear(&self) -> StoreFuture<'_, ()> {
            Box::pin(async { Err(StorageError::new("read-only")) })
        }
    }

    /// Store that never completes.
    struct StuckStore;

    impl CredentialStore for StuckStore {
        fn put<'a>(&'a self, _token: &'a str) -> StoreFuture<'a, ()> {
            Box::pin(future::pending())
        }
        fn get(&self) -> StoreFuture<'_, Option<String>> {
            Box::pin(future::pending())
        }
        fn clear(&self) -> StoreFuture<'_, ()> {
            Box::pin(future::pending())
        }
    }

    #[tokio::test]
    async fn test_put_then_get_returns_token() {
        let creds = Credentials::new(Arc::new(MemoryCredentialStore::new()));
        for token in ["abc", "eyJhbGciOi.payload.sig", "ünïcødé"] {
            creds.put(token).await.unwrap();
            assert_eq!(creds.get().await.as_deref(), Some(token));
        }
    }

    #[tokio::test]
    async fn test_clear_then_get_is_absent() {
        let creds = Credentials::new(Arc::new(MemoryCredentialStore::with_token("abc")));
        creds.clear().await.unwrap();
        assert_eq!(creds.get().await, None);
        assert_eq!(creds.cached(), None);
    }

    #[tokio::test]
    async fn test_put_populates_cache() {
        let creds = Credentials::new(Arc::new(MemoryCredentialStore::new()));
        assert_eq!(creds.cached(), None);
        creds.put("abc").await.unwrap();
        assert_eq!(creds.cached().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_put_rejects_empty_token() {
        let creds = Credentials::new(Arc::new(MemoryCredentialStore::new()));
        assert!(creds.put("  ").await.is_err());
        assert_eq!(creds.get().await, None);
    }

    #[tokio::test]
    async fn test_get_failure_fails_open() {
        let creds = Credentials::new(Arc::new(BrokenStore));
        assert_eq!(creds.get().await, None);
    }

    #[tokio::test]
    async fn test_put_and_clear_failures_are_surfaced() {
        let creds = Credentials::new(Arc::new(BrokenStore));
        assert!(creds.put("abc").await.is_err());
        assert!(creds.clear().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_storage_is_bounded() {
        let creds = Credentials::new(Arc::new(StuckStore)).with_timeout(Duration::from_millis(50));
        let err = creds.put("abc").await.unwrap_err();
        assert!(err.message.contains("timed out"));
        assert_eq!(creds.get().await, None);
    }

    #[tokio::test]
    async fn test_file_store_roundtrip_and_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");

        let store = FileCredentialStore::new(&path);
        store.put("abc").await.unwrap();

        // A fresh instance (as after a process restart) sees the same token.
        let reopened = FileCredentialStore::new(&path);
        assert_eq!(reopened.get().await.unwrap().as_deref(), Some("abc"));

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"authToken\""));

        reopened.clear().await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);
        // Clearing twice is fine.
        reopened.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_absent() {
        let dir = tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        assert_eq!(store.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_fails_open_through_handle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "not json").unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(store.get().await.is_err());

        let creds = Credentials::new(Arc::new(store));
        assert_eq!(creds.get().await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_uses_restricted_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        FileCredentialStore::new(&path).put("abc").await.unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_redact_token_keeps_prefix_only() {
        assert_eq!(redact_token("abcdefghijkl"), "abcdef…");
        assert_eq!(redact_token("ab"), "ab…");
    }
}
