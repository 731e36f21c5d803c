//! Durable credential store contract and implementations.
//!
//! The store is a durable mirror of the session's token pair, used only for
//! cold-start rehydration and by the gateway's recovery protocol. It must
//! survive process restarts and must not be readable by other users; the
//! file-backed implementation writes the record owner-readable only.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

pub use crate::storage::StoreError;

/// A persisted access/refresh token pair.
///
/// Implements `Debug` manually to redact both tokens.
#[derive(Clone)]
pub struct TokenPair {
    /// Short-lived bearer credential.
    pub access_token: SecretString,
    /// Long-lived refresh credential.
    pub refresh_token: SecretString,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// On-disk record shape. Kept separate from [`TokenPair`] so the public type
/// never exposes serializable secrets by accident.
#[derive(Serialize, Deserialize)]
struct StoredTokens {
    access_token: String,
    refresh_token: String,
}

/// Contract for durable credential persistence.
///
/// Semantics required by the gateway:
/// - `save` replaces the whole record atomically from the caller's view
/// - `get` returns `None` when no credentials have ever been saved (or they
///   were deleted)
/// - `delete` is idempotent
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a token pair, replacing any existing record.
    async fn save(&self, tokens: &TokenPair) -> Result<(), StoreError>;

    /// Read the persisted token pair, if any.
    async fn get(&self) -> Result<Option<TokenPair>, StoreError>;

    /// Remove the persisted record. Succeeds if none exists.
    async fn delete(&self) -> Result<(), StoreError>;
}

/// File-backed credential store (one JSON record, mode 0600 on unix).
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn save(&self, tokens: &TokenPair) -> Result<(), StoreError> {
        let record = StoredTokens {
            access_token: tokens.access_token.expose_secret().to_owned(),
            refresh_token: tokens.refresh_token.expose_secret().to_owned(),
        };
        crate::storage::write_json(&self.path, &record, true).await
    }

    async fn get(&self) -> Result<Option<TokenPair>, StoreError> {
        let record: Option<StoredTokens> = crate::storage::read_json(&self.path).await?;
        Ok(record.map(|r| TokenPair {
            access_token: SecretString::from(r.access_token),
            refresh_token: SecretString::from(r.refresh_token),
        }))
    }

    async fn delete(&self) -> Result<(), StoreError> {
        crate::storage::delete(&self.path).await
    }
}

/// In-memory credential store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryCredentialStore {
    tokens: Arc<RwLock<Option<TokenPair>>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn save(&self, tokens: &TokenPair) -> Result<(), StoreError> {
        *self.tokens.write().await = Some(tokens.clone());
        Ok(())
    }

    async fn get(&self) -> Result<Option<TokenPair>, StoreError> {
        Ok(self.tokens.read().await.clone())
    }

    async fn delete(&self) -> Result<(), StoreError> {
        *self.tokens.write().await = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pair(access: &str, refresh: &str) -> TokenPair {
        TokenPair {
            access_token: SecretString::from(access.to_owned()),
            refresh_token: SecretString::from(refresh.to_owned()),
        }
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryCredentialStore::new();
        assert!(store.get().await.unwrap().is_none());

        store.save(&pair("a1", "r1")).await.unwrap();
        let loaded = store.get().await.unwrap().unwrap();
        assert_eq!(loaded.access_token.expose_secret(), "a1");
        assert_eq!(loaded.refresh_token.expose_secret(), "r1");

        store.delete().await.unwrap();
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let path = std::env::temp_dir()
            .join("khaja-credentials-test")
            .join("credentials.json");
        let store = FileCredentialStore::new(&path);

        store.save(&pair("access-1", "refresh-1")).await.unwrap();
        let loaded = store.get().await.unwrap().unwrap();
        assert_eq!(loaded.access_token.expose_secret(), "access-1");

        // Saving again replaces the record
        store.save(&pair("access-2", "refresh-1")).await.unwrap();
        let loaded = store.get().await.unwrap().unwrap();
        assert_eq!(loaded.access_token.expose_secret(), "access-2");

        store.delete().await.unwrap();
        assert!(store.get().await.unwrap().is_none());
        // Idempotent delete
        store.delete().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let path = std::env::temp_dir()
            .join("khaja-credentials-perm-test")
            .join("credentials.json");
        let store = FileCredentialStore::new(&path);
        store.save(&pair("a", "r")).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_token_pair_debug_redacts() {
        let tokens = pair("top-secret-access", "top-secret-refresh");
        let debug_output = format!("{tokens:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("top-secret-access"));
    }
}
