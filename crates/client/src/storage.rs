//! Shared JSON-file persistence helpers.
//!
//! Every durable client record (credentials, cart, delivery location) is a
//! single named JSON file: read once at startup, rewritten in full after
//! every mutation.

use std::io;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors from the durable stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stored record could not be decoded.
    #[error("storage decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Read and decode a JSON record, returning `None` if the file is absent.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Encode and write a JSON record, creating parent directories as needed.
///
/// With `restrict` set, the file is created owner-readable only (0600 on
/// unix) before the contents are written. Used for the credential record.
pub(crate) async fn write_json<T: Serialize>(
    path: &Path,
    value: &T,
    restrict: bool,
) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let bytes = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, &bytes).await?;

    if restrict {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
        }
    }

    Ok(())
}

/// Delete a record, treating an already-absent file as success.
pub(crate) async fn delete(path: &Path) -> Result<(), StoreError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
