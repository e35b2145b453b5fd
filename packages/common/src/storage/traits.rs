use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::error::StorageError;

/// Listing entry for a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Key-addressed blob storage.
///
/// Backends expose no atomic rename; [`ObjectStore::rename`] is a copy
/// followed by a delete, so both keys exist for a short window.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `key`, replacing any existing object.
    async fn put(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Retrieve all bytes stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Delete the object at `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Copy the object at `src` to `dst`.
    async fn copy(&self, src: &str, dst: &str) -> Result<(), StorageError>;

    /// List objects whose key starts with `prefix`, ordered by key.
    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError>;

    /// Public access URL for `key`. Pure; performs no I/O.
    fn url_for(&self, key: &str) -> String;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.get(key).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Move `src` to `dst` by copy-then-delete.
    ///
    /// If the source cannot be deleted the new copy is removed again so the
    /// object stays reachable only under `src`.
    async fn rename(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        self.copy(src, dst).await?;
        if let Err(e) = self.delete(src).await {
            if let Err(cleanup) = self.delete(dst).await {
                warn!(src, dst, error = %cleanup, "Failed to remove copy after aborted rename");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Delete every object under `prefix`. Returns the number of keys removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let objects = self.list_by_prefix(prefix).await?;
        for object in &objects {
            self.delete(&object.key).await?;
        }
        Ok(objects.len())
    }
}
