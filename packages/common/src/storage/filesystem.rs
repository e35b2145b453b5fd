use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;

use super::error::StorageError;
use super::key::normalize_key;
use super::traits::{ObjectInfo, ObjectStore};

/// Directory holding in-flight writes; never part of a listing.
const TEMP_DIR: &str = ".tmp";

/// Filesystem-backed object store.
///
/// Keys map directly onto the directory tree:
/// `{base_path}/{segment}/{segment}/...`
pub struct FilesystemObjectStore {
    base_path: PathBuf,
    public_url: String,
    max_size: u64,
}

impl FilesystemObjectStore {
    /// Create a new filesystem object store.
    pub async fn new(
        base_path: PathBuf,
        public_url: Option<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(TEMP_DIR)).await?;
        let public_url = public_url
            .unwrap_or_else(|| format!("file://{}", base_path.display()))
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            base_path,
            public_url,
            max_size,
        })
    }

    /// Compute the filesystem path for a given key.
    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let key = normalize_key(key);
        if key.is_empty() {
            return Err(StorageError::InvalidKey("key cannot be empty".into()));
        }
        if key.starts_with('/') {
            return Err(StorageError::InvalidKey(format!("{key} is absolute")));
        }

        let mut path = self.base_path.clone();
        for (i, segment) in key.split('/').enumerate() {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(StorageError::InvalidKey(format!(
                    "{key} contains an empty or relative segment"
                )));
            }
            if i == 0 && segment == TEMP_DIR {
                return Err(StorageError::InvalidKey(format!("{key} is reserved")));
            }
            path.push(segment);
        }
        Ok(path)
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(TEMP_DIR)
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Write `data` to `target` through a temp file so readers never see a
    /// partial object.
    async fn write_atomic(&self, target: &Path, data: &[u8]) -> Result<(), StorageError> {
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, target).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.base_path).ok()?;
        let segments: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(segments.join("/"))
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let path = self.object_path(key)?;
        self.write_atomic(&path, data).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn copy(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        let data = self.get(src).await?;
        let path = self.object_path(dst)?;
        self.write_atomic(&path, &data).await
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        let mut objects = Vec::new();
        let mut pending = vec![self.base_path.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    if dir == self.base_path && entry.file_name() == TEMP_DIR {
                        continue;
                    }
                    pending.push(path);
                    continue;
                }

                let Some(key) = self.key_for(&path) else {
                    continue;
                };
                if !key.starts_with(prefix) {
                    continue;
                }

                let meta = entry.metadata().await?;
                let last_modified = meta
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());
                objects.push(ObjectInfo {
                    key,
                    size: meta.len(),
                    last_modified,
                });
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, normalize_key(key))
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.object_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }
}
