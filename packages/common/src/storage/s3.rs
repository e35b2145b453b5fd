use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ::s3::creds::Credentials;
use ::s3::{Bucket, Region};
use tracing::debug;

use crate::config::S3Config;

use super::error::StorageError;
use super::key::normalize_key;
use super::traits::{ObjectInfo, ObjectStore};

/// Object store backed by an S3-compatible bucket.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    public_url: String,
    max_size: u64,
}

impl S3ObjectStore {
    pub fn new(config: &S3Config, max_size: u64) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        };
        let credentials = Credentials::new(
            Some(&config.access_key_id),
            Some(&config.secret_access_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            public_url: config.resolved_public_url(),
            max_size,
        })
    }
}

fn backend_error(op: &str, key: &str, err: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(format!("{op} {key}: {err}"))
}

fn check_status(op: &str, key: &str, status: u16) -> Result<(), StorageError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(key.to_string())),
        code => Err(backend_error(op, key, format!("status {code}"))),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }
        let key = normalize_key(key);
        let response = self
            .bucket
            .put_object(&key, data)
            .await
            .map_err(|e| backend_error("put", &key, e))?;
        check_status("put", &key, response.status_code())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let key = normalize_key(key);
        let response = self
            .bucket
            .get_object(&key)
            .await
            .map_err(|e| backend_error("get", &key, e))?;
        check_status("get", &key, response.status_code())?;
        Ok(response.bytes().to_vec())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let key = normalize_key(key);
        let response = self
            .bucket
            .delete_object(&key)
            .await
            .map_err(|e| backend_error("delete", &key, e))?;
        match check_status("delete", &key, response.status_code()) {
            Err(StorageError::NotFound(_)) => Ok(()),
            other => other,
        }
    }

    async fn copy(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        let src = normalize_key(src);
        let dst = normalize_key(dst);
        let status = self
            .bucket
            .copy_object_internal(&src, &dst)
            .await
            .map_err(|e| backend_error("copy", &src, e))?;
        debug!(src = %src, dst = %dst, status, "Copied object");
        check_status("copy", &src, status)
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        let prefix = normalize_key(prefix);
        let pages = self
            .bucket
            .list(prefix.clone(), None)
            .await
            .map_err(|e| backend_error("list", &prefix, e))?;

        let mut objects: Vec<ObjectInfo> = pages
            .into_iter()
            .flat_map(|page| page.contents)
            .map(|o| ObjectInfo {
                last_modified: DateTime::parse_from_rfc3339(&o.last_modified)
                    .map(|t| t.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
                key: o.key,
                size: o.size,
            })
            .collect();
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, normalize_key(key))
    }
}
