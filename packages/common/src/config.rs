use std::path::PathBuf;

use serde::Deserialize;

use crate::storage::key::DEFAULT_IMAGE_PREFIX;

/// Which object-store backend to open.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    Memory,
    S3,
}

/// Object storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Backend selector. Default: filesystem.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Leading key segment for every image object. Default: "image".
    #[serde(default = "default_image_prefix")]
    pub image_prefix: String,
    /// Maximum object size in bytes. Default: 20 MiB.
    #[serde(default = "default_max_object_size")]
    pub max_object_size: u64,
    #[serde(default)]
    pub filesystem: FilesystemConfig,
    /// Required when `backend = "s3"`.
    pub s3: Option<S3Config>,
}

fn default_image_prefix() -> String {
    DEFAULT_IMAGE_PREFIX.into()
}
fn default_max_object_size() -> u64 {
    20 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            image_prefix: default_image_prefix(),
            max_object_size: default_max_object_size(),
            filesystem: FilesystemConfig::default(),
            s3: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilesystemConfig {
    /// Root directory for objects. Default: "./data/objects".
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,
    /// Base URL that objects are served from. Default: a `file://` URL.
    pub public_url: Option<String>,
}

fn default_base_path() -> PathBuf {
    PathBuf::from("./data/objects")
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            public_url: None,
        }
    }
}

/// S3-compatible bucket settings.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    /// Service endpoint, e.g. "https://oss-cn-hangzhou.aliyuncs.com".
    pub endpoint: String,
    /// Default: "us-east-1".
    #[serde(default = "default_region")]
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Base URL for public links. Default: `https://{bucket}.{endpoint host}`.
    pub public_url: Option<String>,
    /// Address the bucket as `{endpoint}/{bucket}` instead of a subdomain.
    #[serde(default)]
    pub path_style: bool,
}

fn default_region() -> String {
    "us-east-1".into()
}

impl S3Config {
    /// Base URL objects are publicly reachable under, without trailing slash.
    pub fn resolved_public_url(&self) -> String {
        if let Some(url) = &self.public_url {
            return url.trim_end_matches('/').to_string();
        }
        let (scheme, host) = match self.endpoint.split_once("://") {
            Some((scheme, rest)) => (scheme, rest),
            None => ("https", self.endpoint.as_str()),
        };
        let host = host.trim_end_matches('/');
        if self.path_style {
            format!("{scheme}://{host}/{}", self.bucket)
        } else {
            format!("{scheme}://{}.{host}", self.bucket)
        }
    }
}

/// Thumbnail derivation settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ThumbnailConfig {
    /// Length of the longer edge in pixels. Default: 100.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// JPEG quality for non-PNG sources. Default: 85.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_max_dimension() -> u32 {
    100
}
fn default_jpeg_quality() -> u8 {
    85
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}
