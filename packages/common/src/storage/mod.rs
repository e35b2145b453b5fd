mod error;
mod traits;

pub mod filesystem;
pub mod key;
pub mod memory;
#[cfg(feature = "object-storage")]
pub mod s3;

use std::sync::Arc;

use tracing::info;

use crate::config::{StorageBackend, StorageConfig};

pub use error::StorageError;
pub use key::{ListFilter, ObjectKeys, list_workspace_objects};
pub use traits::{ObjectInfo, ObjectStore};

/// Open the object store selected by `config.backend`.
pub async fn open_object_store(
    config: &StorageConfig,
) -> Result<Arc<dyn ObjectStore>, StorageError> {
    match config.backend {
        StorageBackend::Filesystem => {
            let store = filesystem::FilesystemObjectStore::new(
                config.filesystem.base_path.clone(),
                config.filesystem.public_url.clone(),
                config.max_object_size,
            )
            .await?;
            info!(path = %config.filesystem.base_path.display(), "Using filesystem object store");
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            info!("Using in-memory object store");
            Ok(Arc::new(memory::MemoryObjectStore::default()))
        }
        #[cfg(feature = "object-storage")]
        StorageBackend::S3 => {
            let s3_config = config.s3.as_ref().ok_or_else(|| {
                StorageError::Backend("storage.s3 section is required for the s3 backend".into())
            })?;
            let store = self::s3::S3ObjectStore::new(s3_config, config.max_object_size)?;
            info!(bucket = %s3_config.bucket, "Using S3 object store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "object-storage"))]
        StorageBackend::S3 => Err(StorageError::Backend(
            "s3 backend requires the object-storage feature".into(),
        )),
    }
}
