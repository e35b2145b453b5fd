pub mod config;
pub mod media_type;
pub mod storage;
pub mod thumbnail;

pub use config::{StorageBackend, StorageConfig, ThumbnailConfig};
pub use storage::{ObjectInfo, ObjectKeys, ObjectStore, StorageError};
pub use thumbnail::{ThumbnailError, ThumbnailOptions};
