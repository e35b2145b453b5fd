use thiserror::Error;

/// Failure of an object store operation.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No object exists at the requested key.
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The key is empty, absolute, or escapes its namespace.
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error("object exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// The remote backend rejected or failed the request.
    #[error("object store backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
