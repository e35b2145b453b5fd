use common::StorageError;
use serde::Serialize;
use thiserror::Error;

use crate::generation::GenerationError;
use crate::repository::MetadataError;

/// Structured error body printed by the CLI on failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `NOT_FOUND`, `VALIDATION_ERROR`,
    /// `EXTERNAL_CAPABILITY_ERROR`, `STORE_WRITE_ERROR`, `STORE_READ_ERROR`,
    /// `CONSISTENCY_ROLLBACK_ERROR`.
    pub code: &'static str,
    /// Human-readable error description.
    pub message: String,
}

/// Error returned by every pipeline and workspace operation.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    /// The generation capability failed or returned nothing usable.
    #[error("{0}")]
    ExternalCapability(String),
    /// An object or metadata write failed. Compensations, if any, succeeded.
    #[error("{0}")]
    StoreWrite(String),
    #[error("{0}")]
    StoreRead(String),
    /// A compensating action failed; the listed leftovers need manual repair.
    #[error("{message}; rollback incomplete: {}", .leftovers.join(", "))]
    ConsistencyRollback {
        message: String,
        leftovers: Vec<String>,
    },
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ExternalCapability(_) => "EXTERNAL_CAPABILITY_ERROR",
            Self::StoreWrite(_) => "STORE_WRITE_ERROR",
            Self::StoreRead(_) => "STORE_READ_ERROR",
            Self::ConsistencyRollback { .. } => "CONSISTENCY_ROLLBACK_ERROR",
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
        }
    }

    /// Wrap a failed object write.
    pub(crate) fn object_write(context: impl std::fmt::Display, err: StorageError) -> Self {
        Self::StoreWrite(format!("{context}: {err}"))
    }

    /// Wrap a failed object read. A missing object maps to `NotFound`.
    pub(crate) fn object_read(context: impl std::fmt::Display, err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => Self::NotFound(format!("{context}: object {key} not found")),
            other => Self::StoreRead(format!("{context}: {other}")),
        }
    }

    /// Wrap a failed metadata write. A missing row maps to `NotFound`.
    pub(crate) fn metadata_write(context: impl std::fmt::Display, err: MetadataError) -> Self {
        match err {
            MetadataError::NotFound(what) => Self::NotFound(format!("{context}: {what} not found")),
            other => Self::StoreWrite(format!("{context}: {other}")),
        }
    }

    pub(crate) fn metadata_read(context: impl std::fmt::Display, err: MetadataError) -> Self {
        match err {
            MetadataError::NotFound(what) => Self::NotFound(format!("{context}: {what} not found")),
            other => Self::StoreRead(format!("{context}: {other}")),
        }
    }
}

impl From<GenerationError> for PipelineError {
    fn from(err: GenerationError) -> Self {
        Self::ExternalCapability(format!("image generation failed: {err}"))
    }
}
