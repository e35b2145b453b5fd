//! Metadata store adapters.
//!
//! The pipeline only sees the [`ImageRepository`] and [`WorkspaceRepository`]
//! traits; [`DbImageRepository`] and [`DbWorkspaceRepository`] implement them
//! over a SeaORM connection.

mod image;
mod workspace;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DbErr, FromQueryResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::image::{Message, SourceType};
use crate::entity::{image as image_entity, workspace as workspace_entity};

pub use self::image::DbImageRepository;
pub use self::workspace::DbWorkspaceRepository;

#[derive(Debug, Error)]
pub enum MetadataError {
    /// The target row does not exist or no row was affected.
    #[error("{0} not found")]
    NotFound(String),
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    #[error("failed to serialize column value: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MetadataError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Values for a new image row. Timestamps are assigned on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewImage {
    pub workspace_id: i64,
    pub name: String,
    pub object_path: String,
    pub object_url: String,
    pub thumbnail_path: Option<String>,
    pub thumbnail_url: Option<String>,
    pub size: i64,
    pub mime_type: String,
    pub source_type: SourceType,
    pub prompt: Option<String>,
    pub ref_images: Vec<String>,
    pub message_list: Vec<Message>,
}

/// Sparse update of an image row. Unset fields are left untouched;
/// `updated_at` is always refreshed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImagePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub object_path: Option<String>,
    #[serde(default)]
    pub object_url: Option<String>,
    #[serde(default)]
    pub thumbnail_path: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// List projection of an image row without the prompt and history columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct ImageSummary {
    pub id: i64,
    pub workspace_id: i64,
    pub name: String,
    pub object_path: String,
    pub object_url: String,
    pub thumbnail_path: Option<String>,
    pub thumbnail_url: Option<String>,
    pub size: i64,
    pub mime_type: String,
    pub source_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<image_entity::Model> for ImageSummary {
    fn from(m: image_entity::Model) -> Self {
        Self {
            id: m.id,
            workspace_id: m.workspace_id,
            name: m.name,
            object_path: m.object_path,
            object_url: m.object_url,
            thumbnail_path: m.thumbnail_path,
            thumbnail_url: m.thumbnail_url,
            size: m.size,
            mime_type: m.mime_type,
            source_type: m.source_type,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    async fn create(&self, name: &str) -> Result<workspace_entity::Model, MetadataError>;

    async fn find_by_name(
        &self,
        name: &str,
    ) -> Result<Option<workspace_entity::Model>, MetadataError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<workspace_entity::Model>, MetadataError>;

    async fn current(&self) -> Result<Option<workspace_entity::Model>, MetadataError>;

    /// All workspaces, the current one first and then newest first.
    async fn list(&self) -> Result<Vec<workspace_entity::Model>, MetadataError>;

    /// Atomically make `id` the only current workspace.
    ///
    /// A missing `id` rolls back and leaves the previous current workspace
    /// in place.
    async fn set_current(&self, id: i64) -> Result<workspace_entity::Model, MetadataError>;

    /// Delete the workspace row and all of its image rows in one transaction.
    async fn delete(&self, id: i64) -> Result<(), MetadataError>;
}

#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn create(&self, image: NewImage) -> Result<image_entity::Model, MetadataError>;

    /// Insert every row or none of them.
    async fn create_batch(
        &self,
        images: Vec<NewImage>,
    ) -> Result<Vec<image_entity::Model>, MetadataError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<image_entity::Model>, MetadataError>;

    async fn find_by_object_path(
        &self,
        path: &str,
    ) -> Result<Option<image_entity::Model>, MetadataError>;

    /// Newest first.
    async fn list_by_workspace(
        &self,
        workspace_id: i64,
    ) -> Result<Vec<ImageSummary>, MetadataError>;

    async fn update(
        &self,
        id: i64,
        patch: ImagePatch,
    ) -> Result<image_entity::Model, MetadataError>;

    async fn delete(&self, id: i64) -> Result<(), MetadataError>;
}
