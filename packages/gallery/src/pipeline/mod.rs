//! Asset persistence pipeline.
//!
//! Every operation writes objects before metadata and undoes its own object
//! writes when the metadata step fails. Thumbnails are a [`BestEffort`] side
//! product: failing to derive or store one never fails the operation.

mod generate;
mod rename;

use std::fmt::Display;
use std::sync::Arc;

use common::media_type::mime_from_filename;
use common::storage::key::normalize_key;
use common::thumbnail::{self, ThumbnailOptions, is_thumbnail};
use common::{ObjectKeys, ObjectStore};
use tracing::{error, info, instrument, warn};

use crate::entity::image::{Message, SourceType};
use crate::entity::workspace;
use crate::error::PipelineError;
use crate::generation::ImageGenerator;
use crate::models::image::{ImageInfo, ListImagesResponse, UploadResponse};
use crate::repository::{ImageRepository, MetadataError, NewImage, WorkspaceRepository};
use crate::utils::filename::require_flat_name;

pub const DEFAULT_WORKSPACE: &str = "default";

/// Outcome of a side operation whose failure is logged, never propagated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort<T> {
    Done(T),
    Skipped,
}

impl<T> BestEffort<T> {
    /// Keep the value on success; log the error and skip on failure.
    pub fn from_result<E: Display>(what: &str, result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Done(value),
            Err(e) => {
                warn!(error = %e, "{what} skipped");
                Self::Skipped
            }
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            Self::Skipped => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub keys: ObjectKeys,
    pub thumbnails: ThumbnailOptions,
    /// Workspace used by `generate` when the request names none.
    pub default_workspace: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            keys: ObjectKeys::default(),
            thumbnails: ThumbnailOptions::default(),
            default_workspace: DEFAULT_WORKSPACE.into(),
        }
    }
}

/// A stored object and its public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredObject {
    pub key: String,
    pub url: String,
}

/// Objects written for one image whose metadata row is not durable yet.
#[derive(Debug, Clone)]
pub(crate) struct StagedImage {
    pub name: String,
    pub original: StoredObject,
    pub thumbnail: Option<StoredObject>,
    pub size: i64,
    pub mime_type: String,
}

impl StagedImage {
    fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.original.key.as_str())
            .chain(self.thumbnail.as_ref().map(|t| t.key.as_str()))
    }

    fn new_image(
        &self,
        workspace_id: i64,
        source_type: SourceType,
        prompt: Option<String>,
        ref_images: Vec<String>,
        message_list: Vec<Message>,
    ) -> NewImage {
        NewImage {
            workspace_id,
            name: self.name.clone(),
            object_path: self.original.key.clone(),
            object_url: self.original.url.clone(),
            thumbnail_path: self.thumbnail.as_ref().map(|t| t.key.clone()),
            thumbnail_url: self.thumbnail.as_ref().map(|t| t.url.clone()),
            size: self.size,
            mime_type: self.mime_type.clone(),
            source_type,
            prompt,
            ref_images,
            message_list,
        }
    }
}

/// Orchestrates the object store and the metadata store.
#[derive(Clone)]
pub struct AssetPipeline {
    objects: Arc<dyn ObjectStore>,
    images: Arc<dyn ImageRepository>,
    workspaces: Arc<dyn WorkspaceRepository>,
    generator: Option<Arc<dyn ImageGenerator>>,
    settings: PipelineSettings,
}

impl AssetPipeline {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        images: Arc<dyn ImageRepository>,
        workspaces: Arc<dyn WorkspaceRepository>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            objects,
            images,
            workspaces,
            generator: None,
            settings,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Store `data` unchanged as `{prefix}/{workspace}/{filename}` with a
    /// derived thumbnail beside it.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn upload(
        &self,
        workspace: &str,
        filename: &str,
        data: &[u8],
    ) -> Result<UploadResponse, PipelineError> {
        let filename = require_original_name("filename", filename)?;
        let ws = self.resolve_workspace(workspace).await?;

        let key = self.settings.keys.image_key(&ws.name, filename);
        self.ensure_unclaimed(&key, filename).await?;

        let mime_type = mime_from_filename(filename);
        let staged = self.stage(&ws.name, filename, data, &mime_type).await?;
        let new = staged.new_image(ws.id, SourceType::Upload, None, Vec::new(), Vec::new());

        match self.images.create(new).await {
            Ok(row) => {
                info!(path = %row.object_path, "Uploaded image");
                Ok(UploadResponse {
                    path: row.object_path,
                    url: row.object_url,
                })
            }
            Err(e) => {
                // A concurrent upload of the same name committed first and
                // now owns both keys.
                if let Ok(Some(winner)) = self.images.find_by_object_path(&key).await {
                    warn!(id = winner.id, path = %key, error = %e, "Upload lost a race for its key");
                    return Err(claimed(filename));
                }
                let cause = PipelineError::StoreWrite(format!("save image record for {key}: {e}"));
                Err(self.discard_staged(std::slice::from_ref(&staged), cause).await)
            }
        }
    }

    /// Images of a workspace, newest first, without generation details.
    #[instrument(skip(self))]
    pub async fn list(&self, workspace: &str) -> Result<ListImagesResponse, PipelineError> {
        let ws = self.resolve_workspace(workspace).await?;
        let summaries = self
            .images
            .list_by_workspace(ws.id)
            .await
            .map_err(|e| PipelineError::metadata_read(format!("list images of {}", ws.name), e))?;

        Ok(ListImagesResponse {
            images: summaries.into_iter().map(ImageInfo::from).collect(),
        })
    }

    /// Full image row including prompt, references and history.
    #[instrument(skip(self))]
    pub async fn image_detail(&self, id: i64) -> Result<ImageInfo, PipelineError> {
        self.images
            .find_by_id(id)
            .await
            .map_err(|e| PipelineError::metadata_read("load image", e))?
            .map(ImageInfo::from)
            .ok_or_else(|| PipelineError::NotFound(format!("image {id} not found")))
    }

    /// Remove the original, its thumbnail and the metadata row.
    ///
    /// If the row delete fails after the objects are gone, the row is left
    /// stale; it points at nothing and is reported in the error.
    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> Result<(), PipelineError> {
        let path = normalize_key(path.trim());
        let row = self
            .images
            .find_by_object_path(&path)
            .await
            .map_err(|e| PipelineError::metadata_read("look up image", e))?
            .ok_or_else(|| PipelineError::NotFound(format!("image {path} not found")))?;

        self.objects
            .delete(&row.object_path)
            .await
            .map_err(|e| PipelineError::object_write(format!("delete {}", row.object_path), e))?;

        if let Some(thumb) = row.thumbnail_path.as_deref().filter(|p| !p.is_empty()) {
            BestEffort::from_result("thumbnail delete", self.objects.delete(thumb).await);
        }

        match self.images.delete(row.id).await {
            Ok(()) => {
                info!(path = %row.object_path, "Deleted image");
                Ok(())
            }
            Err(MetadataError::NotFound(_)) => Err(PipelineError::NotFound(format!(
                "image {path} was deleted concurrently"
            ))),
            Err(e) => {
                warn!(id = row.id, path = %row.object_path, "Image row left stale after its objects were deleted");
                Err(PipelineError::StoreWrite(format!(
                    "delete image record {}: {e}",
                    row.id
                )))
            }
        }
    }

    pub(crate) async fn resolve_workspace(
        &self,
        name: &str,
    ) -> Result<workspace::Model, PipelineError> {
        let name = name.trim();
        self.workspaces
            .find_by_name(name)
            .await
            .map_err(|e| PipelineError::metadata_read(format!("look up workspace {name}"), e))?
            .ok_or_else(|| PipelineError::NotFound(format!("workspace {name} does not exist")))
    }

    /// Fail if another image row already owns `key`.
    pub(crate) async fn ensure_unclaimed(&self, key: &str, name: &str) -> Result<(), PipelineError> {
        let existing = self
            .images
            .find_by_object_path(key)
            .await
            .map_err(|e| PipelineError::metadata_read("look up image", e))?;
        match existing {
            Some(_) => Err(claimed(name)),
            None => Ok(()),
        }
    }

    /// Write the original and, best effort, its thumbnail.
    pub(crate) async fn stage(
        &self,
        workspace: &str,
        filename: &str,
        data: &[u8],
        mime_type: &str,
    ) -> Result<StagedImage, PipelineError> {
        let key = self.settings.keys.image_key(workspace, filename);
        self.objects
            .put(&key, data)
            .await
            .map_err(|e| PipelineError::object_write(format!("store {key}"), e))?;

        let thumbnail = self
            .store_thumbnail(workspace, filename, data, mime_type)
            .await
            .into_option();

        Ok(StagedImage {
            name: filename.to_string(),
            original: StoredObject {
                url: self.objects.url_for(&key),
                key,
            },
            thumbnail,
            size: data.len() as i64,
            mime_type: mime_type.to_string(),
        })
    }

    async fn store_thumbnail(
        &self,
        workspace: &str,
        filename: &str,
        data: &[u8],
        mime_type: &str,
    ) -> BestEffort<StoredObject> {
        let bytes = match thumbnail::derive(data, mime_type, &self.settings.thumbnails) {
            Ok(bytes) => bytes,
            Err(e) => return BestEffort::from_result("thumbnail derivation", Err(e)),
        };

        let key = self
            .settings
            .keys
            .image_key(workspace, &thumbnail::thumbnail_name(filename));
        let stored = self.objects.put(&key, &bytes).await.map(|()| StoredObject {
            url: self.objects.url_for(&key),
            key: key.clone(),
        });
        BestEffort::from_result("thumbnail upload", stored)
    }

    /// Delete every object of `staged` and return `cause`, or a
    /// `ConsistencyRollback` if some object could not be deleted.
    pub(crate) async fn discard_staged(
        &self,
        staged: &[StagedImage],
        cause: PipelineError,
    ) -> PipelineError {
        let mut leftovers = Vec::new();
        for key in staged.iter().flat_map(StagedImage::keys) {
            if let Err(e) = self.objects.delete(key).await {
                error!(key, error = %e, "Failed to delete staged object");
                leftovers.push(key.to_string());
            }
        }

        if leftovers.is_empty() {
            cause
        } else {
            PipelineError::ConsistencyRollback {
                message: cause.to_string(),
                leftovers,
            }
        }
    }
}

fn claimed(name: &str) -> PipelineError {
    PipelineError::Validation(format!(
        "an image named {name} already exists in this workspace"
    ))
}

/// A flat name that is not reserved for thumbnails.
pub(crate) fn require_original_name<'a>(
    field: &str,
    name: &'a str,
) -> Result<&'a str, PipelineError> {
    let name = require_flat_name(field, name)?;
    if is_thumbnail(name) {
        return Err(PipelineError::Validation(format!(
            "{field} must not end with {}",
            thumbnail::THUMBNAIL_SUFFIX
        )));
    }
    Ok(name)
}
