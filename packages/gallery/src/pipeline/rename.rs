use common::ObjectStore;
use common::storage::key::normalize_key;
use common::thumbnail::thumbnail_name;
use tracing::{error, info, instrument, warn};

use crate::error::PipelineError;
use crate::models::image::ImageInfo;
use crate::repository::ImagePatch;

use super::{AssetPipeline, require_original_name};

/// A completed object move that can be reversed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ObjectMove {
    pub from: String,
    pub to: String,
}

/// Object moves of one rename, undone in reverse order on failure.
///
/// Between the copy and the delete of a move both keys exist; readers may
/// observe either one.
pub(crate) struct RenameSaga<'a> {
    store: &'a dyn ObjectStore,
    completed: Vec<ObjectMove>,
}

impl<'a> RenameSaga<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            completed: Vec::new(),
        }
    }

    /// Move `from` to `to` and record the undo step.
    pub async fn move_object(&mut self, from: &str, to: &str) -> Result<(), PipelineError> {
        self.store
            .rename(from, to)
            .await
            .map_err(|e| PipelineError::object_write(format!("move {from} to {to}"), e))?;
        self.completed.push(ObjectMove {
            from: from.to_string(),
            to: to.to_string(),
        });
        Ok(())
    }

    /// Undo every completed move once, newest first, and return `cause`.
    ///
    /// Any undo that fails turns the result into `ConsistencyRollback`
    /// listing the keys the objects were left under.
    pub async fn abort(self, cause: PipelineError) -> PipelineError {
        let mut leftovers = Vec::new();
        for step in self.completed.iter().rev() {
            match self.store.rename(&step.to, &step.from).await {
                Ok(()) => warn!(from = %step.to, to = %step.from, "Rolled back object move"),
                Err(e) => {
                    error!(key = %step.to, original = %step.from, error = %e, "Failed to roll back object move");
                    leftovers.push(step.to.clone());
                }
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

impl AssetPipeline {
    /// Rename an image inside its workspace, moving its thumbnail along.
    #[instrument(skip(self))]
    pub async fn rename(
        &self,
        path: &str,
        new_name: &str,
        workspace: &str,
    ) -> Result<ImageInfo, PipelineError> {
        let new_name = require_original_name("new name", new_name)?;
        let ws = self.resolve_workspace(workspace).await?;

        let path = normalize_key(path.trim());
        let row = self
            .images
            .find_by_object_path(&path)
            .await
            .map_err(|e| PipelineError::metadata_read("look up image", e))?
            .filter(|row| row.workspace_id == ws.id)
            .ok_or_else(|| {
                PipelineError::NotFound(format!("image {path} not found in workspace {}", ws.name))
            })?;

        let new_key = self.settings.keys.image_key(&ws.name, new_name);
        if new_key == row.object_path {
            return Ok(ImageInfo::from(row));
        }
        self.ensure_unclaimed(&new_key, new_name).await?;

        let mut saga = RenameSaga::new(self.objects.as_ref());
        saga.move_object(&row.object_path, &new_key).await?;

        let mut patch = ImagePatch {
            name: Some(new_name.to_string()),
            object_path: Some(new_key.clone()),
            object_url: Some(self.objects.url_for(&new_key)),
            ..Default::default()
        };

        if let Some(old_thumb) = row.thumbnail_path.as_deref().filter(|p| !p.is_empty()) {
            let new_thumb = self
                .settings
                .keys
                .image_key(&ws.name, &thumbnail_name(new_name));
            if let Err(cause) = saga.move_object(old_thumb, &new_thumb).await {
                return Err(saga.abort(cause).await);
            }
            patch.thumbnail_url = Some(self.objects.url_for(&new_thumb));
            patch.thumbnail_path = Some(new_thumb);
        }

        match self.images.update(row.id, patch).await {
            Ok(updated) => {
                info!(from = %row.object_path, to = %updated.object_path, "Renamed image");
                Ok(ImageInfo::from(updated))
            }
            Err(e) => {
                let cause = PipelineError::StoreWrite(format!("update image record {}: {e}", row.id));
                Err(saga.abort(cause).await)
            }
        }
    }
}
