//! Workspace management: create, switch, list and delete workspaces.

use std::sync::Arc;

use common::{ObjectKeys, ObjectStore};
use tracing::{error, info, instrument};

use crate::entity::workspace;
use crate::error::PipelineError;
use crate::models::workspace::{CurrentWorkspaceResponse, ListWorkspacesResponse, WorkspaceInfo};
use crate::repository::WorkspaceRepository;
use crate::utils::filename::require_flat_name;

#[derive(Clone)]
pub struct WorkspaceService {
    objects: Arc<dyn ObjectStore>,
    workspaces: Arc<dyn WorkspaceRepository>,
    keys: ObjectKeys,
}

impl WorkspaceService {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        workspaces: Arc<dyn WorkspaceRepository>,
        keys: ObjectKeys,
    ) -> Self {
        Self {
            objects,
            workspaces,
            keys,
        }
    }

    pub async fn list(&self) -> Result<ListWorkspacesResponse, PipelineError> {
        let rows = self
            .workspaces
            .list()
            .await
            .map_err(|e| PipelineError::metadata_read("list workspaces", e))?;
        Ok(ListWorkspacesResponse {
            workspaces: rows.into_iter().map(WorkspaceInfo::from).collect(),
        })
    }

    pub async fn current(&self) -> Result<CurrentWorkspaceResponse, PipelineError> {
        let row = self
            .workspaces
            .current()
            .await
            .map_err(|e| PipelineError::metadata_read("load current workspace", e))?;
        Ok(CurrentWorkspaceResponse {
            workspace: row.map(WorkspaceInfo::from),
        })
    }

    /// Insert the workspace row, then write its marker object.
    #[instrument(skip(self))]
    pub async fn create(&self, name: &str) -> Result<WorkspaceInfo, PipelineError> {
        let name = require_flat_name("workspace name", name)?;

        let existing = self
            .workspaces
            .find_by_name(name)
            .await
            .map_err(|e| PipelineError::metadata_read("look up workspace", e))?;
        if existing.is_some() {
            return Err(PipelineError::Validation(format!(
                "workspace {name} already exists"
            )));
        }

        let row = self
            .workspaces
            .create(name)
            .await
            .map_err(|e| PipelineError::metadata_write(format!("create workspace {name}"), e))?;

        let marker = self.keys.marker_key(name);
        if let Err(e) = self.objects.put(&marker, b"").await {
            let cause = PipelineError::object_write(format!("write marker {marker}"), e);
            if let Err(rollback) = self.workspaces.delete(row.id).await {
                error!(id = row.id, error = %rollback, "Failed to remove workspace row after marker write failed");
                return Err(PipelineError::ConsistencyRollback {
                    message: cause.to_string(),
                    leftovers: vec![format!("workspace row {name}")],
                });
            }
            return Err(cause);
        }

        info!(workspace = %name, "Created workspace");
        Ok(WorkspaceInfo::from(row))
    }

    #[instrument(skip(self))]
    pub async fn set_current(&self, name: &str) -> Result<WorkspaceInfo, PipelineError> {
        let ws = self.resolve(name).await?;
        let row = self
            .workspaces
            .set_current(ws.id)
            .await
            .map_err(|e| PipelineError::metadata_write(format!("switch to workspace {}", ws.name), e))?;
        Ok(WorkspaceInfo::from(row))
    }

    /// Remove every object under the workspace, then its rows.
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<(), PipelineError> {
        let ws = self.resolve(name).await?;

        let prefix = self.keys.workspace_prefix(&ws.name);
        let removed = self
            .objects
            .delete_prefix(&prefix)
            .await
            .map_err(|e| PipelineError::object_write(format!("delete objects under {prefix}"), e))?;

        self.workspaces
            .delete(ws.id)
            .await
            .map_err(|e| PipelineError::metadata_write(format!("delete workspace {}", ws.name), e))?;

        info!(workspace = %ws.name, objects = removed, "Deleted workspace");
        Ok(())
    }

    async fn resolve(&self, name: &str) -> Result<workspace::Model, PipelineError> {
        let name = name.trim();
        self.workspaces
            .find_by_name(name)
            .await
            .map_err(|e| PipelineError::metadata_read(format!("look up workspace {name}"), e))?
            .ok_or_else(|| PipelineError::NotFound(format!("workspace {name} does not exist")))
    }
}
