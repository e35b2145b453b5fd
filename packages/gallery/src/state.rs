use std::sync::Arc;

use common::storage::open_object_store;
use common::{ObjectKeys, ThumbnailOptions};

use crate::config::AppConfig;
use crate::database::init_db;
use crate::pipeline::{AssetPipeline, PipelineSettings};
use crate::repository::{DbImageRepository, DbWorkspaceRepository};
use crate::workspace::WorkspaceService;

/// Handles shared by every command, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: AssetPipeline,
    pub workspaces: WorkspaceService,
}

impl AppState {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let db = init_db(&config.database.url).await?;
        let objects = open_object_store(&config.storage).await?;

        let images = Arc::new(DbImageRepository::new(db.clone()));
        let workspace_repo = Arc::new(DbWorkspaceRepository::new(db.clone()));
        let keys = ObjectKeys::new(&config.storage.image_prefix);

        let settings = PipelineSettings {
            keys: keys.clone(),
            thumbnails: ThumbnailOptions::from(&config.thumbnail),
            default_workspace: config.generation.default_workspace.clone(),
        };
        let pipeline = AssetPipeline::new(
            objects.clone(),
            images,
            workspace_repo.clone(),
            settings,
        );
        let workspaces = WorkspaceService::new(objects.clone(), workspace_repo, keys);

        Ok(Self {
            pipeline,
            workspaces,
        })
    }
}
