use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, instrument};

use crate::entity::image;

use super::{ImagePatch, ImageRepository, ImageSummary, MetadataError, NewImage};

pub struct DbImageRepository {
    db: DatabaseConnection,
}

impl DbImageRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn active_model(new: NewImage) -> Result<image::ActiveModel, MetadataError> {
    let now = Utc::now();
    Ok(image::ActiveModel {
        workspace_id: Set(new.workspace_id),
        name: Set(new.name),
        object_path: Set(new.object_path),
        object_url: Set(new.object_url),
        thumbnail_path: Set(new.thumbnail_path),
        thumbnail_url: Set(new.thumbnail_url),
        size: Set(new.size),
        mime_type: Set(new.mime_type),
        source_type: Set(new.source_type.to_string()),
        prompt: Set(new.prompt),
        ref_images: Set(serde_json::to_value(&new.ref_images)?),
        message_list: Set(serde_json::to_value(&new.message_list)?),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    })
}

async fn insert<C: ConnectionTrait>(
    conn: &C,
    new: NewImage,
) -> Result<image::Model, MetadataError> {
    Ok(active_model(new)?.insert(conn).await?)
}

#[async_trait]
impl ImageRepository for DbImageRepository {
    #[instrument(skip(self, image), fields(path = %image.object_path))]
    async fn create(&self, image: NewImage) -> Result<image::Model, MetadataError> {
        insert(&self.db, image).await
    }

    #[instrument(skip(self, images), fields(count = images.len()))]
    async fn create_batch(
        &self,
        images: Vec<NewImage>,
    ) -> Result<Vec<image::Model>, MetadataError> {
        let txn = self.db.begin().await?;
        let mut created = Vec::with_capacity(images.len());
        for new in images {
            // Dropping `txn` on error rolls back the earlier inserts.
            created.push(insert(&txn, new).await?);
        }
        txn.commit().await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<image::Model>, MetadataError> {
        Ok(image::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_by_object_path(&self, path: &str) -> Result<Option<image::Model>, MetadataError> {
        Ok(image::Entity::find()
            .filter(image::Column::ObjectPath.eq(path))
            .one(&self.db)
            .await?)
    }

    async fn list_by_workspace(&self, workspace_id: i64) -> Result<Vec<ImageSummary>, MetadataError> {
        Ok(image::Entity::find()
            .select_only()
            .column(image::Column::Id)
            .column(image::Column::WorkspaceId)
            .column(image::Column::Name)
            .column(image::Column::ObjectPath)
            .column(image::Column::ObjectUrl)
            .column(image::Column::ThumbnailPath)
            .column(image::Column::ThumbnailUrl)
            .column(image::Column::Size)
            .column(image::Column::MimeType)
            .column(image::Column::SourceType)
            .column(image::Column::CreatedAt)
            .column(image::Column::UpdatedAt)
            .filter(image::Column::WorkspaceId.eq(workspace_id))
            .order_by_desc(image::Column::CreatedAt)
            .order_by_desc(image::Column::Id)
            .into_model::<ImageSummary>()
            .all(&self.db)
            .await?)
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: i64, patch: ImagePatch) -> Result<image::Model, MetadataError> {
        let mut update = image::Entity::update_many()
            .col_expr(image::Column::UpdatedAt, Expr::value(Utc::now()));
        if let Some(name) = patch.name {
            update = update.col_expr(image::Column::Name, Expr::value(name));
        }
        if let Some(path) = patch.object_path {
            update = update.col_expr(image::Column::ObjectPath, Expr::value(path));
        }
        if let Some(url) = patch.object_url {
            update = update.col_expr(image::Column::ObjectUrl, Expr::value(url));
        }
        if let Some(path) = patch.thumbnail_path {
            update = update.col_expr(image::Column::ThumbnailPath, Expr::value(path));
        }
        if let Some(url) = patch.thumbnail_url {
            update = update.col_expr(image::Column::ThumbnailUrl, Expr::value(url));
        }

        let result = update
            .filter(image::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(MetadataError::NotFound(format!("image {id}")));
        }

        image::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| MetadataError::NotFound(format!("image {id}")))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<(), MetadataError> {
        let result = image::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(MetadataError::NotFound(format!("image {id}")));
        }
        debug!(id, "Deleted image row");
        Ok(())
    }
}
