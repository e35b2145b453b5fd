use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{info, instrument};

use crate::entity::{image, workspace};

use super::{MetadataError, WorkspaceRepository};

pub struct DbWorkspaceRepository {
    db: DatabaseConnection,
}

impl DbWorkspaceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WorkspaceRepository for DbWorkspaceRepository {
    #[instrument(skip(self))]
    async fn create(&self, name: &str) -> Result<workspace::Model, MetadataError> {
        let now = Utc::now();
        let model = workspace::ActiveModel {
            name: Set(name.to_string()),
            is_current: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<workspace::Model>, MetadataError> {
        Ok(workspace::Entity::find()
            .filter(workspace::Column::Name.eq(name))
            .one(&self.db)
            .await?)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<workspace::Model>, MetadataError> {
        Ok(workspace::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn current(&self) -> Result<Option<workspace::Model>, MetadataError> {
        Ok(workspace::Entity::find()
            .filter(workspace::Column::IsCurrent.eq(true))
            .one(&self.db)
            .await?)
    }

    async fn list(&self) -> Result<Vec<workspace::Model>, MetadataError> {
        Ok(workspace::Entity::find()
            .order_by_desc(workspace::Column::IsCurrent)
            .order_by_desc(workspace::Column::CreatedAt)
            .order_by_desc(workspace::Column::Id)
            .all(&self.db)
            .await?)
    }

    #[instrument(skip(self))]
    async fn set_current(&self, id: i64) -> Result<workspace::Model, MetadataError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        // Unfiltered so every row is locked and concurrent switches serialize.
        workspace::Entity::update_many()
            .col_expr(workspace::Column::IsCurrent, Expr::value(false))
            .exec(&txn)
            .await?;

        let result = workspace::Entity::update_many()
            .col_expr(workspace::Column::IsCurrent, Expr::value(true))
            .col_expr(workspace::Column::UpdatedAt, Expr::value(now))
            .filter(workspace::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(MetadataError::NotFound(format!("workspace {id}")));
        }

        let model = workspace::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| MetadataError::NotFound(format!("workspace {id}")))?;
        txn.commit().await?;

        info!(workspace = %model.name, "Switched current workspace");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<(), MetadataError> {
        let txn = self.db.begin().await?;

        let images = image::Entity::delete_many()
            .filter(image::Column::WorkspaceId.eq(id))
            .exec(&txn)
            .await?;

        let result = workspace::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(MetadataError::NotFound(format!("workspace {id}")));
        }
        txn.commit().await?;

        info!(id, images = images.rows_affected, "Deleted workspace rows");
        Ok(())
    }
}
