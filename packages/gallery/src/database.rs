use std::time::Duration;

use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::entity::image;

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(20)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("gallery::entity::*")
        .sync(&db)
        .await?;

    ensure_indexes(&db).await;

    Ok(db)
}

/// Create composite indexes the entity attributes cannot express.
pub async fn ensure_indexes(db: &DatabaseConnection) {
    // Workspace listing: WHERE workspace_id = ? ORDER BY created_at DESC
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_image_workspace_created")
        .table(image::Entity)
        .col(image::Column::WorkspaceId)
        .col(image::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_image_workspace_created exists"),
        Err(e) => warn!("Failed to create index idx_image_workspace_created: {}", e),
    }

    // At most one current workspace.
    let stmt = "CREATE UNIQUE INDEX IF NOT EXISTS idx_workspace_single_current \
                ON workspace (is_current) WHERE is_current";

    match db.execute_unprepared(stmt).await {
        Ok(_) => info!("Ensured index idx_workspace_single_current exists"),
        Err(e) => warn!("Failed to create index idx_workspace_single_current: {}", e),
    }
}
