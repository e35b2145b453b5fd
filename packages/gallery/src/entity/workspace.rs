use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A named partition of images. At most one row has `is_current` set.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "workspace")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(unique)]
    pub name: String,

    #[sea_orm(default_value = false, indexed)]
    pub is_current: bool,

    #[sea_orm(has_many)]
    pub images: HasMany<super::image::Entity>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
