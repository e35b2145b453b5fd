use std::fmt;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How an image entered the gallery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Upload,
    Generate,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Generate => "generate",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One role-tagged entry of a generation conversation.
/// Stored as an element of the `message_list` JSON array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// "user" or "assistant".
    pub role: String,
    /// "text" or "image".
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
}

impl Message {
    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            kind: "text".into(),
            content: content.into(),
            url: String::new(),
        }
    }
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(indexed)]
    pub workspace_id: i64,
    #[sea_orm(belongs_to, from = "workspace_id", to = "id", on_delete = "Cascade")]
    pub workspace: HasOne<super::workspace::Entity>,

    /// Display filename.
    pub name: String,

    /// Object key of the original, `{prefix}/{workspace}/{name}`.
    #[sea_orm(unique)]
    pub object_path: String,

    pub object_url: String,

    /// NULL when thumbnail derivation failed.
    pub thumbnail_path: Option<String>,

    pub thumbnail_url: Option<String>,

    /// Size of the original in bytes.
    pub size: i64,

    pub mime_type: String,

    /// "upload" or "generate".
    #[sea_orm(indexed)]
    pub source_type: String,

    /// Only set for generated images.
    #[sea_orm(column_type = "Text", nullable)]
    pub prompt: Option<String>,

    /// Object paths used as generation input, as a JSON array of strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub ref_images: serde_json::Value,

    /// Text-only generation history, as a JSON array of [`Message`].
    #[sea_orm(column_type = "JsonBinary")]
    pub message_list: serde_json::Value,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn ref_image_paths(&self) -> Vec<String> {
        serde_json::from_value(self.ref_images.clone()).unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<Message> {
        serde_json::from_value(self.message_list.clone()).unwrap_or_default()
    }
}

impl ActiveModelBehavior for ActiveModel {}
