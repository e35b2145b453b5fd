use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::image::{self as image_entity, Message};
use crate::repository::ImageSummary;

/// Resolved location of a persisted generated image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
}

/// One entry of a generation response, in model output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeneratedPart {
    Text { text: String },
    Image { image: GeneratedImage },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Object paths of reference images.
    #[serde(default)]
    pub images: Vec<String>,
    /// Target workspace; empty means the configured default.
    #[serde(default)]
    pub workspace: String,
    #[serde(default)]
    pub enable_web_search: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateResponse {
    pub parts: Vec<GeneratedPart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResponse {
    pub path: String,
    pub url: String,
}

/// Display view of an image row.
///
/// List results leave `prompt`, `ref_images` and `message_list` unset; the
/// detail view fills them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub id: i64,
    pub path: String,
    pub url: String,
    pub thumbnail_url: String,
    pub name: String,
    pub size: i64,
    pub mime_type: String,
    /// RFC 3339, UTC.
    pub updated: String,
    pub source_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_list: Option<Vec<Message>>,
}

impl From<ImageSummary> for ImageInfo {
    fn from(s: ImageSummary) -> Self {
        Self {
            id: s.id,
            path: s.object_path,
            url: s.object_url,
            thumbnail_url: s.thumbnail_url.unwrap_or_default(),
            name: s.name,
            size: s.size,
            mime_type: s.mime_type,
            updated: format_timestamp(&s.updated_at),
            source_type: s.source_type,
            prompt: None,
            ref_images: None,
            message_list: None,
        }
    }
}

impl From<image_entity::Model> for ImageInfo {
    fn from(m: image_entity::Model) -> Self {
        let ref_images = m.ref_image_paths();
        let message_list = m.messages();
        Self {
            id: m.id,
            path: m.object_path,
            url: m.object_url,
            thumbnail_url: m.thumbnail_url.unwrap_or_default(),
            name: m.name,
            size: m.size,
            mime_type: m.mime_type,
            updated: format_timestamp(&m.updated_at),
            source_type: m.source_type,
            prompt: m.prompt,
            ref_images: Some(ref_images),
            message_list: Some(message_list),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListImagesResponse {
    pub images: Vec<ImageInfo>,
}

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
