use crate::thumbnail::is_thumbnail;

use super::error::StorageError;
use super::traits::{ObjectInfo, ObjectStore};

/// Prefix used when none is configured.
pub const DEFAULT_IMAGE_PREFIX: &str = "image";

/// Zero-byte object marking that a workspace directory exists.
pub const WORKSPACE_MARKER: &str = ".keep";

/// Builds object keys of the form `{prefix}/{workspace}/{filename}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKeys {
    prefix: String,
}

impl ObjectKeys {
    pub fn new(prefix: &str) -> Self {
        let prefix = normalize_key(prefix.trim());
        let prefix = prefix.trim_matches('/');
        let prefix = if prefix.is_empty() {
            DEFAULT_IMAGE_PREFIX.to_string()
        } else {
            prefix.to_string()
        };
        Self { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key of an image (or thumbnail) file inside a workspace.
    pub fn image_key(&self, workspace: &str, filename: &str) -> String {
        normalize_key(&format!("{}/{workspace}/{filename}", self.prefix))
    }

    /// Listing prefix for a workspace, including the trailing slash.
    pub fn workspace_prefix(&self, workspace: &str) -> String {
        normalize_key(&format!("{}/{workspace}/", self.prefix))
    }

    pub fn marker_key(&self, workspace: &str) -> String {
        self.image_key(workspace, WORKSPACE_MARKER)
    }
}

impl Default for ObjectKeys {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_PREFIX)
    }
}

/// Replace backslashes with forward slashes.
pub fn normalize_key(key: &str) -> String {
    key.replace('\\', "/")
}

/// Last path segment of a key.
pub fn file_name(key: &str) -> &str {
    match key.rfind('/') {
        Some(pos) => &key[pos + 1..],
        None => key,
    }
}

pub fn is_marker(key: &str) -> bool {
    file_name(key) == WORKSPACE_MARKER
}

/// Which objects a workspace listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFilter {
    /// Originals and thumbnails.
    All,
    /// Originals only; thumbnail-suffixed keys are skipped.
    OriginalsOnly,
}

/// List the objects stored in a workspace, never including its marker.
pub async fn list_workspace_objects(
    store: &dyn ObjectStore,
    keys: &ObjectKeys,
    workspace: &str,
    filter: ListFilter,
) -> Result<Vec<ObjectInfo>, StorageError> {
    let prefix = keys.workspace_prefix(workspace);
    let objects = store.list_by_prefix(&prefix).await?;

    Ok(objects
        .into_iter()
        .filter(|o| {
            let name = &o.key[prefix.len().min(o.key.len())..];
            !name.is_empty() && !is_marker(&o.key)
        })
        .filter(|o| filter == ListFilter::All || !is_thumbnail(file_name(&o.key)))
        .collect())
}
