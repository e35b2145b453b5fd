use serde::Serialize;

use crate::entity::workspace;

use super::image::format_timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceInfo {
    pub name: String,
    pub is_current: bool,
    /// RFC 3339, UTC.
    pub created_at: String,
}

impl From<workspace::Model> for WorkspaceInfo {
    fn from(m: workspace::Model) -> Self {
        Self {
            name: m.name,
            is_current: m.is_current,
            created_at: format_timestamp(&m.created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListWorkspacesResponse {
    pub workspaces: Vec<WorkspaceInfo>,
}

/// `workspace` is `None` when no workspace is current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentWorkspaceResponse {
    pub workspace: Option<WorkspaceInfo>,
}
