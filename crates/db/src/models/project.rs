//! Project entity model and DTOs.

use serde::Serialize;
use specforge_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `projects` table. `spec_text` is the latest submitted
/// spec; build coordinates are denormalized from it at submission time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub owner_id: DbId,
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub build_tool: String,
    pub packaging: String,
    pub runtime_version: String,
    pub spec_text: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO for a new project.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub owner_id: DbId,
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub build_tool: String,
    pub packaging: String,
    pub runtime_version: String,
    pub spec_text: String,
}

/// Update DTO applied when a new spec is submitted for an existing project.
#[derive(Debug, Clone)]
pub struct ProjectUpdate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub build_tool: String,
    pub packaging: String,
    pub runtime_version: String,
    pub spec_text: String,
}
