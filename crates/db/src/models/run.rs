//! Generation run entity model and DTOs.

use serde::Serialize;
use specforge_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::status::{RunStatus, StatusId};

/// A row from the `runs` table. `run_number` is monotonic per project and
/// assigned at creation time; `archive` holds the produced zip bytes once
/// the run succeeds.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Run {
    pub id: DbId,
    pub project_id: DbId,
    pub owner_id: DbId,
    pub run_type: String,
    pub status_id: StatusId,
    pub run_number: i32,
    pub error_message: Option<String>,
    #[serde(skip_serializing)]
    pub archive: Option<Vec<u8>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Run {
    /// Typed view of `status_id`. Unknown ids are treated as ERROR — they
    /// can only appear through out-of-band writes.
    pub fn status(&self) -> RunStatus {
        RunStatus::from_id(self.status_id).unwrap_or(RunStatus::Error)
    }
}

/// Insert DTO for a new queued run.
#[derive(Debug, Clone)]
pub struct NewRun {
    pub project_id: DbId,
    pub owner_id: DbId,
    pub run_type: String,
}
