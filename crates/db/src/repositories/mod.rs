//! Repository layer.
//!
//! The engine depends on the [`ProjectRepository`] and [`RunRepository`]
//! traits; [`postgres::PgRepository`] backs production, while
//! [`memory::InMemoryRepository`] backs tests and embedded use.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use specforge_core::types::{DbId, Timestamp};

use crate::error::DbError;
use crate::models::{NewProject, NewRun, Project, ProjectUpdate, Run};

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, input: &NewProject) -> Result<Project, DbError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<Project>, DbError>;

    /// Replace the stored spec and its denormalized build coordinates.
    /// Returns the updated row, or `None` when the project does not exist.
    async fn update_spec(
        &self,
        id: DbId,
        update: &ProjectUpdate,
    ) -> Result<Option<Project>, DbError>;
}

#[async_trait]
pub trait RunRepository: Send + Sync {
    /// Create a QUEUED run. The per-project run number is assigned here,
    /// monotonically, never at completion.
    async fn create(&self, input: &NewRun) -> Result<Run, DbError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<Run>, DbError>;

    async fn list_by_project(&self, project_id: DbId) -> Result<Vec<Run>, DbError>;

    /// Up to `limit` QUEUED runs, oldest first.
    async fn find_queued(&self, limit: i64) -> Result<Vec<Run>, DbError>;

    /// The project's QUEUED or IN_PROGRESS run, if any.
    async fn find_active_for_project(&self, project_id: DbId) -> Result<Option<Run>, DbError>;

    /// Transition QUEUED -> IN_PROGRESS. Returns `false` when the run was
    /// not QUEUED; the guarded update is what makes claiming race-free.
    async fn claim(&self, run_id: DbId) -> Result<bool, DbError>;

    async fn mark_success(&self, run_id: DbId, archive: &[u8]) -> Result<(), DbError>;

    async fn mark_error(&self, run_id: DbId, message: &str) -> Result<(), DbError>;

    /// Cancel every QUEUED run of a project. Returns how many were
    /// cancelled. IN_PROGRESS runs are never touched.
    async fn cancel_queued(&self, project_id: DbId) -> Result<u64, DbError>;

    /// Number of runs an owner created at or after `since`.
    async fn count_created_since(&self, owner_id: DbId, since: Timestamp) -> Result<i64, DbError>;

    /// Force IN_PROGRESS runs not updated since `cutoff` into ERROR with
    /// the given message. Returns the reclaimed runs.
    async fn reclaim_stuck(&self, cutoff: Timestamp, message: &str) -> Result<Vec<Run>, DbError>;
}
