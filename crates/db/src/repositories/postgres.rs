//! PostgreSQL repository implementation.
//!
//! Status transitions are guarded conditional updates; a claim or a
//! reclaim only succeeds when the row is still in the expected state.

use async_trait::async_trait;
use sqlx::PgPool;
use specforge_core::types::{DbId, Timestamp};

use crate::error::DbError;
use crate::models::{NewProject, NewRun, Project, ProjectUpdate, Run, RunStatus};
use crate::repositories::{ProjectRepository, RunRepository};

/// Column list for `projects` queries.
const PROJECT_COLUMNS: &str = "\
    id, owner_id, group_id, artifact_id, version, build_tool, packaging, \
    runtime_version, spec_text, created_at, updated_at";

/// Column list for `runs` queries.
const RUN_COLUMNS: &str = "\
    id, project_id, owner_id, run_type, status_id, run_number, \
    error_message, archive, created_at, updated_at";

/// Shared-pool repository backing both storage traits.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded migrations.
    pub async fn migrate(&self) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for PgRepository {
    async fn create(&self, input: &NewProject) -> Result<Project, DbError> {
        let query = format!(
            "INSERT INTO projects \
                 (owner_id, group_id, artifact_id, version, build_tool, \
                  packaging, runtime_version, spec_text) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {PROJECT_COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(input.owner_id)
            .bind(&input.group_id)
            .bind(&input.artifact_id)
            .bind(&input.version)
            .bind(&input.build_tool)
            .bind(&input.packaging)
            .bind(&input.runtime_version)
            .bind(&input.spec_text)
            .fetch_one(&self.pool)
            .await?;
        Ok(project)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Project>, DbError> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn update_spec(
        &self,
        id: DbId,
        update: &ProjectUpdate,
    ) -> Result<Option<Project>, DbError> {
        let query = format!(
            "UPDATE projects \
             SET group_id = $2, artifact_id = $3, version = $4, build_tool = $5, \
                 packaging = $6, runtime_version = $7, spec_text = $8, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PROJECT_COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&update.group_id)
            .bind(&update.artifact_id)
            .bind(&update.version)
            .bind(&update.build_tool)
            .bind(&update.packaging)
            .bind(&update.runtime_version)
            .bind(&update.spec_text)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }
}

#[async_trait]
impl RunRepository for PgRepository {
    async fn create(&self, input: &NewRun) -> Result<Run, DbError> {
        let query = format!(
            "INSERT INTO runs (project_id, owner_id, run_type, status_id, run_number) \
             VALUES ($1, $2, $3, $4, \
                 (SELECT COALESCE(MAX(run_number), 0) + 1 FROM runs WHERE project_id = $1)) \
             RETURNING {RUN_COLUMNS}"
        );
        let run = sqlx::query_as::<_, Run>(&query)
            .bind(input.project_id)
            .bind(input.owner_id)
            .bind(&input.run_type)
            .bind(RunStatus::Queued.id())
            .fetch_one(&self.pool)
            .await?;
        Ok(run)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Run>, DbError> {
        let query = format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = $1");
        let run = sqlx::query_as::<_, Run>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(run)
    }

    async fn list_by_project(&self, project_id: DbId) -> Result<Vec<Run>, DbError> {
        let query = format!(
            "SELECT {RUN_COLUMNS} FROM runs WHERE project_id = $1 ORDER BY run_number DESC"
        );
        let runs = sqlx::query_as::<_, Run>(&query)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(runs)
    }

    async fn find_queued(&self, limit: i64) -> Result<Vec<Run>, DbError> {
        let query = format!(
            "SELECT {RUN_COLUMNS} FROM runs \
             WHERE status_id = $1 \
             ORDER BY created_at ASC \
             LIMIT $2"
        );
        let runs = sqlx::query_as::<_, Run>(&query)
            .bind(RunStatus::Queued.id())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(runs)
    }

    async fn find_active_for_project(&self, project_id: DbId) -> Result<Option<Run>, DbError> {
        let query = format!(
            "SELECT {RUN_COLUMNS} FROM runs \
             WHERE project_id = $1 AND status_id IN ($2, $3) \
             ORDER BY created_at ASC \
             LIMIT 1"
        );
        let run = sqlx::query_as::<_, Run>(&query)
            .bind(project_id)
            .bind(RunStatus::Queued.id())
            .bind(RunStatus::InProgress.id())
            .fetch_optional(&self.pool)
            .await?;
        Ok(run)
    }

    async fn claim(&self, run_id: DbId) -> Result<bool, DbError> {
        let result = sqlx::query(
            "UPDATE runs SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(run_id)
        .bind(RunStatus::InProgress.id())
        .bind(RunStatus::Queued.id())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_success(&self, run_id: DbId, archive: &[u8]) -> Result<(), DbError> {
        sqlx::query(
            "UPDATE runs SET status_id = $2, archive = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(run_id)
        .bind(RunStatus::Success.id())
        .bind(archive)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_error(&self, run_id: DbId, message: &str) -> Result<(), DbError> {
        sqlx::query(
            "UPDATE runs SET status_id = $2, error_message = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(run_id)
        .bind(RunStatus::Error.id())
        .bind(message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn cancel_queued(&self, project_id: DbId) -> Result<u64, DbError> {
        let result = sqlx::query(
            "UPDATE runs SET status_id = $2, updated_at = NOW() \
             WHERE project_id = $1 AND status_id = $3",
        )
        .bind(project_id)
        .bind(RunStatus::Cancelled.id())
        .bind(RunStatus::Queued.id())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn count_created_since(&self, owner_id: DbId, since: Timestamp) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM runs WHERE owner_id = $1 AND created_at >= $2",
        )
        .bind(owner_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn reclaim_stuck(&self, cutoff: Timestamp, message: &str) -> Result<Vec<Run>, DbError> {
        let query = format!(
            "UPDATE runs \
             SET status_id = $1, error_message = $2, updated_at = NOW() \
             WHERE status_id = $3 AND updated_at < $4 \
             RETURNING {RUN_COLUMNS}"
        );
        let runs = sqlx::query_as::<_, Run>(&query)
            .bind(RunStatus::Error.id())
            .bind(message)
            .bind(RunStatus::InProgress.id())
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;
        Ok(runs)
    }
}
