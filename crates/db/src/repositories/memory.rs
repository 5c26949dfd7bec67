//! In-memory repository for tests and embedded use.
//!
//! Mirrors the PostgreSQL implementation's transition guards so queue and
//! recovery behavior can be exercised without a database.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use specforge_core::types::{DbId, Timestamp};

use crate::error::DbError;
use crate::models::{NewProject, NewRun, Project, ProjectUpdate, Run, RunStatus};
use crate::repositories::{ProjectRepository, RunRepository};

#[derive(Default)]
struct Inner {
    projects: BTreeMap<DbId, Project>,
    runs: BTreeMap<DbId, Run>,
    next_project_id: DbId,
    next_run_id: DbId,
}

#[derive(Default)]
pub struct InMemoryRepository {
    inner: Mutex<Inner>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test support: rewrite a run's `updated_at`, e.g. to age a run past
    /// the recovery job's stuck threshold.
    pub fn set_run_updated_at(&self, run_id: DbId, at: Timestamp) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(run) = inner.runs.get_mut(&run_id) {
            run.updated_at = at;
        }
    }

    /// Test support: rewrite a run's `created_at`, e.g. to move it outside
    /// the daily-cap window.
    pub fn set_run_created_at(&self, run_id: DbId, at: Timestamp) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(run) = inner.runs.get_mut(&run_id) {
            run.created_at = at;
        }
    }
}

#[async_trait]
impl ProjectRepository for InMemoryRepository {
    async fn create(&self, input: &NewProject) -> Result<Project, DbError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_project_id += 1;
        let now = Utc::now();
        let project = Project {
            id: inner.next_project_id,
            owner_id: input.owner_id,
            group_id: input.group_id.clone(),
            artifact_id: input.artifact_id.clone(),
            version: input.version.clone(),
            build_tool: input.build_tool.clone(),
            packaging: input.packaging.clone(),
            runtime_version: input.runtime_version.clone(),
            spec_text: input.spec_text.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Project>, DbError> {
        Ok(self.inner.lock().unwrap().projects.get(&id).cloned())
    }

    async fn update_spec(
        &self,
        id: DbId,
        update: &ProjectUpdate,
    ) -> Result<Option<Project>, DbError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(project) = inner.projects.get_mut(&id) else {
            return Ok(None);
        };
        project.group_id = update.group_id.clone();
        project.artifact_id = update.artifact_id.clone();
        project.version = update.version.clone();
        project.build_tool = update.build_tool.clone();
        project.packaging = update.packaging.clone();
        project.runtime_version = update.runtime_version.clone();
        project.spec_text = update.spec_text.clone();
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }
}

#[async_trait]
impl RunRepository for InMemoryRepository {
    async fn create(&self, input: &NewRun) -> Result<Run, DbError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_run_id += 1;
        let run_number = inner
            .runs
            .values()
            .filter(|r| r.project_id == input.project_id)
            .map(|r| r.run_number)
            .max()
            .unwrap_or(0)
            + 1;
        let now = Utc::now();
        let run = Run {
            id: inner.next_run_id,
            project_id: input.project_id,
            owner_id: input.owner_id,
            run_type: input.run_type.clone(),
            status_id: RunStatus::Queued.id(),
            run_number,
            error_message: None,
            archive: None,
            created_at: now,
            updated_at: now,
        };
        inner.runs.insert(run.id, run.clone());
        Ok(run)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Run>, DbError> {
        Ok(self.inner.lock().unwrap().runs.get(&id).cloned())
    }

    async fn list_by_project(&self, project_id: DbId) -> Result<Vec<Run>, DbError> {
        let inner = self.inner.lock().unwrap();
        let mut runs: Vec<Run> = inner
            .runs
            .values()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect();
        runs.sort_by(|a, b| b.run_number.cmp(&a.run_number));
        Ok(runs)
    }

    async fn find_queued(&self, limit: i64) -> Result<Vec<Run>, DbError> {
        let inner = self.inner.lock().unwrap();
        let mut queued: Vec<Run> = inner
            .runs
            .values()
            .filter(|r| r.status() == RunStatus::Queued)
            .cloned()
            .collect();
        queued.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        queued.truncate(limit.max(0) as usize);
        Ok(queued)
    }

    async fn find_active_for_project(&self, project_id: DbId) -> Result<Option<Run>, DbError> {
        let inner = self.inner.lock().unwrap();
        let mut active: Vec<&Run> = inner
            .runs
            .values()
            .filter(|r| {
                r.project_id == project_id
                    && matches!(r.status(), RunStatus::Queued | RunStatus::InProgress)
            })
            .collect();
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(active.first().map(|r| (*r).clone()))
    }

    async fn claim(&self, run_id: DbId) -> Result<bool, DbError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(run) = inner.runs.get_mut(&run_id) else {
            return Ok(false);
        };
        if run.status() != RunStatus::Queued {
            return Ok(false);
        }
        run.status_id = RunStatus::InProgress.id();
        run.updated_at = Utc::now();
        Ok(true)
    }

    async fn mark_success(&self, run_id: DbId, archive: &[u8]) -> Result<(), DbError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(run) = inner.runs.get_mut(&run_id) {
            run.status_id = RunStatus::Success.id();
            run.archive = Some(archive.to_vec());
            run.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_error(&self, run_id: DbId, message: &str) -> Result<(), DbError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(run) = inner.runs.get_mut(&run_id) {
            run.status_id = RunStatus::Error.id();
            run.error_message = Some(message.to_string());
            run.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn cancel_queued(&self, project_id: DbId) -> Result<u64, DbError> {
        let mut inner = self.inner.lock().unwrap();
        let mut cancelled = 0;
        for run in inner.runs.values_mut() {
            if run.project_id == project_id && run.status() == RunStatus::Queued {
                run.status_id = RunStatus::Cancelled.id();
                run.updated_at = Utc::now();
                cancelled += 1;
            }
        }
        Ok(cancelled)
    }

    async fn count_created_since(&self, owner_id: DbId, since: Timestamp) -> Result<i64, DbError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .runs
            .values()
            .filter(|r| r.owner_id == owner_id && r.created_at >= since)
            .count() as i64)
    }

    async fn reclaim_stuck(&self, cutoff: Timestamp, message: &str) -> Result<Vec<Run>, DbError> {
        let mut inner = self.inner.lock().unwrap();
        let mut reclaimed = Vec::new();
        for run in inner.runs.values_mut() {
            if run.status() == RunStatus::InProgress && run.updated_at < cutoff {
                run.status_id = RunStatus::Error.id();
                run.error_message = Some(message.to_string());
                run.updated_at = Utc::now();
                reclaimed.push(run.clone());
            }
        }
        Ok(reclaimed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn new_project(owner_id: DbId) -> NewProject {
        NewProject {
            owner_id,
            group_id: "com.example".to_string(),
            artifact_id: "demo".to_string(),
            version: "0.0.1".to_string(),
            build_tool: "maven".to_string(),
            packaging: "jar".to_string(),
            runtime_version: "17".to_string(),
            spec_text: "app: {}\n".to_string(),
        }
    }

    fn new_run(project_id: DbId, owner_id: DbId) -> NewRun {
        NewRun {
            project_id,
            owner_id,
            run_type: "generation".to_string(),
        }
    }

    #[tokio::test]
    async fn run_numbers_are_monotonic_per_project() {
        let repo = InMemoryRepository::new();
        let a = ProjectRepository::create(&repo, &new_project(1)).await.unwrap();
        let b = ProjectRepository::create(&repo, &new_project(1)).await.unwrap();

        let a1 = RunRepository::create(&repo, &new_run(a.id, 1)).await.unwrap();
        let a2 = RunRepository::create(&repo, &new_run(a.id, 1)).await.unwrap();
        let b1 = RunRepository::create(&repo, &new_run(b.id, 1)).await.unwrap();

        assert_eq!(a1.run_number, 1);
        assert_eq!(a2.run_number, 2);
        assert_eq!(b1.run_number, 1);
    }

    #[tokio::test]
    async fn claim_succeeds_exactly_once() {
        let repo = InMemoryRepository::new();
        let project = ProjectRepository::create(&repo, &new_project(1)).await.unwrap();
        let run = RunRepository::create(&repo, &new_run(project.id, 1)).await.unwrap();

        assert!(repo.claim(run.id).await.unwrap());
        assert!(!repo.claim(run.id).await.unwrap());

        let claimed = RunRepository::find_by_id(&repo, run.id).await.unwrap().unwrap();
        assert_eq!(claimed.status(), RunStatus::InProgress);
    }

    #[tokio::test]
    async fn queued_runs_come_back_oldest_first_up_to_limit() {
        let repo = InMemoryRepository::new();
        let project = ProjectRepository::create(&repo, &new_project(1)).await.unwrap();
        for _ in 0..5 {
            RunRepository::create(&repo, &new_run(project.id, 1)).await.unwrap();
        }

        let queued = repo.find_queued(3).await.unwrap();
        assert_eq!(queued.len(), 3);
        assert_eq!(
            queued.iter().map(|r| r.run_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn cancel_queued_spares_in_progress_runs() {
        let repo = InMemoryRepository::new();
        let project = ProjectRepository::create(&repo, &new_project(1)).await.unwrap();
        let first = RunRepository::create(&repo, &new_run(project.id, 1)).await.unwrap();
        let second = RunRepository::create(&repo, &new_run(project.id, 1)).await.unwrap();
        repo.claim(first.id).await.unwrap();

        let cancelled = repo.cancel_queued(project.id).await.unwrap();
        assert_eq!(cancelled, 1);

        let first = RunRepository::find_by_id(&repo, first.id).await.unwrap().unwrap();
        let second = RunRepository::find_by_id(&repo, second.id).await.unwrap().unwrap();
        assert_eq!(first.status(), RunStatus::InProgress);
        assert_eq!(second.status(), RunStatus::Cancelled);
    }

    #[tokio::test]
    async fn reclaim_stuck_only_touches_stale_in_progress_runs() {
        let repo = InMemoryRepository::new();
        let project = ProjectRepository::create(&repo, &new_project(1)).await.unwrap();
        let stale = RunRepository::create(&repo, &new_run(project.id, 1)).await.unwrap();
        let fresh = RunRepository::create(&repo, &new_run(project.id, 1)).await.unwrap();
        repo.claim(stale.id).await.unwrap();
        repo.claim(fresh.id).await.unwrap();
        repo.set_run_updated_at(stale.id, Utc::now() - Duration::hours(1));

        let cutoff = Utc::now() - Duration::minutes(30);
        let reclaimed = repo.reclaim_stuck(cutoff, "stuck").await.unwrap();

        assert_eq!(reclaimed.len(), 1);
        assert_eq!(reclaimed[0].id, stale.id);
        let stale = RunRepository::find_by_id(&repo, stale.id).await.unwrap().unwrap();
        assert_eq!(stale.status(), RunStatus::Error);
        assert_eq!(stale.error_message.as_deref(), Some("stuck"));
        let fresh = RunRepository::find_by_id(&repo, fresh.id).await.unwrap().unwrap();
        assert_eq!(fresh.status(), RunStatus::InProgress);
    }

    #[tokio::test]
    async fn count_created_since_filters_by_owner_and_window() {
        let repo = InMemoryRepository::new();
        let project = ProjectRepository::create(&repo, &new_project(1)).await.unwrap();
        let old = RunRepository::create(&repo, &new_run(project.id, 1)).await.unwrap();
        RunRepository::create(&repo, &new_run(project.id, 1)).await.unwrap();
        RunRepository::create(&repo, &new_run(project.id, 2)).await.unwrap();
        repo.set_run_created_at(old.id, Utc::now() - Duration::days(2));

        let since = Utc::now() - Duration::days(1);
        assert_eq!(repo.count_created_since(1, since).await.unwrap(), 1);
        assert_eq!(repo.count_created_since(2, since).await.unwrap(), 1);
    }
}
