//! Generator service: the narrow inbound interface for submitting specs
//! and requesting runs.
//!
//! Spec errors and ownership mismatches are rejected here, synchronously,
//! before anything reaches the pipeline. Run creation is capped per owner
//! over a rolling 24-hour window by a counting query; the read-then-decide
//! race at the boundary is accepted deliberately.

use std::sync::Arc;

use chrono::Utc;
use specforge_core::spec::parser::parse_spec;
use specforge_core::spec::validate::validate_spec;
use specforge_core::spec::{AppMeta, BuildTool};
use specforge_core::types::DbId;
use specforge_db::models::{NewProject, NewRun, Project, ProjectUpdate, Run};
use specforge_db::repositories::{ProjectRepository, RunRepository};
use specforge_events::{GenerationEvent, ProgressPublisher};
use tokio::sync::mpsc;

use crate::error::EngineError;

/// Run type recorded on every generation run.
const RUN_TYPE: &str = "generation";

pub struct GeneratorService {
    projects: Arc<dyn ProjectRepository>,
    runs: Arc<dyn RunRepository>,
    publisher: Arc<ProgressPublisher>,
    daily_run_cap: i64,
}

impl GeneratorService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        runs: Arc<dyn RunRepository>,
        publisher: Arc<ProgressPublisher>,
        daily_run_cap: i64,
    ) -> Self {
        Self {
            projects,
            runs,
            publisher,
            daily_run_cap,
        }
    }

    /// Create a project from a spec and queue its first run.
    pub async fn submit(
        &self,
        owner_id: DbId,
        spec_text: &str,
    ) -> Result<(Project, Run), EngineError> {
        let app = parse_and_validate(spec_text)?;
        self.check_daily_cap(owner_id).await?;

        let project = self
            .projects
            .create(&NewProject {
                owner_id,
                group_id: app.group.clone(),
                artifact_id: app.artifact.clone(),
                version: app.version.clone(),
                build_tool: build_tool_token(app.build_tool).to_string(),
                packaging: app.packaging.as_str().to_string(),
                runtime_version: app.runtime_version.clone(),
                spec_text: spec_text.to_string(),
            })
            .await?;
        let run = self.queue_run(&project).await?;
        Ok((project, run))
    }

    /// Replace a project's spec and queue a run for it. A prior run still
    /// QUEUED is cancelled first; an IN_PROGRESS run is left to finish.
    pub async fn update_and_generate(
        &self,
        project_id: DbId,
        owner_id: DbId,
        spec_text: &str,
    ) -> Result<Run, EngineError> {
        let project = self.owned_project(project_id, owner_id).await?;
        let app = parse_and_validate(spec_text)?;
        self.check_daily_cap(owner_id).await?;

        let cancelled = self.runs.cancel_queued(project.id).await?;
        if cancelled > 0 {
            tracing::info!(project_id, cancelled, "Cancelled superseded queued runs");
        }

        let project = self
            .projects
            .update_spec(
                project.id,
                &ProjectUpdate {
                    group_id: app.group.clone(),
                    artifact_id: app.artifact.clone(),
                    version: app.version.clone(),
                    build_tool: build_tool_token(app.build_tool).to_string(),
                    packaging: app.packaging.as_str().to_string(),
                    runtime_version: app.runtime_version.clone(),
                    spec_text: spec_text.to_string(),
                },
            )
            .await?
            .ok_or(EngineError::ProjectNotFound(project_id))?;

        self.queue_run(&project).await
    }

    /// Queue a run for the project's current spec. Idempotent: when a
    /// QUEUED or IN_PROGRESS run already exists it is returned instead of
    /// creating a duplicate.
    pub async fn generate(&self, project_id: DbId, owner_id: DbId) -> Result<Run, EngineError> {
        let project = self.owned_project(project_id, owner_id).await?;

        if let Some(active) = self.runs.find_active_for_project(project.id).await? {
            return Ok(active);
        }

        self.check_daily_cap(owner_id).await?;
        self.queue_run(&project).await
    }

    pub async fn get_run(&self, run_id: DbId, owner_id: DbId) -> Result<Run, EngineError> {
        let run = self
            .runs
            .find_by_id(run_id)
            .await?
            .ok_or(EngineError::RunNotFound(run_id))?;
        if run.owner_id != owner_id {
            return Err(EngineError::Forbidden);
        }
        Ok(run)
    }

    pub async fn list_runs(
        &self,
        project_id: DbId,
        owner_id: DbId,
    ) -> Result<Vec<Run>, EngineError> {
        let project = self.owned_project(project_id, owner_id).await?;
        Ok(self.runs.list_by_project(project.id).await?)
    }

    /// Subscribe to the project's next terminal generation event.
    pub async fn subscribe(
        &self,
        project_id: DbId,
        owner_id: DbId,
    ) -> Result<mpsc::UnboundedReceiver<GenerationEvent>, EngineError> {
        let project = self.owned_project(project_id, owner_id).await?;
        Ok(self.publisher.subscribe(project.id).await)
    }

    async fn owned_project(
        &self,
        project_id: DbId,
        owner_id: DbId,
    ) -> Result<Project, EngineError> {
        let project = self
            .projects
            .find_by_id(project_id)
            .await?
            .ok_or(EngineError::ProjectNotFound(project_id))?;
        if project.owner_id != owner_id {
            return Err(EngineError::Forbidden);
        }
        Ok(project)
    }

    async fn queue_run(&self, project: &Project) -> Result<Run, EngineError> {
        let run = self
            .runs
            .create(&NewRun {
                project_id: project.id,
                owner_id: project.owner_id,
                run_type: RUN_TYPE.to_string(),
            })
            .await?;
        tracing::info!(
            project_id = project.id,
            run_id = run.id,
            run_number = run.run_number,
            "Run queued",
        );
        Ok(run)
    }

    async fn check_daily_cap(&self, owner_id: DbId) -> Result<(), EngineError> {
        let since = Utc::now() - chrono::Duration::hours(24);
        let created = self.runs.count_created_since(owner_id, since).await?;
        if created >= self.daily_run_cap {
            return Err(EngineError::DailyCapExceeded);
        }
        Ok(())
    }
}

/// Parse and validate a spec, returning its build metadata. Any failure is
/// a submitter-visible spec error.
fn parse_and_validate(spec_text: &str) -> Result<AppMeta, EngineError> {
    let spec = parse_spec(spec_text)?;
    validate_spec(&spec)?;
    Ok(spec.app)
}

fn build_tool_token(tool: BuildTool) -> &'static str {
    match tool {
        BuildTool::Maven => "maven",
        BuildTool::Gradle => "gradle",
        BuildTool::GradleKotlin => "gradle-kotlin",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
