//! Run queue worker.
//!
//! Polls for QUEUED runs on a fixed interval and executes each in a
//! bounded worker pool. Claiming is a guarded QUEUED -> IN_PROGRESS
//! transition performed before the task starts, so a concurrent tick can
//! never hand the same run to two workers. Pool saturation leaves runs
//! QUEUED for the next tick — that is the backpressure mechanism.

use std::sync::Arc;
use std::time::Duration;

use specforge_db::models::{Project, Run};
use specforge_db::repositories::{ProjectRepository, RunRepository};
use specforge_events::{GenerationEvent, ProgressPublisher};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::executor::RunExecutor;

/// Error message stored when an execution task dies instead of returning.
const CRASHED_MESSAGE: &str = "generation worker crashed";

pub struct RunQueueWorker {
    projects: Arc<dyn ProjectRepository>,
    runs: Arc<dyn RunRepository>,
    publisher: Arc<ProgressPublisher>,
    executor: Arc<dyn RunExecutor>,
    pool: Arc<Semaphore>,
    batch_size: i64,
    poll_interval: Duration,
}

impl RunQueueWorker {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        runs: Arc<dyn RunRepository>,
        publisher: Arc<ProgressPublisher>,
        executor: Arc<dyn RunExecutor>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            projects,
            runs,
            publisher,
            executor,
            pool: Arc::new(Semaphore::new(config.pool_capacity)),
            batch_size: config.batch_size,
            poll_interval: config.poll_interval,
        }
    }

    /// Run the poll loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            capacity = self.pool.available_permits(),
            "Run queue worker started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Run queue worker shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// One dispatch cycle: claim up to a batch of QUEUED runs, oldest
    /// first, and submit each to the pool while permits last.
    pub async fn tick(&self) {
        let queued = match self.runs.find_queued(self.batch_size).await {
            Ok(queued) => queued,
            Err(e) => {
                tracing::error!(error = %e, "Failed to poll queued runs");
                return;
            }
        };

        for run in queued {
            let permit = match Arc::clone(&self.pool).try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    // Saturated: everything still QUEUED is retried on the
                    // next tick.
                    tracing::debug!("Worker pool saturated, leaving remaining runs queued");
                    break;
                }
            };

            // A run that is no longer QUEUED was cancelled or taken by a
            // concurrent tick; the guard makes the claim race-free.
            match self.runs.claim(run.id).await {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::error!(run_id = run.id, error = %e, "Failed to claim run");
                    continue;
                }
            }

            let project = match self.projects.find_by_id(run.project_id).await {
                Ok(Some(project)) => project,
                Ok(None) => {
                    self.finish_error(&run, "project no longer exists").await;
                    continue;
                }
                Err(e) => {
                    tracing::error!(run_id = run.id, error = %e, "Failed to load project");
                    self.finish_error(&run, "failed to load project").await;
                    continue;
                }
            };

            tracing::info!(
                run_id = run.id,
                project_id = project.id,
                run_number = run.run_number,
                "Run claimed for execution",
            );

            let runs = Arc::clone(&self.runs);
            let publisher = Arc::clone(&self.publisher);
            let executor = Arc::clone(&self.executor);
            tokio::spawn(async move {
                let _permit = permit;
                execute_one(runs, publisher, executor, project, run).await;
            });
        }
    }

    async fn finish_error(&self, run: &Run, message: &str) {
        if let Err(e) = self.runs.mark_error(run.id, message).await {
            tracing::error!(run_id = run.id, error = %e, "Failed to record run error");
        }
        self.publisher
            .publish(GenerationEvent::error(run.project_id, message))
            .await;
    }
}

/// Execute one claimed run and record its terminal state: persist first,
/// then publish, in that order.
///
/// The executor runs in its own task so a panic is contained at this
/// boundary and converted into a run ERROR instead of killing the pool.
async fn execute_one(
    runs: Arc<dyn RunRepository>,
    publisher: Arc<ProgressPublisher>,
    executor: Arc<dyn RunExecutor>,
    project: Project,
    run: Run,
) {
    let run_id = run.id;
    let project_id = project.id;
    let file_name = format!("{}.zip", project.artifact_id);

    let joined = tokio::spawn(async move { executor.execute(&project, &run).await }).await;

    match joined {
        Ok(Ok(archive)) => {
            if let Err(e) = runs.mark_success(run_id, &archive).await {
                tracing::error!(run_id, error = %e, "Failed to record run success");
                return;
            }
            tracing::info!(run_id, bytes = archive.len(), "Run succeeded");
            publisher
                .publish(GenerationEvent::success(project_id, file_name, &archive))
                .await;
        }
        Ok(Err(message)) => {
            if let Err(e) = runs.mark_error(run_id, &message).await {
                tracing::error!(run_id, error = %e, "Failed to record run error");
                return;
            }
            tracing::warn!(run_id, error = %message, "Run failed");
            publisher
                .publish(GenerationEvent::error(project_id, message))
                .await;
        }
        Err(join_error) => {
            tracing::error!(run_id, error = %join_error, "Execution task died");
            if let Err(e) = runs.mark_error(run_id, CRASHED_MESSAGE).await {
                tracing::error!(run_id, error = %e, "Failed to record run crash");
                return;
            }
            publisher
                .publish(GenerationEvent::error(project_id, CRASHED_MESSAGE))
                .await;
        }
    }
}
