//! Worker binary: wires the run queue worker and the recovery job to the
//! PostgreSQL repository and runs both until interrupted.

use std::sync::Arc;

use specforge_codegen::deps::MavenCentralLookup;
use specforge_db::repositories::postgres::PgRepository;
use specforge_db::repositories::{ProjectRepository, RunRepository};
use specforge_engine::executor::PipelineExecutor;
use specforge_engine::queue::RunQueueWorker;
use specforge_engine::recovery::RecoveryJob;
use specforge_engine::EngineConfig;
use specforge_events::ProgressPublisher;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "specforge_worker=debug,specforge_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env();
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    let repository = Arc::new(PgRepository::new(pool));
    repository.migrate().await?;

    std::fs::create_dir_all(&config.work_root)?;

    let publisher = Arc::new(ProgressPublisher::new());
    let executor = Arc::new(PipelineExecutor::new(
        config.work_root.clone(),
        Arc::new(MavenCentralLookup::new()),
    ));

    let queue_worker = RunQueueWorker::new(
        Arc::clone(&repository) as Arc<dyn ProjectRepository>,
        Arc::clone(&repository) as Arc<dyn RunRepository>,
        Arc::clone(&publisher),
        executor,
        &config,
    );
    let recovery = RecoveryJob::new(
        Arc::clone(&repository) as Arc<dyn RunRepository>,
        Arc::clone(&publisher),
        &config,
    );

    let cancel = CancellationToken::new();
    let queue_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move { queue_worker.run(cancel).await })
    };
    let recovery_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move { recovery.run(cancel).await })
    };

    tracing::info!("Worker started");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, draining");
    cancel.cancel();
    let _ = queue_task.await;
    let _ = recovery_task.await;

    Ok(())
}
