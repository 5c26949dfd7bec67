//! Stuck-run recovery job.
//!
//! The only mechanism that reclaims runs lost to a crashed or hung
//! worker: IN_PROGRESS runs whose `updated_at` is older than the stuck
//! threshold are force-transitioned to ERROR with a generic message.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use specforge_db::repositories::RunRepository;
use specforge_events::{GenerationEvent, ProgressPublisher};
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;

/// Generic message stored on reclaimed runs.
const STUCK_MESSAGE: &str = "generation timed out";

pub struct RecoveryJob {
    runs: Arc<dyn RunRepository>,
    publisher: Arc<ProgressPublisher>,
    interval: Duration,
    stuck_after: Duration,
}

impl RecoveryJob {
    pub fn new(
        runs: Arc<dyn RunRepository>,
        publisher: Arc<ProgressPublisher>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            runs,
            publisher,
            interval: config.recovery_interval,
            stuck_after: config.stuck_after,
        }
    }

    /// Run the scan loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            stuck_after_secs = self.stuck_after.as_secs(),
            "Recovery job started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Recovery job stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// One scan: reclaim every stale IN_PROGRESS run.
    pub async fn tick(&self) {
        let stuck_after = chrono::Duration::from_std(self.stuck_after)
            .unwrap_or_else(|_| chrono::Duration::minutes(30));
        let cutoff = Utc::now() - stuck_after;

        match self.runs.reclaim_stuck(cutoff, STUCK_MESSAGE).await {
            Ok(reclaimed) => {
                for run in reclaimed {
                    tracing::warn!(
                        run_id = run.id,
                        project_id = run.project_id,
                        "Reclaimed stuck run",
                    );
                    self.publisher
                        .publish(GenerationEvent::error(run.project_id, STUCK_MESSAGE))
                        .await;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Recovery scan failed");
            }
        }
    }
}
