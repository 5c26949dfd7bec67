//! Engine configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Tuning knobs for the queue worker, the worker pool, and the recovery
/// job. All fields have defaults suitable for local development; override
/// via environment variables in production.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How often the queue worker polls for QUEUED runs.
    pub poll_interval: Duration,
    /// Maximum QUEUED runs claimed per poll tick.
    pub batch_size: i64,
    /// Worker pool capacity: concurrent pipeline executions.
    pub pool_capacity: usize,
    /// How often the recovery job scans for stuck runs.
    pub recovery_interval: Duration,
    /// IN_PROGRESS runs not updated for this long are reclaimed to ERROR.
    pub stuck_after: Duration,
    /// Maximum runs one owner may create per 24-hour window.
    pub daily_run_cap: i64,
    /// Directory the per-run working directories are created under.
    pub work_root: PathBuf,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `QUEUE_POLL_INTERVAL_SECS`| `2`                     |
    /// | `QUEUE_BATCH_SIZE`        | `10`                    |
    /// | `WORKER_POOL_CAPACITY`    | `4`                     |
    /// | `RECOVERY_INTERVAL_SECS`  | `300`                   |
    /// | `STUCK_RUN_MINUTES`       | `30`                    |
    /// | `DAILY_RUN_CAP`           | `40`                    |
    /// | `WORK_ROOT`               | `<tmp>/specforge-runs`  |
    pub fn from_env() -> Self {
        let poll_interval_secs: u64 = std::env::var("QUEUE_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("QUEUE_POLL_INTERVAL_SECS must be a valid u64");

        let batch_size: i64 = std::env::var("QUEUE_BATCH_SIZE")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("QUEUE_BATCH_SIZE must be a valid i64");

        let pool_capacity: usize = std::env::var("WORKER_POOL_CAPACITY")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .expect("WORKER_POOL_CAPACITY must be a valid usize");

        let recovery_interval_secs: u64 = std::env::var("RECOVERY_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("RECOVERY_INTERVAL_SECS must be a valid u64");

        let stuck_minutes: u64 = std::env::var("STUCK_RUN_MINUTES")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("STUCK_RUN_MINUTES must be a valid u64");

        let daily_run_cap: i64 = std::env::var("DAILY_RUN_CAP")
            .unwrap_or_else(|_| "40".into())
            .parse()
            .expect("DAILY_RUN_CAP must be a valid i64");

        let work_root = std::env::var("WORK_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("specforge-runs"));

        Self {
            poll_interval: Duration::from_secs(poll_interval_secs),
            batch_size,
            pool_capacity,
            recovery_interval: Duration::from_secs(recovery_interval_secs),
            stuck_after: Duration::from_secs(stuck_minutes * 60),
            daily_run_cap,
            work_root,
        }
    }
}
