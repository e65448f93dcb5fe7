//! Opt-in cleanup of old kiosk metric samples.
//!
//! Samples are kept indefinitely unless `METRICS_RETENTION_DAYS` is set, in
//! which case this task deletes rows from `kiosk_metrics` older than the
//! retention period on a fixed interval.

use std::time::Duration;

use chrono::Utc;
use kioskwatch_db::repositories::MetricRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the metrics retention loop.
///
/// Deletes samples older than `retention_days`. Runs until `cancel` is
/// triggered.
pub async fn run(pool: PgPool, retention_days: i64, cancel: CancellationToken) {
    tracing::info!(
        retention_days,
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Metrics retention job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Metrics retention job stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::days(retention_days);
                match MetricRepo::delete_older_than(&pool, cutoff).await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "Metrics retention: purged old samples");
                    }
                    Ok(_) => {
                        tracing::debug!("Metrics retention: no samples to purge");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Metrics retention: cleanup failed");
                    }
                }
            }
        }
    }
}
