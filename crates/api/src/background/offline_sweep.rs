//! Offline detection.
//!
//! Periodically selects ONLINE kiosks whose last heartbeat is older than the
//! timeout, marks each OFFLINE, and opens a `KIOSK_OFFLINE` alert for it.
//!
//! A heartbeat can land between the candidate scan and the status update.
//! [`KioskRepo::mark_offline`] is a compare-and-swap on the heartbeat value
//! read during the scan, so such a kiosk is skipped instead of being marked
//! offline right after it checked in.

use std::time::Duration;

use chrono::Utc;
use kioskwatch_core::alert::{offline_message, AlertType, Severity};
use kioskwatch_core::kiosk::heartbeat_cutoff;
use kioskwatch_core::types::Timestamp;
use kioskwatch_db::error::RepoError;
use kioskwatch_db::models::alert::{CreateAlert, KioskAlert};
use kioskwatch_db::models::kiosk::StaleKiosk;
use kioskwatch_db::repositories::{AlertRepo, KioskRepo};
use serde_json::json;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::MonitorConfig;

/// Counters for a single sweep run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Kiosks moved to OFFLINE (each with an alert).
    pub marked_offline: usize,
    /// Candidates that heartbeated after selection.
    pub skipped: usize,
    /// Candidates whose update failed and was rolled back.
    pub failed: usize,
}

/// Run one sweep as of `now`.
///
/// Each candidate is handled in its own transaction, so a failure on one
/// kiosk rolls back only that kiosk and the sweep moves on. Only a failure
/// of the candidate scan itself fails the sweep.
pub async fn sweep(
    pool: &PgPool,
    now: Timestamp,
    timeout: chrono::Duration,
) -> Result<SweepOutcome, sqlx::Error> {
    let cutoff = heartbeat_cutoff(now, timeout);
    let candidates = KioskRepo::list_stale(pool, cutoff).await?;
    let mut outcome = SweepOutcome::default();

    for kiosk in &candidates {
        match mark_one_offline(pool, kiosk, timeout).await {
            Ok(Some(alert)) => {
                outcome.marked_offline += 1;
                tracing::warn!(
                    device_id = %kiosk.device_id,
                    kiosk_id = kiosk.id,
                    alert_id = alert.id,
                    last_heartbeat = %kiosk.last_heartbeat,
                    "Kiosk marked offline",
                );
            }
            Ok(None) => {
                outcome.skipped += 1;
                tracing::debug!(
                    device_id = %kiosk.device_id,
                    kiosk_id = kiosk.id,
                    "Heartbeat arrived during sweep, skipping",
                );
            }
            Err(e) => {
                outcome.failed += 1;
                tracing::error!(
                    device_id = %kiosk.device_id,
                    kiosk_id = kiosk.id,
                    error = %e,
                    "Failed to mark kiosk offline",
                );
            }
        }
    }

    Ok(outcome)
}

/// Mark one candidate offline and open its alert, atomically.
///
/// Returns `None` when the compare-and-swap misses.
async fn mark_one_offline(
    pool: &PgPool,
    kiosk: &StaleKiosk,
    timeout: chrono::Duration,
) -> Result<Option<KioskAlert>, RepoError> {
    let mut tx = pool.begin().await?;

    if KioskRepo::mark_offline(&mut tx, kiosk.id, kiosk.last_heartbeat)
        .await?
        .is_none()
    {
        return Ok(None);
    }

    let opened = AlertRepo::open(
        &mut tx,
        &CreateAlert {
            kiosk_id: kiosk.id,
            alert_type: AlertType::KioskOffline,
            severity: Severity::Critical,
            message: offline_message(&kiosk.device_id),
            details: json!({
                "last_heartbeat": kiosk.last_heartbeat,
                "timeout_seconds": timeout.num_seconds(),
            }),
        },
    )
    .await?;

    tx.commit().await?;
    Ok(Some(opened.alert))
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Scheduled offline sweep.
///
/// Runs are awaited inline in the tick loop and missed ticks are skipped,
/// so a slow sweep delays the next one rather than overlapping it.
pub struct OfflineSweeper {
    pool: PgPool,
    heartbeat_timeout: chrono::Duration,
    interval: Duration,
    run_timeout: Duration,
}

impl OfflineSweeper {
    pub fn new(pool: PgPool, config: &MonitorConfig) -> Self {
        Self {
            pool,
            heartbeat_timeout: config.heartbeat_timeout(),
            interval: config.sweep_interval(),
            run_timeout: config.sweep_timeout(),
        }
    }

    /// Spawn the sweep loop and return a handle that owns it.
    pub fn spawn(self) -> SweeperHandle {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            self.run(task_cancel).await;
        });
        SweeperHandle { cancel, handle }
    }

    /// Run the sweep loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            heartbeat_timeout_secs = self.heartbeat_timeout.num_seconds(),
            "Offline sweeper started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Offline sweeper shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_once().await;
                }
            }
        }
    }

    /// One bounded sweep. Failures are logged and retried on the next tick.
    async fn run_once(&self) {
        let run = sweep(&self.pool, Utc::now(), self.heartbeat_timeout);
        match tokio::time::timeout(self.run_timeout, run).await {
            Ok(Ok(outcome)) if outcome.marked_offline > 0 || outcome.failed > 0 => {
                tracing::warn!(
                    marked_offline = outcome.marked_offline,
                    skipped = outcome.skipped,
                    failed = outcome.failed,
                    "Offline sweep completed",
                );
            }
            Ok(Ok(outcome)) => {
                tracing::debug!(skipped = outcome.skipped, "Offline sweep found nothing to do");
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Offline sweep failed");
            }
            Err(_) => {
                tracing::error!(
                    timeout_secs = self.run_timeout.as_secs(),
                    "Offline sweep timed out",
                );
            }
        }
    }
}

/// Owns a running [`OfflineSweeper`] task.
pub struct SweeperHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    /// Cancel the loop and wait up to `grace` for it to finish.
    pub async fn shutdown(self, grace: Duration) {
        self.cancel.cancel();
        if tokio::time::timeout(grace, self.handle).await.is_err() {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                "Offline sweeper did not stop within the grace period",
            );
        }
    }
}
