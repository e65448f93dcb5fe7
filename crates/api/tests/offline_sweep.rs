//! Integration tests for the offline sweep and its scheduler.

mod common;

use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use kioskwatch_api::background::offline_sweep::{sweep, OfflineSweeper, SweepOutcome};
use kioskwatch_api::config::MonitorConfig;
use kioskwatch_core::alert::AlertType;
use kioskwatch_core::kiosk::KioskStatus;
use kioskwatch_db::models::kiosk::HeartbeatUpdate;
use kioskwatch_db::repositories::{AlertRepo, KioskRepo};
use sqlx::PgPool;

const TIMEOUT_MINUTES: i64 = 5;

async fn register(pool: &PgPool, device_id: &str) -> i64 {
    let mut tx = pool.begin().await.unwrap();
    let id = KioskRepo::upsert_heartbeat(&mut tx, device_id, &HeartbeatUpdate::default())
        .await
        .unwrap()
        .kiosk
        .id;
    tx.commit().await.unwrap();
    id
}

async fn status_of(pool: &PgPool, device_id: &str) -> KioskStatus {
    KioskRepo::find_by_device_id(pool, device_id)
        .await
        .unwrap()
        .unwrap()
        .status
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sweep_marks_only_stale_kiosks(pool: PgPool) {
    let stale_id = register(&pool, "KIOSK_STALE").await;
    register(&pool, "KIOSK_FRESH").await;
    common::age_heartbeat(&pool, "KIOSK_STALE", 10).await;

    let outcome = sweep(&pool, Utc::now(), Duration::minutes(TIMEOUT_MINUTES))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SweepOutcome {
            marked_offline: 1,
            skipped: 0,
            failed: 0,
        }
    );

    assert_eq!(status_of(&pool, "KIOSK_STALE").await, KioskStatus::Offline);
    assert_eq!(status_of(&pool, "KIOSK_FRESH").await, KioskStatus::Online);

    let alerts = AlertRepo::list_open_for_kiosk(&pool, stale_id).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].known_type(), Some(AlertType::KioskOffline));
    assert!(alerts[0].message.contains("KIOSK_STALE"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeated_sweeps_are_idempotent(pool: PgPool) {
    let id = register(&pool, "KIOSK_01").await;
    common::age_heartbeat(&pool, "KIOSK_01", 10).await;

    let timeout = Duration::minutes(TIMEOUT_MINUTES);
    let first = sweep(&pool, Utc::now(), timeout).await.unwrap();
    let second = sweep(&pool, Utc::now(), timeout).await.unwrap();

    assert_eq!(first.marked_offline, 1);
    assert_eq!(second, SweepOutcome::default());
    assert_eq!(
        AlertRepo::list_open_for_kiosk(&pool, id).await.unwrap().len(),
        1
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn heartbeat_exactly_at_cutoff_is_not_stale(pool: PgPool) {
    register(&pool, "KIOSK_EDGE").await;
    let seen = KioskRepo::find_by_device_id(&pool, "KIOSK_EDGE")
        .await
        .unwrap()
        .unwrap()
        .last_heartbeat
        .unwrap();

    let timeout = Duration::minutes(TIMEOUT_MINUTES);
    let outcome = sweep(&pool, seen + timeout, timeout).await.unwrap();
    assert_eq!(outcome.marked_offline, 0);

    let outcome = sweep(&pool, seen + timeout + Duration::seconds(1), timeout)
        .await
        .unwrap();
    assert_eq!(outcome.marked_offline, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn offline_again_reuses_open_alert(pool: PgPool) {
    let id = register(&pool, "KIOSK_02").await;
    let timeout = Duration::minutes(TIMEOUT_MINUTES);

    common::age_heartbeat(&pool, "KIOSK_02", 10).await;
    sweep(&pool, Utc::now(), timeout).await.unwrap();

    // Recover without resolving, then fall silent again.
    register(&pool, "KIOSK_02").await;
    common::age_heartbeat(&pool, "KIOSK_02", 10).await;
    let outcome = sweep(&pool, Utc::now(), timeout).await.unwrap();

    assert_eq!(outcome.marked_offline, 1);
    assert_eq!(status_of(&pool, "KIOSK_02").await, KioskStatus::Offline);
    assert_eq!(
        AlertRepo::list_open_for_kiosk(&pool, id).await.unwrap().len(),
        1
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn scheduler_sweeps_until_shutdown(pool: PgPool) {
    register(&pool, "KIOSK_03").await;
    common::age_heartbeat(&pool, "KIOSK_03", 10).await;

    let config = MonitorConfig {
        sweep_interval_secs: 1,
        ..MonitorConfig::default()
    };
    let handle = OfflineSweeper::new(pool.clone(), &config).spawn();

    // The first tick fires immediately.
    let mut status = KioskStatus::Online;
    for _ in 0..50 {
        status = status_of(&pool, "KIOSK_03").await;
        if status == KioskStatus::Offline {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(100)).await;
    }
    assert_eq!(status, KioskStatus::Offline);

    tokio::time::timeout(StdDuration::from_secs(5), handle.shutdown(StdDuration::from_secs(2)))
        .await
        .expect("sweeper should stop promptly");
}
