//! Integration tests for the append-only metric ledger.

use chrono::{Duration, Utc};
use kioskwatch_db::models::kiosk::{HeartbeatUpdate, HeartbeatUpsert};
use kioskwatch_db::models::metric::CreateKioskMetric;
use kioskwatch_db::repositories::{KioskRepo, MetricRepo};
use sqlx::PgPool;

/// Record a heartbeat in its own transaction.
async fn record_heartbeat(
    pool: &PgPool,
    device_id: &str,
    update: &HeartbeatUpdate,
) -> Result<HeartbeatUpsert, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let upsert = KioskRepo::upsert_heartbeat(&mut tx, device_id, update).await?;
    tx.commit().await?;
    Ok(upsert)
}

fn sample(cpu: f64) -> CreateKioskMetric {
    CreateKioskMetric {
        cpu_usage: Some(cpu),
        memory_usage: Some(40.0),
        disk_usage: Some(55.5),
        network_latency_ms: Some(35),
        active_users: Some(2),
        temperature_celsius: Some(41.5),
        uptime_seconds: Some(86_400),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_append_for_registered_kiosk(pool: PgPool) {
    let kiosk = record_heartbeat(&pool, "KIOSK_01", &HeartbeatUpdate::default())
        .await
        .unwrap()
        .kiosk;

    let stored = MetricRepo::append(&pool, "KIOSK_01", &sample(12.5))
        .await
        .unwrap()
        .expect("kiosk is registered");

    assert_eq!(stored.kiosk_id, kiosk.id);
    assert_eq!(stored.cpu_usage, Some(12.5));
    assert_eq!(stored.uptime_seconds, Some(86_400));
    assert_eq!(stored.temperature_celsius, Some(41.5));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_append_for_unknown_device_stores_nothing(pool: PgPool) {
    let stored = MetricRepo::append(&pool, "GHOST", &sample(12.5)).await.unwrap();
    assert!(stored.is_none());

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM kiosk_metrics")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_all_fields_optional(pool: PgPool) {
    record_heartbeat(&pool, "KIOSK_01", &HeartbeatUpdate::default())
        .await
        .unwrap();
    let stored = MetricRepo::append(&pool, "KIOSK_01", &CreateKioskMetric::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.cpu_usage, None);
    assert_eq!(stored.active_users, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_recent_is_newest_first_and_limited(pool: PgPool) {
    let kiosk = record_heartbeat(&pool, "KIOSK_01", &HeartbeatUpdate::default())
        .await
        .unwrap()
        .kiosk;
    for cpu in [10.0, 20.0, 30.0] {
        MetricRepo::append(&pool, "KIOSK_01", &sample(cpu)).await.unwrap();
    }

    let recent = MetricRepo::recent_for_kiosk(&pool, kiosk.id, 2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].cpu_usage, Some(30.0));
    assert_eq!(recent[1].cpu_usage, Some(20.0));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_older_than(pool: PgPool) {
    record_heartbeat(&pool, "KIOSK_01", &HeartbeatUpdate::default())
        .await
        .unwrap();
    let old = MetricRepo::append(&pool, "KIOSK_01", &sample(10.0))
        .await
        .unwrap()
        .unwrap();
    MetricRepo::append(&pool, "KIOSK_01", &sample(20.0)).await.unwrap();

    sqlx::query("UPDATE kiosk_metrics SET recorded_at = NOW() - INTERVAL '40 days' WHERE id = $1")
        .bind(old.id)
        .execute(&pool)
        .await
        .unwrap();

    let deleted = MetricRepo::delete_older_than(&pool, Utc::now() - Duration::days(30))
        .await
        .unwrap();
    assert_eq!(deleted, 1);
}
