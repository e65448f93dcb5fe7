//! Heartbeat processing.

use kioskwatch_core::alert::{AlertType, RECOVERY_RESOLVER};
use kioskwatch_core::events::SystemEventType;
use kioskwatch_core::kiosk::{is_recovery, KioskStatus};
use kioskwatch_db::models::kiosk::{HeartbeatUpdate, Kiosk};
use kioskwatch_db::repositories::{AlertRepo, KioskRepo, SystemEventRepo};
use serde_json::json;
use sqlx::PgPool;

use crate::config::MonitorConfig;
use crate::error::AppResult;

/// Record a heartbeat from an authenticated kiosk.
///
/// Registers the kiosk on first contact and marks it ONLINE. When the kiosk
/// was previously OFFLINE, a `STATUS_CHANGE` event is appended. The open
/// `KIOSK_OFFLINE` alert stays open for an operator to resolve unless
/// `auto_resolve_offline_on_recovery` is set. The status flip and its
/// recovery writes commit together or not at all.
pub async fn process_heartbeat(
    pool: &PgPool,
    policy: &MonitorConfig,
    device_id: &str,
    update: &HeartbeatUpdate,
) -> AppResult<Kiosk> {
    let mut tx = pool.begin().await?;

    let upsert = KioskRepo::upsert_heartbeat(&mut tx, device_id, update).await?;
    let kiosk = upsert.kiosk;
    let recovered = is_recovery(upsert.previous_status, kiosk.status);

    let mut auto_resolved = None;
    if recovered {
        SystemEventRepo::record(
            &mut *tx,
            Some(kiosk.id),
            SystemEventType::StatusChange,
            &json!({
                "from": KioskStatus::Offline,
                "to": KioskStatus::Online,
            }),
        )
        .await?;

        if policy.auto_resolve_offline_on_recovery {
            auto_resolved = AlertRepo::resolve_open_of_type(
                &mut tx,
                kiosk.id,
                AlertType::KioskOffline,
                RECOVERY_RESOLVER,
            )
            .await?;
        }
    }

    tx.commit().await?;

    if upsert.previous_status.is_none() {
        tracing::info!(device_id, kiosk_id = kiosk.id, "Kiosk registered");
    } else if recovered {
        tracing::info!(
            device_id,
            kiosk_id = kiosk.id,
            resolved_alert_id = auto_resolved.as_ref().map(|a| a.id),
            "Kiosk recovered from OFFLINE",
        );
    } else {
        tracing::debug!(device_id, kiosk_id = kiosk.id, "Heartbeat recorded");
    }

    Ok(kiosk)
}
