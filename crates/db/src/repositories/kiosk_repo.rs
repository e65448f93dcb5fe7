//! Repository for the `kiosks` table (the device registry).
//!
//! The registry is the only writer of `kiosks.status`: heartbeats move a
//! kiosk ONLINE through [`KioskRepo::upsert_heartbeat`], and the offline
//! sweep moves it OFFLINE through [`KioskRepo::mark_offline`].

use kioskwatch_core::events::SystemEventType;
use kioskwatch_core::kiosk::KioskStatus;
use kioskwatch_core::types::{DbId, Timestamp};
use serde_json::json;
use sqlx::{PgConnection, PgPool};

use crate::models::kiosk::{FleetStats, HeartbeatUpdate, HeartbeatUpsert, Kiosk, StaleKiosk};
use crate::repositories::SystemEventRepo;

/// Column list for `kiosks` queries.
const COLUMNS: &str = "\
    id, device_id, location, ip_address, version, metadata, \
    status, last_heartbeat, created_at, updated_at";

/// Provides registry operations for kiosks.
pub struct KioskRepo;

impl KioskRepo {
    /// Record a heartbeat, registering the kiosk on first contact.
    ///
    /// Locks the existing row (if any) to capture the prior status, upserts
    /// the row as ONLINE with `last_heartbeat = NOW()`, and appends a
    /// `HEARTBEAT` event. Runs on the caller's connection; pass a
    /// transaction so follow-up writes for a status change commit with it.
    ///
    /// Text attributes omitted from `update` keep their stored values, and
    /// attributes set to `Some(None)` are cleared.
    pub async fn upsert_heartbeat(
        conn: &mut PgConnection,
        device_id: &str,
        update: &HeartbeatUpdate,
    ) -> Result<HeartbeatUpsert, sqlx::Error> {
        let previous: Option<String> =
            sqlx::query_scalar("SELECT status FROM kiosks WHERE device_id = $1 FOR UPDATE")
                .bind(device_id)
                .fetch_optional(&mut *conn)
                .await?;
        let previous_status = previous
            .map(KioskStatus::try_from)
            .transpose()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        let query = format!(
            "INSERT INTO kiosks \
                (device_id, location, ip_address, version, metadata, status, last_heartbeat) \
             VALUES ($1, $2, $3, $4, COALESCE($5, '{{}}'::jsonb), 'ONLINE', NOW()) \
             ON CONFLICT (device_id) DO UPDATE SET \
                location = CASE WHEN $6 THEN EXCLUDED.location ELSE kiosks.location END, \
                ip_address = CASE WHEN $7 THEN EXCLUDED.ip_address ELSE kiosks.ip_address END, \
                version = CASE WHEN $8 THEN EXCLUDED.version ELSE kiosks.version END, \
                metadata = COALESCE($5, kiosks.metadata), \
                status = 'ONLINE', \
                last_heartbeat = NOW(), \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        let kiosk = sqlx::query_as::<_, Kiosk>(&query)
            .bind(device_id)
            .bind(update.location.as_ref().and_then(|v| v.as_deref()))
            .bind(update.ip_address.as_ref().and_then(|v| v.as_deref()))
            .bind(update.version.as_ref().and_then(|v| v.as_deref()))
            .bind(update.metadata.as_ref())
            .bind(update.location.is_some())
            .bind(update.ip_address.is_some())
            .bind(update.version.is_some())
            .fetch_one(&mut *conn)
            .await?;

        SystemEventRepo::record(
            &mut *conn,
            Some(kiosk.id),
            SystemEventType::Heartbeat,
            &json!({
                "device_id": kiosk.device_id,
                "version": kiosk.version,
                "ip_address": kiosk.ip_address,
            }),
        )
        .await?;

        Ok(HeartbeatUpsert {
            kiosk,
            previous_status,
        })
    }

    /// Conditionally move an ONLINE kiosk to OFFLINE.
    ///
    /// The update only applies while the row still carries
    /// `expected_last_heartbeat`; a heartbeat that landed after the sweep
    /// selected the kiosk makes this a no-op and returns `None`.
    /// `last_heartbeat` itself is left untouched. On success a
    /// `STATUS_CHANGE` event is appended on the same connection, so the
    /// caller's transaction covers both writes.
    pub async fn mark_offline(
        conn: &mut PgConnection,
        kiosk_id: DbId,
        expected_last_heartbeat: Timestamp,
    ) -> Result<Option<Kiosk>, sqlx::Error> {
        let query = format!(
            "UPDATE kiosks SET status = 'OFFLINE', updated_at = NOW() \
             WHERE id = $1 AND status = 'ONLINE' AND last_heartbeat = $2 \
             RETURNING {COLUMNS}"
        );
        let kiosk = sqlx::query_as::<_, Kiosk>(&query)
            .bind(kiosk_id)
            .bind(expected_last_heartbeat)
            .fetch_optional(&mut *conn)
            .await?;

        if let Some(ref kiosk) = kiosk {
            SystemEventRepo::record(
                &mut *conn,
                Some(kiosk.id),
                SystemEventType::StatusChange,
                &json!({
                    "from": KioskStatus::Online,
                    "to": KioskStatus::Offline,
                    "last_heartbeat": kiosk.last_heartbeat,
                }),
            )
            .await?;
        }

        Ok(kiosk)
    }

    /// Find a kiosk by its external device identifier.
    pub async fn find_by_device_id(
        pool: &PgPool,
        device_id: &str,
    ) -> Result<Option<Kiosk>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM kiosks WHERE device_id = $1");
        sqlx::query_as::<_, Kiosk>(&query)
            .bind(device_id)
            .fetch_optional(pool)
            .await
    }

    /// List kiosks, newest-registered first, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        status: Option<KioskStatus>,
    ) -> Result<Vec<Kiosk>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM kiosks \
             WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Kiosk>(&query)
            .bind(status.map(KioskStatus::as_str))
            .fetch_all(pool)
            .await
    }

    /// ONLINE kiosks whose last heartbeat is strictly older than `cutoff`.
    ///
    /// Never-seen kiosks (`last_heartbeat IS NULL`) are never returned.
    pub async fn list_stale(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<StaleKiosk>, sqlx::Error> {
        sqlx::query_as::<_, StaleKiosk>(
            "SELECT id, device_id, last_heartbeat FROM kiosks \
             WHERE status = 'ONLINE' AND last_heartbeat < $1 \
             ORDER BY last_heartbeat",
        )
        .bind(cutoff)
        .fetch_all(pool)
        .await
    }

    /// Fleet-wide counters in a single statement (one consistent snapshot).
    pub async fn fleet_stats(pool: &PgPool) -> Result<FleetStats, sqlx::Error> {
        sqlx::query_as::<_, FleetStats>(
            "SELECT \
                COUNT(*) AS total, \
                COUNT(*) FILTER (WHERE status = 'ONLINE') AS online, \
                COUNT(*) FILTER (WHERE status = 'OFFLINE') AS offline, \
                (SELECT COUNT(*) FROM kiosk_alerts WHERE resolved = false) AS active_alerts, \
                (SELECT COUNT(*) FROM kiosk_alerts \
                    WHERE resolved = false AND severity = 'CRITICAL') AS critical_alerts \
             FROM kiosks",
        )
        .fetch_one(pool)
        .await
    }
}
