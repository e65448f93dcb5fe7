//! Repository for the `kiosk_alerts` table.
//!
//! At most one unresolved alert may exist per `(kiosk_id, alert_type)`.
//! The partial unique index `uq_kiosk_alerts_open` enforces this, so
//! concurrent opens for the same pair converge on a single row instead of
//! racing a check-then-insert.

use kioskwatch_core::alert::AlertType;
use kioskwatch_core::error::CoreError;
use kioskwatch_core::events::SystemEventType;
use kioskwatch_core::types::DbId;
use serde_json::json;
use sqlx::{PgConnection, PgPool};

use crate::error::RepoError;
use crate::models::alert::{AlertFilter, AlertWithKiosk, CreateAlert, KioskAlert, OpenedAlert};
use crate::repositories::SystemEventRepo;

/// Column list for `kiosk_alerts` queries.
const COLUMNS: &str = "\
    id, kiosk_id, alert_type, severity, message, details, \
    resolved, resolved_at, resolved_by, created_at";

/// The same columns qualified with the `a` alias, for joins.
const QUALIFIED_COLUMNS: &str = "\
    a.id, a.kiosk_id, a.alert_type, a.severity, a.message, a.details, \
    a.resolved, a.resolved_at, a.resolved_by, a.created_at";

/// An insert that lost the race to an alert which was resolved before we
/// could read it is retried this many times.
const OPEN_ATTEMPTS: usize = 3;

/// Provides lifecycle operations for kiosk alerts.
pub struct AlertRepo;

impl AlertRepo {
    /// Open an alert, or return the unresolved alert of the same type that
    /// already exists for the kiosk.
    ///
    /// An `ALERT_OPENED` event is appended only when a new row is created.
    /// Runs on the caller's connection so it can join an outer transaction.
    /// Fails with [`CoreError::Conflict`] if every attempt loses its race.
    pub async fn open(
        conn: &mut PgConnection,
        input: &CreateAlert,
    ) -> Result<OpenedAlert, RepoError> {
        let insert = format!(
            "INSERT INTO kiosk_alerts (kiosk_id, alert_type, severity, message, details) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (kiosk_id, alert_type) WHERE resolved = false DO NOTHING \
             RETURNING {COLUMNS}"
        );

        for _ in 0..OPEN_ATTEMPTS {
            let inserted = sqlx::query_as::<_, KioskAlert>(&insert)
                .bind(input.kiosk_id)
                .bind(input.alert_type.as_str())
                .bind(input.severity.as_str())
                .bind(&input.message)
                .bind(&input.details)
                .fetch_optional(&mut *conn)
                .await?;

            if let Some(alert) = inserted {
                SystemEventRepo::record(
                    &mut *conn,
                    Some(alert.kiosk_id),
                    SystemEventType::AlertOpened,
                    &json!({
                        "alert_id": alert.id,
                        "alert_type": alert.alert_type,
                        "severity": alert.severity,
                    }),
                )
                .await?;
                return Ok(OpenedAlert {
                    alert,
                    created: true,
                });
            }

            if let Some(alert) =
                Self::find_open_of_type(&mut *conn, input.kiosk_id, input.alert_type).await?
            {
                return Ok(OpenedAlert {
                    alert,
                    created: false,
                });
            }

            tracing::debug!(
                kiosk_id = input.kiosk_id,
                alert_type = %input.alert_type,
                "Conflicting alert resolved before it could be read, retrying open",
            );
        }

        Err(CoreError::Conflict(format!(
            "could not open {} alert for kiosk {} after {OPEN_ATTEMPTS} attempts",
            input.alert_type, input.kiosk_id
        ))
        .into())
    }

    /// Mark an alert resolved.
    ///
    /// Resolving an already-resolved alert succeeds and re-stamps
    /// `resolved_at` and `resolved_by`. Returns `None` if the alert does
    /// not exist.
    pub async fn resolve(
        pool: &PgPool,
        id: DbId,
        resolved_by: &str,
    ) -> Result<Option<KioskAlert>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE kiosk_alerts \
             SET resolved = true, resolved_at = NOW(), resolved_by = $2 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let alert = sqlx::query_as::<_, KioskAlert>(&query)
            .bind(id)
            .bind(resolved_by)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(ref alert) = alert {
            Self::record_resolved(&mut tx, alert).await?;
        }

        tx.commit().await?;
        Ok(alert)
    }

    /// Resolve the unresolved alert of `alert_type` for a kiosk, if any.
    pub async fn resolve_open_of_type(
        conn: &mut PgConnection,
        kiosk_id: DbId,
        alert_type: AlertType,
        resolved_by: &str,
    ) -> Result<Option<KioskAlert>, sqlx::Error> {
        let query = format!(
            "UPDATE kiosk_alerts \
             SET resolved = true, resolved_at = NOW(), resolved_by = $3 \
             WHERE kiosk_id = $1 AND alert_type = $2 AND resolved = false \
             RETURNING {COLUMNS}"
        );
        let alert = sqlx::query_as::<_, KioskAlert>(&query)
            .bind(kiosk_id)
            .bind(alert_type.as_str())
            .bind(resolved_by)
            .fetch_optional(&mut *conn)
            .await?;

        if let Some(ref alert) = alert {
            Self::record_resolved(conn, alert).await?;
        }

        Ok(alert)
    }

    /// List alerts with their kiosk identity, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &AlertFilter,
        limit: i64,
    ) -> Result<Vec<AlertWithKiosk>, sqlx::Error> {
        let query = format!(
            "SELECT {QUALIFIED_COLUMNS}, k.device_id, k.location \
             FROM kiosk_alerts a \
             JOIN kiosks k ON k.id = a.kiosk_id \
             WHERE ($1::boolean IS NULL OR a.resolved = $1) \
               AND ($2::text IS NULL OR a.severity = $2) \
             ORDER BY a.created_at DESC, a.id DESC \
             LIMIT $3"
        );
        sqlx::query_as::<_, AlertWithKiosk>(&query)
            .bind(filter.resolved)
            .bind(filter.severity.map(|s| s.as_str()))
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Unresolved alerts for one kiosk, newest first.
    pub async fn list_open_for_kiosk(
        pool: &PgPool,
        kiosk_id: DbId,
    ) -> Result<Vec<KioskAlert>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM kiosk_alerts \
             WHERE kiosk_id = $1 AND resolved = false \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, KioskAlert>(&query)
            .bind(kiosk_id)
            .fetch_all(pool)
            .await
    }

    async fn find_open_of_type(
        conn: &mut PgConnection,
        kiosk_id: DbId,
        alert_type: AlertType,
    ) -> Result<Option<KioskAlert>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM kiosk_alerts \
             WHERE kiosk_id = $1 AND alert_type = $2 AND resolved = false"
        );
        sqlx::query_as::<_, KioskAlert>(&query)
            .bind(kiosk_id)
            .bind(alert_type.as_str())
            .fetch_optional(conn)
            .await
    }

    async fn record_resolved(
        conn: &mut PgConnection,
        alert: &KioskAlert,
    ) -> Result<(), sqlx::Error> {
        SystemEventRepo::record(
            conn,
            Some(alert.kiosk_id),
            SystemEventType::AlertResolved,
            &json!({
                "alert_id": alert.id,
                "alert_type": alert.alert_type,
                "resolved_by": alert.resolved_by,
            }),
        )
        .await?;
        Ok(())
    }
}
