//! Repository for the append-only `system_events` table.

use kioskwatch_core::events::SystemEventType;
use kioskwatch_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::event::SystemEvent;

/// Column list for `system_events` queries.
const COLUMNS: &str = "id, kiosk_id, event_type, event_data, created_at";

/// Provides write and inspection operations for the audit trail.
pub struct SystemEventRepo;

impl SystemEventRepo {
    /// Append an event, returning its generated ID.
    ///
    /// Accepts any executor so callers can record inside their own
    /// transaction.
    pub async fn record<'e, E>(
        executor: E,
        kiosk_id: Option<DbId>,
        event_type: SystemEventType,
        event_data: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "INSERT INTO system_events (kiosk_id, event_type, event_data) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(kiosk_id)
        .bind(event_type.as_str())
        .bind(event_data)
        .fetch_one(executor)
        .await
    }

    /// List events for a kiosk, newest first.
    pub async fn list_for_kiosk(
        pool: &PgPool,
        kiosk_id: DbId,
        limit: i64,
    ) -> Result<Vec<SystemEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM system_events \
             WHERE kiosk_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, SystemEvent>(&query)
            .bind(kiosk_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
