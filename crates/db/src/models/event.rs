//! System event audit trail model.

use kioskwatch_core::events::SystemEventType;
use kioskwatch_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the append-only `system_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SystemEvent {
    pub id: DbId,
    pub kiosk_id: Option<DbId>,
    #[sqlx(try_from = "String")]
    pub event_type: SystemEventType,
    pub event_data: serde_json::Value,
    pub created_at: Timestamp,
}
