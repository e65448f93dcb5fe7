pub mod health;
pub mod monitor;

use axum::Router;

use crate::state::AppState;

/// Build the monitoring route tree, nested under `/api/monitor` by the
/// server.
///
/// Route hierarchy:
///
/// ```text
/// /heartbeat                         kiosk heartbeat (POST, kiosk key)
/// /metrics                           kiosk metric sample (POST, kiosk key)
///
/// /kiosks                            list kiosks, ?status= (admin)
/// /kiosks/{device_id}                kiosk detail (admin)
/// /alerts                            list alerts, ?resolved=&severity= (admin)
/// /alerts/{id}/resolve               resolve alert (PUT, admin)
/// /stats                             fleet counters (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(monitor::kiosk_router())
        .merge(monitor::admin_router())
}
