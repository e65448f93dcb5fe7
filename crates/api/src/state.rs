use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: kioskwatch_db::DbPool,
    /// Server configuration, including monitoring policy.
    pub config: Arc<ServerConfig>,
    /// Verifies admin bearer tokens (local JWT or the remote auth service).
    pub verifier: Arc<dyn TokenVerifier>,
}
