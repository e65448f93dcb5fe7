//! Monitoring workflows that span several repositories.
//!
//! Handlers stay thin: they authenticate, validate, and delegate here.
//!
//! - [`heartbeat`] -- registry upsert plus recovery handling.
//! - [`metrics`] -- ledger append, threshold evaluation, alert opening.
//! - [`reporting`] -- read-only fleet and device views.

pub mod heartbeat;
pub mod metrics;
pub mod reporting;
