//! Domain types and pure logic for kiosk fleet monitoring.
//!
//! Nothing in this crate performs I/O: the database layer (`kioskwatch-db`)
//! and the HTTP server (`kioskwatch-api`) feed values in and act on the
//! results.

#[macro_use]
mod labels;

pub mod alert;
pub mod error;
pub mod events;
pub mod kiosk;
pub mod roles;
pub mod thresholds;
pub mod types;
