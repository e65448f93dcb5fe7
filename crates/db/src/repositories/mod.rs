//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` (or a connection, where the caller owns the
//! transaction) as the first argument.

pub mod alert_repo;
pub mod kiosk_repo;
pub mod metric_repo;
pub mod system_event_repo;

pub use alert_repo::AlertRepo;
pub use kiosk_repo::KioskRepo;
pub use metric_repo::MetricRepo;
pub use system_event_repo::SystemEventRepo;
