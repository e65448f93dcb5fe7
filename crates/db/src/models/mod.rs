//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts, where the entity accepts writes

pub mod alert;
pub mod event;
pub mod kiosk;
pub mod metric;
