//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the verified operator from a Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`kiosk::KioskIdentity`] -- Authenticates a kiosk by fleet key and device id.

pub mod auth;
pub mod kiosk;
pub mod rbac;
