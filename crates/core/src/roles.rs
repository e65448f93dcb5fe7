//! Well-known role name constants.
//!
//! Role names are issued by the external auth service; only `admin` may use
//! the fleet monitoring endpoints.

pub const ROLE_ADMIN: &str = "admin";
