//! Well-known role name constants.
//!
//! These must match the values stored in `users.role`.

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_USER: &str = "USER";
