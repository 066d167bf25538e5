//! Bearer-token authentication.
//!
//! Login, sessions and password storage live outside this service; it only
//! issues and verifies the access tokens they hand out.

pub mod jwt;
