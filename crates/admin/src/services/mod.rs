//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Email and password authentication for admin users

pub mod auth;

pub use auth::{AdminAuthError, AdminAuthService};
