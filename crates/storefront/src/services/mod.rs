//! Business services.
//!
//! Services sit between route handlers and the repositories: they own the
//! session-backed cart and checkout draft, customer authentication and the
//! bundled location data.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod flash;
pub mod locations;
pub mod markdown;
