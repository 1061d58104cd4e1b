//! Domain models for admin.
//!
//! Store data types live in `solera-db`; this module only holds what the
//! admin keeps in its own session.

pub mod session;

pub use session::{CurrentAdmin, keys as session_keys};
