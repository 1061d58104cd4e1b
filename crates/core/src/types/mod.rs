//! Core types for Solera.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod gender;
pub mod id;
pub mod money;
pub mod slug;
pub mod status;
pub mod tracking;

pub use email::{Email, EmailError};
pub use gender::{Gender, GenderError};
pub use id::*;
pub use money::{CurrencyCode, Money};
pub use slug::{Slug, SlugError};
pub use status::*;
pub use tracking::{TrackingToken, TrackingTokenError};
