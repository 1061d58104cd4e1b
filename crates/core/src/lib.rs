//! Solera Core - Shared domain library.
//!
//! This crate provides the types and rules shared by every Solera component:
//! - `storefront` - Public-facing sandal shop
//! - `admin` - Back-office panel
//! - `cli` - Migrations, seeding and admin-user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Pricing, coupon rules, order-status transitions and the
//! checkout wizard all live here so that both binaries agree on them.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, slugs and statuses
//! - [`pricing`] - Cart totals, coupon evaluation and shipping
//! - [`checkout`] - Multi-step checkout draft
//! - [`catalog`] - Size/color variant matrix for product pages
//! - [`pagination`] - Page arithmetic for listings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod checkout;
pub mod pagination;
pub mod pricing;
pub mod types;

pub use types::*;
