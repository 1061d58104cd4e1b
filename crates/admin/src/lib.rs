//! Solera Admin library.
//!
//! This crate provides the back office as a library so the binary, the CLI
//! and tests share the same services.
//!
//! # Security
//!
//! The panel can change prices, stock, coupons and order status. Every
//! route except the login form requires an admin session, viewers are
//! read-only, and admin-user management is limited to super admins.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
