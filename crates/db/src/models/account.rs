//! Customer and admin accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use solera_core::{AdminRole, AdminUserId, Email, UserId};

/// A storefront customer account.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A customer together with the stored password hash, for login only.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Customer listing row for the admin panel.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub user: User,
    pub order_count: i64,
}

/// A back-office user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An admin together with the stored password hash, for login only.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminCredentials {
    #[sqlx(flatten)]
    pub admin: AdminUser,
    pub password_hash: String,
}
