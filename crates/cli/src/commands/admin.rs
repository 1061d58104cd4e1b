//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! solera admin create -e deniz@solera.shop -n "Deniz Kaya" -r super_admin -p '...'
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `SOLERA_ADMIN_PASSWORD` - Password used when `-p` is omitted

use solera_admin::services::{AdminAuthError, AdminAuthService};
use solera_core::{AdminRole, AdminUserId};

use super::{ConnectError, connect};

const PASSWORD_VAR: &str = "SOLERA_ADMIN_PASSWORD";

/// Errors that can occur during admin operations.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: super_admin, admin, viewer")]
    InvalidRole(String),

    /// Neither `-p` nor the environment variable was given.
    #[error("No password given. Pass -p or set {PASSWORD_VAR}")]
    MissingPassword,

    /// Email, name or password rejected, or the account exists.
    #[error("{0}")]
    Auth(#[from] AdminAuthError),
}

/// Create a new admin user.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `name` - Admin's display name
/// * `role` - Admin's role (`super_admin`, `admin`, or `viewer`)
/// * `password` - Initial password; read from `SOLERA_ADMIN_PASSWORD` when `None`
///
/// # Returns
///
/// The ID of the created admin user.
///
/// # Errors
///
/// Returns `AdminError` if the input is rejected or the insert fails.
pub async fn create_user(
    email: &str,
    name: &str,
    role: &str,
    password: Option<String>,
) -> Result<AdminUserId, AdminError> {
    let role = parse_role(role)?;

    dotenvy::dotenv().ok();
    let password = password
        .or_else(|| std::env::var(PASSWORD_VAR).ok())
        .filter(|p| !p.is_empty())
        .ok_or(AdminError::MissingPassword)?;

    let pool = connect().await?;

    tracing::info!("Creating admin user: {} ({})", email, role);
    let admin = AdminAuthService::new(&pool)
        .create_admin(email, name, role, &password)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        admin.id,
        admin.email,
        admin.role
    );
    Ok(admin.id)
}

fn parse_role(role: &str) -> Result<AdminRole, AdminError> {
    role.parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert!(matches!(parse_role("super_admin"), Ok(AdminRole::SuperAdmin)));
        assert!(matches!(parse_role("viewer"), Ok(AdminRole::Viewer)));
        assert!(matches!(parse_role("owner"), Err(AdminError::InvalidRole(r)) if r == "owner"));
    }
}
