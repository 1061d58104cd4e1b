//! Admin authentication service.
//!
//! Admins sign in with email and password. Hashes are Argon2id in PHC
//! string format, the same encoding the storefront uses for customers.

mod error;

pub use error::AdminAuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use solera_core::{AdminRole, Email};
use solera_db::models::AdminUser;
use solera_db::{AdminUserRepository, RepositoryError};

/// Minimum admin password length.
const MIN_PASSWORD_LENGTH: usize = 12;

/// Maximum password length.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum display name length.
const MAX_NAME_LENGTH: usize = 100;

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    admins: AdminUserRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            admins: AdminUserRepository::new(pool),
        }
    }

    /// Login with email and password.
    ///
    /// Unknown emails and wrong passwords fail the same way.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AdminAuthError::InvalidCredentials` if the email/password is wrong.
    #[tracing::instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<AdminUser, AdminAuthError> {
        let email = Email::parse(email.trim())?;

        let credentials = self
            .admins
            .get_credentials_by_email(&email)
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;

        verify_password(password, &credentials.password_hash)?;

        tracing::info!(admin_id = %credentials.admin.id, "admin logged in");
        Ok(credentials.admin)
    }

    /// Create a new admin account.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AdminAuthError::InvalidName` if the name is empty or too long.
    /// Returns `AdminAuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AdminAuthError::UserAlreadyExists` if the email is taken.
    #[tracing::instrument(skip(self, password))]
    pub async fn create_admin(
        &self,
        email: &str,
        name: &str,
        role: AdminRole,
        password: &str,
    ) -> Result<AdminUser, AdminAuthError> {
        let email = Email::parse(email.trim())?;

        let name = name.trim();
        if name.is_empty() {
            return Err(AdminAuthError::InvalidName("name is required".to_string()));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(AdminAuthError::InvalidName(format!(
                "name must be at most {MAX_NAME_LENGTH} characters"
            )));
        }

        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let admin = self
            .admins
            .create(&email, name, role, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AdminAuthError::UserAlreadyExists,
                other => AdminAuthError::Repository(other),
            })?;

        tracing::info!(admin_id = %admin.id, role = %admin.role, "admin user created");
        Ok(admin)
    }
}

/// Check a password against the admin password policy.
///
/// # Errors
///
/// Returns `AdminAuthError::WeakPassword` describing the first rule broken.
pub fn validate_password(password: &str) -> Result<(), AdminAuthError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(AdminAuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(AdminAuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    if !password.chars().any(char::is_alphabetic) || !password.chars().any(|c| c.is_ascii_digit())
    {
        return Err(AdminAuthError::WeakPassword(
            "password must contain at least one letter and one digit".to_string(),
        ));
    }
    Ok(())
}

/// Hash a password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns `AdminAuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AdminAuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AdminAuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AdminAuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_password_policy_is_stricter() {
        assert!(matches!(
            validate_password("sandalet2026"),
            Err(AdminAuthError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_password("yalnizcaharfler"),
            Err(AdminAuthError::WeakPassword(_))
        ));
        assert!(validate_password("depo-sorumlusu-7").is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("depo-sorumlusu-7").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("depo-sorumlusu-7", &hash).is_ok());
        assert!(matches!(
            verify_password("depo-sorumlusu-8", &hash),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_malformed_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }
}
