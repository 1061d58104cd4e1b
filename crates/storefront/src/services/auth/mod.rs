//! Authentication service.
//!
//! Customer accounts use email and password; hashes are Argon2id in PHC
//! string format.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use solera_core::Email;
use solera_core::checkout::{ContactDetails, normalize_phone};
use solera_db::RepositoryError;
use solera_db::UserRepository;
use solera_db::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length; Argon2 input beyond this only costs CPU.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Registration form input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub password: String,
    pub password_confirm: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::InvalidProfile` if the name or phone is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[tracing::instrument(skip_all)]
    pub async fn register(&self, form: &Registration) -> Result<User, AuthError> {
        let email = Email::parse(form.email.trim())?;

        let full_name = form.full_name.trim();
        if full_name.is_empty() {
            return Err(AuthError::InvalidProfile("name is required".to_string()));
        }
        if full_name.chars().count() > ContactDetails::MAX_NAME_LENGTH {
            return Err(AuthError::InvalidProfile(format!(
                "name must be at most {} characters",
                ContactDetails::MAX_NAME_LENGTH
            )));
        }

        let phone = match form.phone.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(normalize_phone(raw).ok_or_else(|| {
                AuthError::InvalidProfile("phone number must have 10 to 15 digits".to_string())
            })?),
        };

        if form.password != form.password_confirm {
            return Err(AuthError::WeakPassword("passwords do not match".to_string()));
        }
        validate_password(&form.password)?;

        let password_hash = hash_password(&form.password)?;

        let user = self
            .users
            .create_with_password(&email, full_name, phone.as_deref(), &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "customer registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AuthError::AccountDisabled` if an admin deactivated the account.
    #[tracing::instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email.trim())?;

        let credentials = self
            .users
            .get_credentials_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &credentials.password_hash)?;

        if !credentials.user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        Ok(credentials.user)
    }
}

/// Check a password against the length policy.
fn validate_password(password: &str) -> Result<(), AuthError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    if !password.chars().any(char::is_alphabetic) || !password.chars().any(|c| c.is_ascii_digit())
    {
        return Err(AuthError::WeakPassword(
            "password must contain at least one letter and one digit".to_string(),
        ));
    }
    Ok(())
}

/// Hash a password with Argon2id and a random salt.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored PHC hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_policy() {
        assert!(matches!(
            validate_password("kisa1"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_password("onlyletters"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_password(&"a1".repeat(65)),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("sandalet2026").is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("sandalet2026").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("sandalet2026", &hash).is_ok());
        assert!(matches!(
            verify_password("yanlis2026", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("sandalet2026").unwrap();
        let b = hash_password("sandalet2026").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("sandalet2026", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
