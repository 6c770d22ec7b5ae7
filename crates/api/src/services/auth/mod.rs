//! Authentication service.
//!
//! Password registration and login. Login hands back a signed token that
//! the auth gate in [`crate::middleware::auth`] verifies on later requests.

mod error;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use password::{hash_password, verify_password};
pub use token::{Claims, IssuedToken, TokenError, TokenKeys};

use sqlx::SqlitePool;

use goshop_core::{Email, Role};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: IssuedToken,
}

/// Authentication service.
///
/// Handles user registration and password login.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    keys: &'a TokenKeys,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, keys: &'a TokenKeys) -> Self {
        Self {
            users: UserRepository::new(pool),
            keys,
        }
    }

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidInput` if a field is missing or blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let name = required("name", name)?;
        let email = Email::parse(required("email", email)?)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(name, &email, &password_hash, Role::Customer)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown or
    /// malformed, or the password is wrong. The three cases are
    /// indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&password_hash, password) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.keys.issue(user.id, user.role)?;
        Ok(Session { user, token })
    }
}

/// Trimmed value of a required field.
fn required<'s>(field: &str, value: &'s str) -> Result<&'s str, AuthError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthError::InvalidInput(format!("{field} is required")));
    }
    Ok(trimmed)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::InvalidInput("password is required".to_string()));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::db::tests::test_pool;

    fn keys() -> TokenKeys {
        TokenKeys::new(&SecretString::from("kR8#vQ2!mZ5@xL9$wT4^pN7&cB1*hJ6%"))
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let pool = test_pool().await;
        let keys = keys();
        let auth = AuthService::new(&pool, &keys);

        let user = auth.register("Ann", "Ann@X.com", "secret1").await.unwrap();
        assert_eq!(user.role, Role::Customer);
        assert_eq!(user.email.as_str(), "ann@x.com");

        let session = auth.login("ann@x.com", "secret1").await.unwrap();
        assert_eq!(session.user.id, user.id);

        let claims = keys.verify(&session.token.token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Customer);
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let pool = test_pool().await;
        let keys = keys();
        let auth = AuthService::new(&pool, &keys);

        auth.register("Ann", "ann@x.com", "secret1").await.unwrap();
        let err = auth
            .register("Ann Again", "ANN@x.com", "secret2")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let pool = test_pool().await;
        let keys = keys();
        let auth = AuthService::new(&pool, &keys);
        auth.register("Ann", "ann@x.com", "secret1").await.unwrap();

        let wrong_password = auth.login("ann@x.com", "secret2").await.unwrap_err();
        let unknown_email = auth.login("bob@x.com", "secret1").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_register_validation() {
        let pool = test_pool().await;
        let keys = keys();
        let auth = AuthService::new(&pool, &keys);

        assert!(matches!(
            auth.register("  ", "ann@x.com", "secret1").await,
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            auth.register("Ann", "", "secret1").await,
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            auth.register("Ann", "not-an-email", "secret1").await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            auth.register("Ann", "ann@x.com", "").await,
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            auth.register("Ann", "ann@x.com", "12345").await,
            Err(AuthError::WeakPassword(_))
        ));
    }
}
