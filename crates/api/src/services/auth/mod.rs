//! Authentication service.
//!
//! Provides password registration and login, token issuance, and account
//! lookup and deletion.

mod error;
pub mod tokens;

pub use error::AuthError;
pub use tokens::{AccessToken, Claims, TokenService};

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use abacus_core::{Email, UserId};

use crate::db::{RepositoryError, UserStore};
use crate::models::user::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Hash verified when no account matches, so a miss costs a full Argon2 run.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("abacus-login-miss").ok());

/// Authentication service.
///
/// Handles user registration, login, and account management.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn UserStore, tokens: &'a TokenService) -> Self {
        Self { users, tokens }
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(&email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password, returning a fresh access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<AccessToken, AuthError> {
        // Malformed emails get the same answer as unknown ones
        let Ok(email) = Email::parse(email) else {
            return Err(reject_unknown(password));
        };

        let Some(credentials) = self.users.find_credentials_by_email(&email).await? else {
            return Err(reject_unknown(password));
        };

        verify_password(password, &credentials.password_hash)?;

        let token = self.tokens.issue(credentials.user.id)?;
        tracing::info!(user_id = %credentials.user.id, "User logged in");
        Ok(token)
    }

    /// Look up the account behind an authenticated identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    pub async fn current_user(&self, identity: UserId) -> Result<User, AuthError> {
        self.users
            .find_by_id(identity)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Delete an account and all of its calculations.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    pub async fn delete_account(&self, identity: UserId) -> Result<(), AuthError> {
        let removed = self
            .users
            .delete(identity)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        tracing::info!(user_id = %identity, calculations = removed, "User deleted");
        Ok(())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Spend the same verification work as a real login, then reject.
fn reject_unknown(password: &str) -> AuthError {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    AuthError::InvalidCredentials
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;
    use secrecy::SecretString;

    use super::*;
    use crate::config::JwtConfig;
    use crate::db::MemoryStore;

    fn tokens() -> TokenService {
        TokenService::new(&JwtConfig {
            secret: SecretString::from("k7#Qp2!vZ9@mX4$wL8^rT1&yB6*nC3%d"),
            issuer: "abacus-test".to_string(),
            token_ttl: TimeDelta::minutes(30),
        })
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password(&"p".repeat(128)).is_ok());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_unknown_accounts_still_verify() {
        let hash = DUMMY_HASH.as_deref().unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(matches!(
            verify_password("analytical", hash),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            reject_unknown("analytical"),
            AuthError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_register_login_and_lookup() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        let user = auth.register("Ada@Example.com", "analytical").await.unwrap();
        assert_eq!(user.email.as_str(), "ada@example.com");

        let token = auth.login("ada@example.com", "analytical").await.unwrap();
        let identity = tokens.resolve_identity(&token.access_token).unwrap();
        assert_eq!(identity, user.id);
        assert_eq!(auth.current_user(identity).await.unwrap(), user);
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        auth.register("ada@example.com", "analytical").await.unwrap();
        assert!(matches!(
            auth.register(" ADA@example.com", "different1").await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        auth.register("ada@example.com", "analytical").await.unwrap();

        for (email, password) in [
            ("ada@example.com", "wrong-password"),
            ("nobody@example.com", "analytical"),
            ("not-an-email", "analytical"),
        ] {
            assert!(matches!(
                auth.login(email, password).await,
                Err(AuthError::InvalidCredentials)
            ));
        }
    }

    #[tokio::test]
    async fn test_delete_account() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        let user = auth.register("ada@example.com", "analytical").await.unwrap();

        auth.delete_account(user.id).await.unwrap();
        assert!(matches!(
            auth.current_user(user.id).await,
            Err(AuthError::UserNotFound)
        ));
        assert!(matches!(
            auth.delete_account(user.id).await,
            Err(AuthError::UserNotFound)
        ));
    }
}
