//! Persistence for users and calculation records.
//!
//! Services depend on the [`UserStore`] and [`CalculationStore`] traits, never
//! on a concrete backend. Two implementations exist:
//!
//! - [`users::PgUserStore`] and [`calculations::PgCalculationStore`] - `PostgreSQL` via sqlx
//! - `memory::MemoryStore` - in-process store for tests (`test-support` feature)
//!
//! # Tables
//!
//! - `users` - Accounts and Argon2id password hashes
//! - `calculations` - Calculation records, `owner_id REFERENCES users(id) ON DELETE CASCADE`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p abacus-cli -- migrate
//! ```

pub mod calculations;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use abacus_core::{Calculation, CalculationId, Email, UserId};

use crate::models::user::{StoredCredentials, User};

pub use calculations::PgCalculationStore;
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryStore;
pub use users::PgUserStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation (e.g., email taken, duplicate id).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The referenced owner does not exist.
    #[error("owner does not exist")]
    MissingOwner,
}

/// Storage for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user with an already-hashed password.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn create(&self, email: &Email, password_hash: &str) -> Result<User, RepositoryError>;

    /// Find a user by ID.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Find a user and their password hash by email.
    async fn find_credentials_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, RepositoryError>;

    /// Delete a user and every calculation they own.
    ///
    /// Returns the number of calculations removed, or `None` if no such user
    /// exists.
    async fn delete(&self, id: UserId) -> Result<Option<u64>, RepositoryError>;
}

/// Storage for calculation records.
#[async_trait]
pub trait CalculationStore: Send + Sync {
    /// Persist a new calculation.
    ///
    /// Returns `RepositoryError::MissingOwner` if the owner does not exist and
    /// `RepositoryError::Conflict` if the id is already taken.
    async fn insert(&self, calculation: &Calculation) -> Result<(), RepositoryError>;

    /// Find a calculation by ID, regardless of owner.
    async fn find_by_id(&self, id: CalculationId)
    -> Result<Option<Calculation>, RepositoryError>;

    /// All calculations owned by `owner`, oldest first (ties broken by ID).
    async fn find_all_by_owner(&self, owner: UserId) -> Result<Vec<Calculation>, RepositoryError>;

    /// Overwrite the inputs, result and `updated_at` of a stored calculation.
    ///
    /// Returns `RepositoryError::NotFound` if the record no longer exists.
    async fn replace(&self, calculation: &Calculation) -> Result<(), RepositoryError>;

    /// Delete a calculation. Returns `false` if it did not exist.
    async fn delete(&self, id: CalculationId) -> Result<bool, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a sqlx error, turning unique violations into `Conflict`.
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}
