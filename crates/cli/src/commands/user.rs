//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Delete an account and every calculation it owns
//! abacus user delete -e ada@example.com
//! ```

use abacus_api::db::{PgUserStore, RepositoryError, UserStore};
use abacus_core::{Email, EmailError};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;

use super::{CommandError, database_url};

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum UserCommandError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("No account with email: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Delete the account registered under `email`, cascading to its calculations.
///
/// Returns the number of calculations removed.
///
/// # Errors
///
/// Returns an error if the email is invalid, no such account exists, or the
/// database is unreachable.
pub async fn delete(email: &str) -> Result<u64, UserCommandError> {
    let email = Email::parse(email)?;
    let database_url = database_url()?;
    let pool = PgPool::connect(database_url.expose_secret()).await?;
    let users = PgUserStore::new(pool);

    let credentials = users
        .find_credentials_by_email(&email)
        .await?
        .ok_or_else(|| UserCommandError::NotFound(email.to_string()))?;

    let removed = users
        .delete(credentials.user.id)
        .await?
        .ok_or_else(|| UserCommandError::NotFound(email.to_string()))?;

    tracing::info!(user_id = %credentials.user.id, removed, "Account deleted");
    Ok(removed)
}
