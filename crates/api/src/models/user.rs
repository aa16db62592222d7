//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use abacus_core::{Email, UserId};

/// A registered account.
///
/// Serializes as `{id, email, createdAt}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Normalized email address, unique across accounts.
    pub email: Email,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

/// A user together with their Argon2id password hash.
///
/// Only produced for login. `Debug` redacts the hash and the type is never
/// serialized.
#[derive(Clone)]
pub struct StoredCredentials {
    /// The account.
    pub user: User,
    /// PHC-format password hash.
    pub password_hash: String,
}

impl std::fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("user", &self.user)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: UserId::generate(),
            email: Email::parse("ada@example.com").unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_user_serialized_shape() {
        let user = user();
        let json = serde_json::to_value(&user).unwrap();

        assert_eq!(json["id"], user.id.to_string());
        assert_eq!(json["email"], "ada@example.com");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_none());
        assert_eq!(json.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_credentials_debug_redacts_hash() {
        let creds = StoredCredentials {
            user: user(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("argon2id"));
    }
}
