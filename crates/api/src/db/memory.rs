//! In-memory store for tests.
//!
//! Implements both [`UserStore`] and [`CalculationStore`] over one lock so
//! that account deletion cascades and inserts check the owner, matching the
//! `PostgreSQL` schema's foreign key.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use tokio::sync::RwLock;

use abacus_core::{Calculation, CalculationId, Email, UserId};

use super::{CalculationStore, RepositoryError, UserStore};
use crate::models::user::{StoredCredentials, User};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, StoredCredentials>,
    calculations: HashMap<CalculationId, Calculation>,
}

/// Users and calculations held in process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calculations currently stored, across all owners.
    pub async fn calculation_count(&self) -> usize {
        self.tables.read().await.calculations.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, email: &Email, password_hash: &str) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|c| &c.user.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let now = Utc::now().trunc_subsecs(6);
        let user = User {
            id: UserId::generate(),
            email: email.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(
            user.id,
            StoredCredentials {
                user: user.clone(),
                password_hash: password_hash.to_owned(),
            },
        );

        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(|c| c.user.clone()))
    }

    async fn find_credentials_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|c| &c.user.email == email)
            .cloned())
    }

    async fn delete(&self, id: UserId) -> Result<Option<u64>, RepositoryError> {
        let mut tables = self.tables.write().await;

        if tables.users.remove(&id).is_none() {
            return Ok(None);
        }

        let before = tables.calculations.len();
        tables.calculations.retain(|_, c| !c.is_owned_by(id));
        let removed = before - tables.calculations.len();

        Ok(Some(removed as u64))
    }
}

#[async_trait]
impl CalculationStore for MemoryStore {
    async fn insert(&self, calculation: &Calculation) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&calculation.owner_id()) {
            return Err(RepositoryError::MissingOwner);
        }
        if tables.calculations.contains_key(&calculation.id()) {
            return Err(RepositoryError::Conflict(
                "calculation already exists".to_owned(),
            ));
        }

        tables
            .calculations
            .insert(calculation.id(), calculation.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: CalculationId,
    ) -> Result<Option<Calculation>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.calculations.get(&id).cloned())
    }

    async fn find_all_by_owner(&self, owner: UserId) -> Result<Vec<Calculation>, RepositoryError> {
        let tables = self.tables.read().await;

        let mut owned: Vec<Calculation> = tables
            .calculations
            .values()
            .filter(|c| c.is_owned_by(owner))
            .cloned()
            .collect();
        owned.sort_by_key(|c| (c.created_at(), c.id()));

        Ok(owned)
    }

    async fn replace(&self, calculation: &Calculation) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;

        let slot = tables
            .calculations
            .get_mut(&calculation.id())
            .ok_or(RepositoryError::NotFound)?;
        *slot = calculation.clone();

        Ok(())
    }

    async fn delete(&self, id: CalculationId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.calculations.remove(&id).is_some())
    }
}
