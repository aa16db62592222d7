//! Calculation service.
//!
//! Create, read, update, delete and list calculation records on behalf of an
//! authenticated user. Every operation on an existing record resolves it first
//! and compares its owner with the caller; a record owned by someone else is
//! reported as [`CalculationServiceError::Forbidden`], which the HTTP layer
//! renders exactly like a missing record.

use thiserror::Error;

use abacus_core::{Calculation, CalculationError, CalculationId, Operation, UserId};

use crate::db::{CalculationStore, RepositoryError};

/// Errors returned by [`CalculationService`].
#[derive(Debug, Error)]
pub enum CalculationServiceError {
    /// The operation or inputs were rejected by the registry.
    #[error(transparent)]
    Calculation(#[from] CalculationError),

    /// No calculation with this ID exists.
    #[error("calculation {0} not found")]
    NotFound(CalculationId),

    /// The calculation exists but belongs to another user.
    #[error("calculation {0} belongs to another user")]
    Forbidden(CalculationId),

    /// The caller's account no longer exists.
    #[error("owner {0} does not exist")]
    UnknownOwner(UserId),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Calculation service bound to a store for the duration of a request.
pub struct CalculationService<'a> {
    store: &'a dyn CalculationStore,
}

impl<'a> CalculationService<'a> {
    /// Create a new calculation service.
    #[must_use]
    pub const fn new(store: &'a dyn CalculationStore) -> Self {
        Self { store }
    }

    /// Compute and store a new calculation owned by `identity`.
    ///
    /// # Errors
    ///
    /// Returns `CalculationServiceError::Calculation` for an unknown operation
    /// or invalid inputs; nothing is stored in that case.
    pub async fn create_calculation(
        &self,
        identity: UserId,
        operation: &str,
        inputs: Vec<f64>,
    ) -> Result<Calculation, CalculationServiceError> {
        let operation = operation.parse::<Operation>()?;
        let calculation = Calculation::create(operation, identity, inputs)?;

        self.store.insert(&calculation).await.map_err(|e| match e {
            RepositoryError::MissingOwner => CalculationServiceError::UnknownOwner(identity),
            other => CalculationServiceError::Repository(other),
        })?;

        tracing::info!(
            calculation_id = %calculation.id(),
            owner_id = %identity,
            operation = %operation,
            "Calculation created"
        );
        Ok(calculation)
    }

    /// Fetch one of the caller's calculations.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the ID does not exist and `Forbidden` if it
    /// belongs to another user.
    pub async fn get_calculation(
        &self,
        identity: UserId,
        id: CalculationId,
    ) -> Result<Calculation, CalculationServiceError> {
        let calculation = self.owned(identity, id).await?;
        tracing::debug!(calculation_id = %id, "Calculation fetched");
        Ok(calculation)
    }

    /// All of the caller's calculations, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the store fails.
    pub async fn list_calculations(
        &self,
        identity: UserId,
    ) -> Result<Vec<Calculation>, CalculationServiceError> {
        let calculations = self.store.find_all_by_owner(identity).await?;
        tracing::debug!(owner_id = %identity, count = calculations.len(), "Calculations listed");
        Ok(calculations)
    }

    /// Replace the inputs of one of the caller's calculations.
    ///
    /// Ownership is checked before recomputation. If recomputation fails the
    /// stored record is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Forbidden`, or `Calculation` for invalid inputs.
    pub async fn update_calculation(
        &self,
        identity: UserId,
        id: CalculationId,
        inputs: Vec<f64>,
    ) -> Result<Calculation, CalculationServiceError> {
        let existing = self.owned(identity, id).await?;
        let updated = existing.with_inputs(inputs)?;

        self.store.replace(&updated).await.map_err(|e| match e {
            RepositoryError::NotFound => CalculationServiceError::NotFound(id),
            other => CalculationServiceError::Repository(other),
        })?;

        tracing::info!(calculation_id = %id, owner_id = %identity, "Calculation updated");
        Ok(updated)
    }

    /// Permanently delete one of the caller's calculations.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `Forbidden`.
    pub async fn delete_calculation(
        &self,
        identity: UserId,
        id: CalculationId,
    ) -> Result<(), CalculationServiceError> {
        self.owned(identity, id).await?;

        if !self.store.delete(id).await? {
            return Err(CalculationServiceError::NotFound(id));
        }

        tracing::info!(calculation_id = %id, owner_id = %identity, "Calculation deleted");
        Ok(())
    }

    /// Resolve a calculation and check that `identity` owns it.
    async fn owned(
        &self,
        identity: UserId,
        id: CalculationId,
    ) -> Result<Calculation, CalculationServiceError> {
        let calculation = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(CalculationServiceError::NotFound(id))?;

        if !calculation.is_owned_by(identity) {
            tracing::warn!(
                calculation_id = %id,
                caller_id = %identity,
                owner_id = %calculation.owner_id(),
                "Cross-owner calculation access denied"
            );
            return Err(CalculationServiceError::Forbidden(id));
        }

        Ok(calculation)
    }
}
