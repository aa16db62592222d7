//! Calculation records.
//!
//! A [`Calculation`] can only be obtained through the operation registry, so
//! its `result` always matches its `(operation, inputs)` pair. There is no
//! setter for `result`; changing inputs produces a new value via
//! [`Calculation::with_inputs`] and leaves the original untouched.

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use serde::Serialize;

use crate::error::CalculationError;
use crate::operation::Operation;
use crate::types::{CalculationId, UserId};

/// A calculation owned by a user.
///
/// Serializes as
/// `{id, operation, inputs, result, ownerId, createdAt, updatedAt}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    id: CalculationId,
    operation: Operation,
    inputs: Vec<f64>,
    result: f64,
    owner_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Stored fields of a calculation, without the derived result.
///
/// Used by storage adapters to rebuild a [`Calculation`] from a row.
#[derive(Debug, Clone)]
pub struct CalculationParts {
    /// Record ID.
    pub id: CalculationId,
    /// Owning user.
    pub owner_id: UserId,
    /// Operation applied to the inputs.
    pub operation: Operation,
    /// Ordered inputs.
    pub inputs: Vec<f64>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Calculation {
    /// Compute a new calculation owned by `owner_id`.
    ///
    /// A fresh ID is assigned and both timestamps are set to now.
    ///
    /// # Errors
    ///
    /// Returns any [`CalculationError`] from [`Operation::compute`]; no
    /// calculation exists in that case.
    pub fn create(
        operation: Operation,
        owner_id: UserId,
        inputs: Vec<f64>,
    ) -> Result<Self, CalculationError> {
        let result = operation.compute(&inputs)?;
        let now = now();

        Ok(Self {
            id: CalculationId::generate(),
            operation,
            inputs,
            result,
            owner_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuild a calculation from storage, recomputing its result.
    ///
    /// # Errors
    ///
    /// Returns a [`CalculationError`] if the stored inputs no longer compute.
    pub fn restore(parts: CalculationParts) -> Result<Self, CalculationError> {
        let result = parts.operation.compute(&parts.inputs)?;

        Ok(Self {
            id: parts.id,
            operation: parts.operation,
            inputs: parts.inputs,
            result,
            owner_id: parts.owner_id,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
        })
    }

    /// Return a copy with new inputs and a recomputed result.
    ///
    /// The operation, ID, owner and creation time are kept; `updated_at`
    /// strictly advances.
    ///
    /// # Errors
    ///
    /// Returns any [`CalculationError`] from [`Operation::compute`]; `self`
    /// is not modified.
    pub fn with_inputs(&self, inputs: Vec<f64>) -> Result<Self, CalculationError> {
        let result = self.operation.compute(&inputs)?;

        // Storage keeps microseconds, so advance by at least one.
        let now = now();
        let updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + TimeDelta::microseconds(1)
        };

        Ok(Self {
            inputs,
            result,
            updated_at,
            ..self.clone()
        })
    }

    /// Record ID.
    #[must_use]
    pub const fn id(&self) -> CalculationId {
        self.id
    }

    /// Operation applied to the inputs.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    /// Ordered inputs.
    #[must_use]
    pub fn inputs(&self) -> &[f64] {
        &self.inputs
    }

    /// Result of applying the operation to the inputs.
    #[must_use]
    pub const fn result(&self) -> f64 {
        self.result
    }

    /// Owning user.
    #[must_use]
    pub const fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Whether `user` owns this calculation.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }

    /// When the record was created.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the record was last updated.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
