//! `PostgreSQL` calculation store.
//!
//! The stored `result` column is informational. Rows are rebuilt with
//! [`Calculation::restore`], which recomputes the result from the stored
//! operation and inputs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use abacus_core::{Calculation, CalculationId, CalculationParts, Operation, UserId};

use super::{CalculationStore, RepositoryError, map_unique_violation};

#[derive(sqlx::FromRow)]
struct CalculationRow {
    id: CalculationId,
    owner_id: UserId,
    operation: String,
    inputs: Vec<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CalculationRow> for Calculation {
    type Error = RepositoryError;

    fn try_from(row: CalculationRow) -> Result<Self, Self::Error> {
        let operation = row.operation.parse::<Operation>().map_err(|e| {
            RepositoryError::DataCorruption(format!("calculation {}: {e}", row.id))
        })?;

        Self::restore(CalculationParts {
            id: row.id,
            owner_id: row.owner_id,
            operation,
            inputs: row.inputs,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .map_err(|e| RepositoryError::DataCorruption(format!("calculation {}: {e}", row.id)))
    }
}

/// Calculation store backed by `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgCalculationStore {
    pool: PgPool,
}

impl PgCalculationStore {
    /// Create a new calculation store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CalculationStore for PgCalculationStore {
    async fn insert(&self, calculation: &Calculation) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO calculations
                (id, owner_id, operation, inputs, result, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(calculation.id())
        .bind(calculation.owner_id())
        .bind(calculation.operation().name())
        .bind(calculation.inputs().to_vec())
        .bind(calculation.result())
        .bind(calculation.created_at())
        .bind(calculation.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::MissingOwner;
            }
            map_unique_violation(e, "calculation")
        })?;

        Ok(())
    }

    async fn find_by_id(
        &self,
        id: CalculationId,
    ) -> Result<Option<Calculation>, RepositoryError> {
        let row = sqlx::query_as::<_, CalculationRow>(
            r"
            SELECT id, owner_id, operation, inputs, created_at, updated_at
            FROM calculations
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Calculation::try_from).transpose()
    }

    async fn find_all_by_owner(&self, owner: UserId) -> Result<Vec<Calculation>, RepositoryError> {
        let rows = sqlx::query_as::<_, CalculationRow>(
            r"
            SELECT id, owner_id, operation, inputs, created_at, updated_at
            FROM calculations
            WHERE owner_id = $1
            ORDER BY created_at, id
            ",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Calculation::try_from).collect()
    }

    async fn replace(&self, calculation: &Calculation) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE calculations
            SET inputs = $2, result = $3, updated_at = $4
            WHERE id = $1
            ",
        )
        .bind(calculation.id())
        .bind(calculation.inputs().to_vec())
        .bind(calculation.result())
        .bind(calculation.updated_at())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, id: CalculationId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM calculations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
