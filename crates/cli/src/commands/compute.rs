//! Offline calculation command.
//!
//! Runs the same reducers the API uses, without touching the database.
//!
//! ```bash
//! abacus compute division 100 5 2
//! # 10
//! ```

use abacus_core::{CalculationError, compute};

/// Compute `operation` over `inputs` and format the result for printing.
///
/// # Errors
///
/// Returns the calculation error for unknown operations or invalid inputs.
pub fn run(operation: &str, inputs: &[f64]) -> Result<String, CalculationError> {
    compute(operation, inputs).map(|result| result.to_string())
}
