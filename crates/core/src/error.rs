//! Calculation error types.

use thiserror::Error;

use crate::operation::Operation;

/// Errors raised while computing or recomputing a calculation.
///
/// Every variant is a caller error: the input can be corrected and the
/// request retried. None of them indicate a fault in the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculationError {
    /// The operation name is not one of the supported operations.
    #[error("unknown operation '{0}' (expected addition, subtraction, multiplication or division)")]
    UnknownOperation(String),

    /// Too few inputs for the chosen operation.
    #[error("{operation} requires at least {required} input(s), got {actual}")]
    InvalidInputCount {
        /// Operation being computed.
        operation: Operation,
        /// Minimum number of inputs.
        required: usize,
        /// Number of inputs supplied.
        actual: usize,
    },

    /// More inputs than a single record may hold.
    #[error("{operation} accepts at most {max} inputs, got {actual}")]
    TooManyInputs {
        /// Operation being computed.
        operation: Operation,
        /// Maximum number of inputs.
        max: usize,
        /// Number of inputs supplied.
        actual: usize,
    },

    /// A divisor (any input after the first) is zero.
    #[error("division by zero: input at index {index} is zero")]
    DivisionByZero {
        /// Zero-based position of the offending input.
        index: usize,
    },

    /// An input is NaN or infinite.
    #[error("input at index {index} is not a finite number")]
    NonFiniteInput {
        /// Zero-based position of the offending input.
        index: usize,
    },

    /// The reduction overflowed to a non-finite value.
    #[error("{operation} result is not a finite number")]
    NonFiniteResult {
        /// Operation being computed.
        operation: Operation,
    },
}
