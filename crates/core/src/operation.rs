//! The operation registry.
//!
//! A closed set of arithmetic operations, each mapped to a pure reducer over
//! an ordered sequence of `f64` inputs. Subtraction and division reduce
//! left to right: `[a, b, c]` computes `(a - b) - c` and `(a / b) / c`.
//!
//! | operation      | inputs | reduction                         |
//! |----------------|--------|-----------------------------------|
//! | addition       | >= 1   | sum                               |
//! | subtraction    | >= 1   | first minus each subsequent       |
//! | multiplication | >= 1   | product                           |
//! | division       | >= 2   | first divided by each subsequent  |

use core::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CalculationError;

/// Maximum number of inputs a single calculation may hold.
pub const MAX_INPUTS: usize = 1000;

/// A supported arithmetic operation.
///
/// Serializes as its canonical lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Sum of all inputs.
    Addition,
    /// First input minus each subsequent input.
    Subtraction,
    /// Product of all inputs.
    Multiplication,
    /// First input divided by each subsequent input.
    Division,
}

impl Operation {
    /// Every supported operation, in display order.
    pub const ALL: [Self; 4] = [
        Self::Addition,
        Self::Subtraction,
        Self::Multiplication,
        Self::Division,
    ];

    /// Canonical name, as stored and serialized.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Addition => "addition",
            Self::Subtraction => "subtraction",
            Self::Multiplication => "multiplication",
            Self::Division => "division",
        }
    }

    /// Minimum number of inputs the operation accepts.
    #[must_use]
    pub const fn min_inputs(self) -> usize {
        match self {
            Self::Division => 2,
            Self::Addition | Self::Subtraction | Self::Multiplication => 1,
        }
    }

    /// Reduce `inputs` with this operation.
    ///
    /// # Errors
    ///
    /// - [`CalculationError::InvalidInputCount`] below [`Self::min_inputs`]
    /// - [`CalculationError::TooManyInputs`] above [`MAX_INPUTS`]
    /// - [`CalculationError::NonFiniteInput`] for NaN or infinite inputs
    /// - [`CalculationError::DivisionByZero`] for a zero divisor
    /// - [`CalculationError::NonFiniteResult`] if the reduction overflows
    pub fn compute(self, inputs: &[f64]) -> Result<f64, CalculationError> {
        self.validate(inputs)?;

        let Some((&first, rest)) = inputs.split_first() else {
            return Err(self.too_few(inputs.len()));
        };

        let result: f64 = match self {
            Self::Addition => inputs.iter().sum(),
            Self::Subtraction => rest.iter().fold(first, |acc, x| acc - x),
            Self::Multiplication => inputs.iter().product(),
            Self::Division => divide(first, rest)?,
        };

        if !result.is_finite() {
            return Err(CalculationError::NonFiniteResult { operation: self });
        }

        Ok(result)
    }

    fn validate(self, inputs: &[f64]) -> Result<(), CalculationError> {
        if inputs.len() < self.min_inputs() {
            return Err(self.too_few(inputs.len()));
        }

        if inputs.len() > MAX_INPUTS {
            return Err(CalculationError::TooManyInputs {
                operation: self,
                max: MAX_INPUTS,
                actual: inputs.len(),
            });
        }

        if let Some(index) = inputs.iter().position(|x| !x.is_finite()) {
            return Err(CalculationError::NonFiniteInput { index });
        }

        Ok(())
    }

    const fn too_few(self, actual: usize) -> CalculationError {
        CalculationError::InvalidInputCount {
            operation: self,
            required: self.min_inputs(),
            actual,
        }
    }
}

/// Divide `first` by each divisor in order, rejecting any zero divisor
/// (including `-0.0`) before it is applied.
fn divide(first: f64, divisors: &[f64]) -> Result<f64, CalculationError> {
    divisors
        .iter()
        .enumerate()
        .try_fold(first, |acc, (offset, &divisor)| {
            if divisor == 0.0 {
                Err(CalculationError::DivisionByZero { index: offset + 1 })
            } else {
                Ok(acc / divisor)
            }
        })
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = CalculationError;

    /// Parse an operation name, case-insensitively.
    ///
    /// Besides the canonical names, the short forms used by calculator
    /// front-ends are accepted (`add`, `sub`, `subtract`, `mul`,
    /// `multiply`, `div`, `divide`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "addition" | "add" => Ok(Self::Addition),
            "subtraction" | "subtract" | "sub" => Ok(Self::Subtraction),
            "multiplication" | "multiply" | "mul" => Ok(Self::Multiplication),
            "division" | "divide" | "div" => Ok(Self::Division),
            _ => Err(CalculationError::UnknownOperation(s.to_owned())),
        }
    }
}

/// Look up `operation` by name and reduce `inputs` with it.
///
/// # Errors
///
/// Returns [`CalculationError::UnknownOperation`] for an unrecognised name,
/// otherwise any error from [`Operation::compute`].
///
/// # Examples
///
/// ```
/// use abacus_core::compute;
///
/// assert_eq!(compute("addition", &[2.0, 3.0, 5.0]).unwrap(), 10.0);
/// assert_eq!(compute("division", &[100.0, 5.0, 2.0]).unwrap(), 10.0);
/// assert!(compute("division", &[10.0, 0.0]).is_err());
/// assert!(compute("modulo", &[10.0, 3.0]).is_err());
/// ```
pub fn compute(operation: &str, inputs: &[f64]) -> Result<f64, CalculationError> {
    operation.parse::<Operation>()?.compute(inputs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_results() {
        assert_eq!(compute("addition", &[2.0, 3.0, 5.0]).unwrap(), 10.0);
        assert_eq!(compute("multiplication", &[2.0, 3.0, 5.0]).unwrap(), 30.0);
        assert_eq!(compute("subtraction", &[10.0, 3.0, 2.0]).unwrap(), 5.0);
        assert_eq!(compute("division", &[100.0, 5.0, 2.0]).unwrap(), 10.0);
    }

    #[test]
    fn test_single_input() {
        assert_eq!(Operation::Addition.compute(&[4.5]).unwrap(), 4.5);
        assert_eq!(Operation::Subtraction.compute(&[4.5]).unwrap(), 4.5);
        assert_eq!(Operation::Multiplication.compute(&[4.5]).unwrap(), 4.5);
    }

    #[test]
    fn test_division_needs_two_inputs() {
        assert_eq!(
            Operation::Division.compute(&[4.0]),
            Err(CalculationError::InvalidInputCount {
                operation: Operation::Division,
                required: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn test_empty_inputs_are_rejected() {
        for operation in Operation::ALL {
            assert!(
                matches!(
                    operation.compute(&[]),
                    Err(CalculationError::InvalidInputCount { actual: 0, .. })
                ),
                "{operation} accepted an empty input list"
            );
        }
    }

    #[test]
    fn test_division_by_zero_reports_index() {
        assert_eq!(
            compute("division", &[10.0, 0.0]),
            Err(CalculationError::DivisionByZero { index: 1 })
        );
        assert_eq!(
            compute("division", &[10.0, 2.0, -0.0]),
            Err(CalculationError::DivisionByZero { index: 2 })
        );
    }

    #[test]
    fn test_zero_dividend_is_fine() {
        assert_eq!(compute("division", &[0.0, 4.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_non_finite_inputs() {
        assert_eq!(
            compute("addition", &[1.0, f64::NAN]),
            Err(CalculationError::NonFiniteInput { index: 1 })
        );
        assert_eq!(
            compute("multiplication", &[f64::INFINITY, 1.0]),
            Err(CalculationError::NonFiniteInput { index: 0 })
        );
    }

    #[test]
    fn test_overflow_is_rejected() {
        assert_eq!(
            compute("multiplication", &[1e308, 10.0]),
            Err(CalculationError::NonFiniteResult {
                operation: Operation::Multiplication
            })
        );
        assert!(matches!(
            compute("division", &[1e308, 1e-308]),
            Err(CalculationError::NonFiniteResult { .. })
        ));
    }

    #[test]
    fn test_too_many_inputs() {
        let inputs = vec![1.0; MAX_INPUTS + 1];
        assert!(matches!(
            Operation::Addition.compute(&inputs),
            Err(CalculationError::TooManyInputs { .. })
        ));
        assert_eq!(
            Operation::Addition.compute(&inputs[..MAX_INPUTS]).unwrap(),
            1000.0
        );
    }

    #[test]
    fn test_deterministic() {
        let inputs = [0.1, 0.2, 0.3, -7.25, 1e-3];
        for operation in Operation::ALL {
            let first = operation.compute(&inputs).unwrap();
            let second = operation.compute(&inputs).unwrap();
            assert_eq!(first.to_bits(), second.to_bits());
        }
    }

    #[test]
    fn test_parse_names_and_aliases() {
        assert_eq!("addition".parse::<Operation>().unwrap(), Operation::Addition);
        assert_eq!(" Division ".parse::<Operation>().unwrap(), Operation::Division);
        assert_eq!("MUL".parse::<Operation>().unwrap(), Operation::Multiplication);
        assert_eq!("subtract".parse::<Operation>().unwrap(), Operation::Subtraction);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            "modulo".parse::<Operation>(),
            Err(CalculationError::UnknownOperation("modulo".to_owned()))
        );
        assert!("".parse::<Operation>().is_err());
    }

    #[test]
    fn test_name_round_trips() {
        for operation in Operation::ALL {
            assert_eq!(operation.name().parse::<Operation>().unwrap(), operation);
            assert_eq!(
                serde_json::to_string(&operation).unwrap(),
                format!("\"{}\"", operation.name())
            );
        }
    }
}
