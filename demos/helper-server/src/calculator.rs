//! Integer arithmetic behind `/duplicate` and `/square`.
//!
//! Every outcome, including bad input, is a plain-text sentence.

use std::fmt;
use thiserror::Error;

/// Why a calculation produced no number.
///
/// The `Display` text is what the server answers with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    /// The input does not parse as a 64-bit integer
    #[error("Value {0} cannot be interpreted as an integer value!")]
    NotAnInteger(String),

    /// The query parameter was absent
    #[error("Query parameter '{0}' is required")]
    Missing(&'static str),

    /// The result does not fit in 64 bits
    #[error("The {op} of {input} is too large to compute")]
    Overflow {
        /// Requested operation
        op: Operation,
        /// Its input
        input: i64,
    },
}

/// Supported operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `2n`
    Duplicate,
    /// `n²`
    Square,
}

impl Operation {
    /// Apply the operation with overflow checking.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::Overflow`] if the result does not fit in an `i64`.
    pub fn apply(self, input: i64) -> Result<i64, CalcError> {
        let result = match self {
            Self::Duplicate => input.checked_mul(2),
            Self::Square => input.checked_mul(input),
        };
        result.ok_or(CalcError::Overflow { op: self, input })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate => f.write_str("duplicate"),
            Self::Square => f.write_str("square"),
        }
    }
}

/// Parse a decimal integer, ignoring surrounding whitespace.
///
/// # Errors
///
/// Returns [`CalcError::NotAnInteger`] carrying the raw input.
pub fn parse_integer(raw: &str) -> Result<i64, CalcError> {
    raw.trim()
        .parse()
        .map_err(|_| CalcError::NotAnInteger(raw.to_string()))
}

/// `2n`.
///
/// # Errors
///
/// Returns [`CalcError::Overflow`] on overflow.
pub fn duplicate(n: i64) -> Result<i64, CalcError> {
    Operation::Duplicate.apply(n)
}

/// `n²`.
///
/// # Errors
///
/// Returns [`CalcError::Overflow`] on overflow.
pub fn square(n: i64) -> Result<i64, CalcError> {
    Operation::Square.apply(n)
}

/// Answer a request for `op` on the raw `number` parameter.
#[must_use]
pub fn answer(op: Operation, raw: Option<&str>) -> String {
    let outcome = raw
        .ok_or(CalcError::Missing("number"))
        .and_then(parse_integer)
        .and_then(|n| op.apply(n).map(|result| (n, result)));

    match outcome {
        Ok((n, result)) => format!("The {op} of {n} is {result}"),
        Err(error) => error.to_string(),
    }
}
