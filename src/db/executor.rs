//! Query Executor contract and result coercion
//!
//! An executor runs one gate-accepted statement, fetches at most one row
//! and reduces its first cell to an `i64`.

use crate::error::{PipelineError, Result};
use crate::safety::AcceptedSql;
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute once and coerce the first cell. No row or NULL yields 0.
    async fn fetch_scalar(&self, sql: &AcceptedSql) -> Result<i64>;

    fn name(&self) -> &str;
}

/// The first cell of a result row, as read from the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarCell {
    Null,
    Int(i64),
    Decimal(Decimal),
    Float(f64),
    Text(String),
    /// A value of a type that has no integer reading; carries the type name.
    Other(String),
}

/// Coerce the first cell of an optional first row.
pub fn coerce_row(cell: Option<ScalarCell>) -> Result<i64> {
    match cell {
        None => Ok(0),
        Some(cell) => coerce_cell(cell),
    }
}

/// Fractional numbers truncate toward zero; out-of-range values and
/// non-numeric text are a type mismatch.
pub fn coerce_cell(cell: ScalarCell) -> Result<i64> {
    match cell {
        ScalarCell::Null => Ok(0),
        ScalarCell::Int(value) => Ok(value),
        ScalarCell::Decimal(value) => value
            .trunc()
            .to_i64()
            .ok_or_else(|| mismatch(format!("decimal {} out of range", value))),
        ScalarCell::Float(value) => {
            let truncated = value.trunc();
            if value.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                Ok(truncated as i64)
            } else {
                Err(mismatch(format!("float {} not representable", value)))
            }
        }
        ScalarCell::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| mismatch(format!("text '{}' is not an integer", text))),
        ScalarCell::Other(type_name) => Err(mismatch(format!("column of type {}", type_name))),
    }
}

fn mismatch(detail: String) -> PipelineError {
    PipelineError::ResultTypeMismatch(detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use std::str::FromStr;

    #[test]
    fn test_no_row_is_zero() {
        assert_eq!(coerce_row(None).unwrap(), 0);
    }

    #[test]
    fn test_null_cell_is_zero() {
        assert_eq!(coerce_row(Some(ScalarCell::Null)).unwrap(), 0);
    }

    #[test]
    fn test_integer_cell_passes_through() {
        assert_eq!(coerce_row(Some(ScalarCell::Int(42))).unwrap(), 42);
        assert_eq!(coerce_row(Some(ScalarCell::Int(-7))).unwrap(), -7);
    }

    #[test]
    fn test_numeric_sum_truncates() {
        let sum = Decimal::from_str("1234567").unwrap();
        assert_eq!(coerce_cell(ScalarCell::Decimal(sum)).unwrap(), 1_234_567);
        let avg = Decimal::from_str("-2.75").unwrap();
        assert_eq!(coerce_cell(ScalarCell::Decimal(avg)).unwrap(), -2);
    }

    #[test]
    fn test_float_and_text() {
        assert_eq!(coerce_cell(ScalarCell::Float(3.9)).unwrap(), 3);
        assert_eq!(coerce_cell(ScalarCell::Text(" 15 ".to_string())).unwrap(), 15);
        assert_eq!(
            coerce_cell(ScalarCell::Float(f64::NAN)).unwrap_err().kind(),
            FailureKind::ResultTypeMismatch
        );
        assert_eq!(
            coerce_cell(ScalarCell::Float(1e30)).unwrap_err().kind(),
            FailureKind::ResultTypeMismatch
        );
    }

    #[test]
    fn test_non_numeric_is_mismatch() {
        let err = coerce_cell(ScalarCell::Text("abc".to_string())).unwrap_err();
        assert_eq!(err.kind(), FailureKind::ResultTypeMismatch);
        let err = coerce_cell(ScalarCell::Other("BOOL".to_string())).unwrap_err();
        assert_eq!(err.kind(), FailureKind::ResultTypeMismatch);
    }
}
