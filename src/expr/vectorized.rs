//! Whole-column evaluation through Arrow compute kernels.
//!
//! Results match the per-row evaluator: the same type matrix, wrapping
//! integer arithmetic, null propagation and `DivisionByZero` rows.

use std::sync::Arc;

use arrow::array::{new_null_array, Array, ArrayRef, Float64Array, Int64Array, PrimitiveArray};
use arrow::compute;
use arrow::compute::kernels::arity::try_binary;
use arrow::compute::kernels::numeric::{add, add_wrapping, div, mul, mul_wrapping, rem, sub, sub_wrapping};
use arrow::datatypes::{ArrowPrimitiveType, DataType as ArrowDataType};

use super::{BinaryOp, VectorOp};
use crate::error::{EngineError, Result};
use crate::types::{describe, downcast_array, DataType};

/// Arithmetic mean, or `None` when there are no values.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance, or `None` with fewer than two values.
pub(crate) fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let squares: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(squares / (values.len() - 1) as f64)
}

fn valid_values<T>(array: &PrimitiveArray<T>) -> Vec<T::Native>
where
    T: ArrowPrimitiveType,
{
    array.iter().flatten().collect()
}

/// Valid values of a numeric column widened to `f64`.
pub(crate) fn float_values(array: &dyn Array, op: &str) -> Result<Vec<f64>> {
    match DataType::of(array, op)? {
        DataType::Int64 => Ok(valid_values(downcast_array::<Int64Array>(array, op)?)
            .into_iter()
            .map(|v| v as f64)
            .collect()),
        DataType::Float64 => Ok(valid_values(downcast_array::<Float64Array>(array, op)?)),
        DataType::Null => Ok(Vec::new()),
        other => Err(EngineError::type_mismatch(op, "numeric", other.name())),
    }
}

/// Reduces one numeric column to a length-1 column.
pub(super) fn aggregate(op: VectorOp, array: &ArrayRef) -> Result<ArrayRef> {
    let name = op.name();
    let array = if array.data_type() == &ArrowDataType::Null {
        new_null_array(&ArrowDataType::Int64, array.len())
    } else {
        Arc::clone(array)
    };
    let data_type = DataType::of(array.as_ref(), name)?;
    if !data_type.is_numeric() {
        return Err(EngineError::type_mismatch(
            name,
            "numeric",
            describe(array.data_type()),
        ));
    }
    let out: ArrayRef = match (op, data_type) {
        (VectorOp::Sum, DataType::Int64) => {
            let ints = downcast_array::<Int64Array>(array.as_ref(), name)?;
            Arc::new(Int64Array::from(vec![compute::sum(ints).unwrap_or(0)]))
        }
        (VectorOp::Sum, _) => {
            let floats = downcast_array::<Float64Array>(array.as_ref(), name)?;
            Arc::new(Float64Array::from(vec![compute::sum(floats).unwrap_or(0.0)]))
        }
        (VectorOp::Min | VectorOp::Max, DataType::Int64) => {
            let ints = downcast_array::<Int64Array>(array.as_ref(), name)?;
            let value = if op == VectorOp::Min {
                compute::min(ints)
            } else {
                compute::max(ints)
            };
            Arc::new(Int64Array::from(vec![value]))
        }
        (VectorOp::Min | VectorOp::Max, _) => {
            let floats = downcast_array::<Float64Array>(array.as_ref(), name)?;
            let value = if op == VectorOp::Min {
                compute::min(floats)
            } else {
                compute::max(floats)
            };
            Arc::new(Float64Array::from(vec![value]))
        }
        (VectorOp::Mean, _) => {
            let values = float_values(array.as_ref(), name)?;
            Arc::new(Float64Array::from(vec![mean(&values)]))
        }
        (VectorOp::Variance | VectorOp::StdDev, _) => {
            let values = float_values(array.as_ref(), name)?;
            let variance = sample_variance(&values);
            let value = if op == VectorOp::StdDev {
                variance.map(f64::sqrt)
            } else {
                variance
            };
            Arc::new(Float64Array::from(vec![value]))
        }
        (op, _) => {
            return Err(EngineError::UnsupportedOperation(format!(
                "{} is not an aggregate",
                op.name()
            )))
        }
    };
    Ok(out)
}

/// First row where both operands are valid and the divisor is zero.
fn zero_divisor_row<T>(left: &PrimitiveArray<T>, right: &PrimitiveArray<T>) -> Option<usize>
where
    T: ArrowPrimitiveType,
    T::Native: PartialEq + Default,
{
    let zero = T::Native::default();
    (0..right.len()).find(|&row| left.is_valid(row) && right.is_valid(row) && right.value(row) == zero)
}

/// Elementwise arithmetic over two equal-length columns.
pub(crate) fn arithmetic(op: BinaryOp, left: &ArrayRef, right: &ArrayRef) -> Result<ArrayRef> {
    let name = op.name();
    let left_type = DataType::of(left.as_ref(), name)?;
    let right_type = DataType::of(right.as_ref(), name)?;
    let divides = matches!(op, BinaryOp::Div | BinaryOp::Mod);
    match (left_type, right_type) {
        (DataType::Int64, DataType::Int64) => {
            let l = downcast_array::<Int64Array>(left.as_ref(), name)?;
            let r = downcast_array::<Int64Array>(right.as_ref(), name)?;
            if divides {
                if let Some(row) = zero_divisor_row(l, r) {
                    return Err(EngineError::DivisionByZero { row });
                }
            }
            let out: ArrayRef = match op {
                BinaryOp::Add => add_wrapping(l, r)?,
                BinaryOp::Sub => sub_wrapping(l, r)?,
                BinaryOp::Mul => mul_wrapping(l, r)?,
                BinaryOp::Div => {
                    // Only valid slots reach the closure, so null divisors are never read.
                    let out: Int64Array = try_binary(l, r, |a: i64, b: i64| Ok(a.wrapping_div(b)))?;
                    Arc::new(out)
                }
                BinaryOp::Mod => {
                    let out: Int64Array = try_binary(l, r, |a: i64, b: i64| Ok(a.wrapping_rem(b)))?;
                    Arc::new(out)
                }
                other => return Err(EngineError::unsupported_type(other.name(), "Int64 and Int64")),
            };
            Ok(out)
        }
        (DataType::Float64, DataType::Float64) => {
            let l = downcast_array::<Float64Array>(left.as_ref(), name)?;
            let r = downcast_array::<Float64Array>(right.as_ref(), name)?;
            if divides {
                if let Some(row) = zero_divisor_row(l, r) {
                    return Err(EngineError::DivisionByZero { row });
                }
            }
            let out = match op {
                BinaryOp::Add => add(l, r)?,
                BinaryOp::Sub => sub(l, r)?,
                BinaryOp::Mul => mul(l, r)?,
                BinaryOp::Div => div(l, r)?,
                BinaryOp::Mod => rem(l, r)?,
                other => {
                    return Err(EngineError::unsupported_type(
                        other.name(),
                        "Float64 and Float64",
                    ))
                }
            };
            Ok(out)
        }
        (l, r) => Err(EngineError::unsupported_type(name, format!("{l} and {r}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_of_all_null_is_zero() {
        let array: ArrayRef = Arc::new(Int64Array::from(vec![None, None]));
        let out = aggregate(VectorOp::Sum, &array).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.as_any().downcast_ref::<Int64Array>().unwrap().value(0), 0);
    }

    #[test]
    fn test_min_max_mean() {
        let array: ArrayRef = Arc::new(Int64Array::from(vec![Some(3), None, Some(1), Some(8)]));
        let min = aggregate(VectorOp::Min, &array).unwrap();
        assert_eq!(min.as_any().downcast_ref::<Int64Array>().unwrap().value(0), 1);
        let max = aggregate(VectorOp::Max, &array).unwrap();
        assert_eq!(max.as_any().downcast_ref::<Int64Array>().unwrap().value(0), 8);
        let mean = aggregate(VectorOp::Mean, &array).unwrap();
        assert_eq!(mean.as_any().downcast_ref::<Float64Array>().unwrap().value(0), 4.0);
    }

    #[test]
    fn test_variance_needs_two_values() {
        let one: ArrayRef = Arc::new(Float64Array::from(vec![Some(2.0), None]));
        let out = aggregate(VectorOp::Variance, &one).unwrap();
        assert!(out.is_null(0));

        let many: ArrayRef = Arc::new(Float64Array::from(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]));
        let out = aggregate(VectorOp::StdDev, &many).unwrap();
        let std = out.as_any().downcast_ref::<Float64Array>().unwrap().value(0);
        assert!((std - 2.138_089_935).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_rejects_strings() {
        let array: ArrayRef = Arc::new(arrow::array::StringArray::from(vec!["a"]));
        let err = aggregate(VectorOp::Sum, &array).unwrap_err();
        assert!(matches!(err, EngineError::TypeMismatch { .. }));
    }

    #[test]
    fn test_wrapping_and_null_rows() {
        let l: ArrayRef = Arc::new(Int64Array::from(vec![Some(i64::MAX), None, Some(i64::MIN)]));
        let r: ArrayRef = Arc::new(Int64Array::from(vec![Some(1), Some(0), Some(-1)]));
        let sum = arithmetic(BinaryOp::Add, &l, &r).unwrap();
        let sum = sum.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(sum.value(0), i64::MIN);
        assert!(sum.is_null(1));

        let quotient = arithmetic(BinaryOp::Div, &l, &r).unwrap();
        let quotient = quotient.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(quotient.value(2), i64::MIN);
        assert!(quotient.is_null(1));
    }

    #[test]
    fn test_zero_divisor_reports_row() {
        let l: ArrayRef = Arc::new(Float64Array::from(vec![1.0, 2.0]));
        let r: ArrayRef = Arc::new(Float64Array::from(vec![1.0, 0.0]));
        let err = arithmetic(BinaryOp::Mod, &l, &r).unwrap_err();
        assert!(matches!(err, EngineError::DivisionByZero { row: 1 }));
    }
}
