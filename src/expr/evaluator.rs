//! Per-row expression evaluator.
//!
//! Each operator downcasts its operands to their concrete Arrow arrays and
//! walks the rows, applying the null rule before touching values. The
//! supported `(left, right)` type pairs are spelled out in each dispatch
//! `match`; anything else is `UnsupportedType`.

use std::sync::Arc;

use arrow::array::{
    new_null_array, Array, ArrayRef, ArrowPrimitiveType, BooleanArray, BooleanBuilder,
    Date32Array, Float64Array, Int64Array, PrimitiveArray, PrimitiveBuilder, StringArray,
    StringBuilder, TimestampMicrosecondArray,
};
use arrow::datatypes::{
    DataType as ArrowDataType, Date32Type, Float64Type, Int64Type, TimestampMicrosecondType,
};

use super::string::RegexCache;
use super::{string, temporal, vectorized, BinaryOp, Expr, UnaryOp};
use crate::batch::Batch;
use crate::config::ExecContext;
use crate::error::{EngineError, Result};
use crate::types::{downcast_array, DataType, ScalarValue, MICROS_PER_DAY};

/// Evaluates expressions against one batch.
pub(crate) struct Evaluator<'a> {
    ctx: &'a ExecContext,
    batch: &'a Batch,
    regexes: RegexCache,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(ctx: &'a ExecContext, batch: &'a Batch) -> Self {
        Evaluator {
            ctx,
            batch,
            regexes: RegexCache::new(ctx.config().regex_cache_size),
        }
    }

    pub(crate) fn evaluate(&mut self, expr: &Expr) -> Result<ArrayRef> {
        match expr {
            Expr::Column(name) => self.batch.column_by_name(name).map(Arc::clone),
            Expr::Literal(value) => Ok(value.to_array(self.batch.num_rows())),
            Expr::Unary { op, operand } => {
                let array = self.evaluate(operand)?;
                unary(*op, &array)
            }
            Expr::Binary { op, left, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                self.binary(*op, left, right)
            }
            Expr::Vectorized { op, operands } => {
                if operands.len() != op.arity() {
                    return Err(EngineError::InvalidArgument(format!(
                        "{} takes {} operand(s), got {}",
                        op.name(),
                        op.arity(),
                        operands.len()
                    )));
                }
                if let Some(binary) = op.as_binary() {
                    let left = self.evaluate(&operands[0])?;
                    let right = self.evaluate(&operands[1])?;
                    if left.len() != right.len() {
                        return Err(EngineError::length_mismatch(
                            op.name(),
                            left.len(),
                            right.len(),
                        ));
                    }
                    let (left, right) = coerce_null_operands(binary, left, right)?;
                    return vectorized::arithmetic(binary, &left, &right);
                }
                let array = self.evaluate(&operands[0])?;
                vectorized::aggregate(*op, &array)
            }
        }
    }

    fn binary(&mut self, op: BinaryOp, left: ArrayRef, right: ArrayRef) -> Result<ArrayRef> {
        if left.len() != right.len() {
            return Err(EngineError::length_mismatch(op.name(), left.len(), right.len()));
        }
        let (left, right) = coerce_null_operands(op, left, right)?;
        if op.is_arithmetic() {
            if self.ctx.config().vectorized_arithmetic {
                return vectorized::arithmetic(op, &left, &right);
            }
            return arithmetic(op, &left, &right);
        }
        if op.is_comparison() {
            return comparison(op, &left, &right);
        }
        match op {
            BinaryOp::And | BinaryOp::Or => logical(op, &left, &right),
            op if op.is_string() => string::binary(op, &left, &right, &mut self.regexes),
            op => temporal::binary(op, &left, &right),
        }
    }
}

/// Replaces untyped null operands with typed all-null arrays.
///
/// The null side adopts the type its partner would need, so the regular
/// dispatch matrix (and its null rule) applies unchanged.
fn coerce_null_operands(
    op: BinaryOp,
    left: ArrayRef,
    right: ArrayRef,
) -> Result<(ArrayRef, ArrayRef)> {
    let left_null = left.data_type() == &ArrowDataType::Null;
    let right_null = right.data_type() == &ArrowDataType::Null;
    if !left_null && !right_null {
        return Ok((left, right));
    }
    let (left_type, right_type) = match op {
        BinaryOp::And | BinaryOp::Or => (DataType::Boolean, DataType::Boolean),
        op if op.is_string() => (DataType::Utf8, DataType::Utf8),
        BinaryOp::AddDays | BinaryOp::AddMonths => {
            let left_type = if left_null {
                DataType::Date
            } else {
                DataType::of(left.as_ref(), op.name())?
            };
            (left_type, DataType::Int64)
        }
        _ => {
            let fallback = if op == BinaryOp::DiffDays {
                DataType::Date
            } else {
                DataType::Int64
            };
            let partner = match (left_null, right_null) {
                (true, true) => fallback,
                (true, false) => DataType::of(right.as_ref(), op.name())?,
                _ => DataType::of(left.as_ref(), op.name())?,
            };
            (partner, partner)
        }
    };
    let len = left.len();
    let left = if left_null {
        new_null_array(&left_type.to_arrow(), len)
    } else {
        left
    };
    let right = if right_null {
        new_null_array(&right_type.to_arrow(), len)
    } else {
        right
    };
    Ok((left, right))
}

fn type_pair(op: &str, left: &dyn Array, right: &dyn Array) -> Result<(DataType, DataType)> {
    Ok((DataType::of(left, op)?, DataType::of(right, op)?))
}

fn unsupported_pair(op: &str, left: DataType, right: DataType) -> EngineError {
    EngineError::unsupported_type(op, format!("{left} and {right}"))
}

/// Applies `f` to every row where both operands are valid; other rows are null.
pub(super) fn binary_rows<L, R, O, F>(
    left: &PrimitiveArray<L>,
    right: &PrimitiveArray<R>,
    mut f: F,
) -> Result<PrimitiveArray<O>>
where
    L: ArrowPrimitiveType,
    R: ArrowPrimitiveType,
    O: ArrowPrimitiveType,
    F: FnMut(usize, L::Native, R::Native) -> Result<O::Native>,
{
    let mut builder = PrimitiveBuilder::<O>::with_capacity(left.len());
    for row in 0..left.len() {
        if left.is_null(row) || right.is_null(row) {
            builder.append_null();
            continue;
        }
        builder.append_value(f(row, left.value(row), right.value(row))?);
    }
    Ok(builder.finish())
}

/// Applies `f` to every valid row; null rows stay null.
pub(super) fn unary_rows<T, O, F>(array: &PrimitiveArray<T>, mut f: F) -> Result<PrimitiveArray<O>>
where
    T: ArrowPrimitiveType,
    O: ArrowPrimitiveType,
    F: FnMut(usize, T::Native) -> Result<O::Native>,
{
    let mut builder = PrimitiveBuilder::<O>::with_capacity(array.len());
    for row in 0..array.len() {
        if array.is_null(row) {
            builder.append_null();
            continue;
        }
        builder.append_value(f(row, array.value(row))?);
    }
    Ok(builder.finish())
}

/// Builds a boolean column row by row; `None` marks a null row.
pub(super) fn boolean_rows<F>(len: usize, mut f: F) -> Result<BooleanArray>
where
    F: FnMut(usize) -> Result<Option<bool>>,
{
    let mut builder = BooleanBuilder::with_capacity(len);
    for row in 0..len {
        builder.append_option(f(row)?);
    }
    Ok(builder.finish())
}

pub(crate) fn int_arithmetic(op: BinaryOp, row: usize, a: i64, b: i64) -> Result<i64> {
    match op {
        BinaryOp::Add => Ok(a.wrapping_add(b)),
        BinaryOp::Sub => Ok(a.wrapping_sub(b)),
        BinaryOp::Mul => Ok(a.wrapping_mul(b)),
        BinaryOp::Div if b == 0 => Err(EngineError::DivisionByZero { row }),
        BinaryOp::Div => Ok(a.wrapping_div(b)),
        BinaryOp::Mod if b == 0 => Err(EngineError::DivisionByZero { row }),
        BinaryOp::Mod => Ok(a.wrapping_rem(b)),
        other => Err(EngineError::UnsupportedOperation(format!(
            "{} is not an arithmetic operator",
            other.name()
        ))),
    }
}

pub(crate) fn float_arithmetic(op: BinaryOp, row: usize, a: f64, b: f64) -> Result<f64> {
    match op {
        BinaryOp::Add => Ok(a + b),
        BinaryOp::Sub => Ok(a - b),
        BinaryOp::Mul => Ok(a * b),
        BinaryOp::Div | BinaryOp::Mod if b == 0.0 => Err(EngineError::DivisionByZero { row }),
        BinaryOp::Div => Ok(a / b),
        BinaryOp::Mod => Ok(a % b),
        other => Err(EngineError::UnsupportedOperation(format!(
            "{} is not an arithmetic operator",
            other.name()
        ))),
    }
}

fn arithmetic(op: BinaryOp, left: &ArrayRef, right: &ArrayRef) -> Result<ArrayRef> {
    let name = op.name();
    match type_pair(name, left.as_ref(), right.as_ref())? {
        (DataType::Int64, DataType::Int64) => {
            let l = downcast_array::<Int64Array>(left.as_ref(), name)?;
            let r = downcast_array::<Int64Array>(right.as_ref(), name)?;
            let out: Int64Array = binary_rows(l, r, |row, a, b| int_arithmetic(op, row, a, b))?;
            Ok(Arc::new(out))
        }
        (DataType::Float64, DataType::Float64) => {
            let l = downcast_array::<Float64Array>(left.as_ref(), name)?;
            let r = downcast_array::<Float64Array>(right.as_ref(), name)?;
            let out: Float64Array =
                binary_rows(l, r, |row, a, b| float_arithmetic(op, row, a, b))?;
            Ok(Arc::new(out))
        }
        (l, r) => Err(unsupported_pair(name, l, r)),
    }
}

fn compare_values<V: PartialOrd + ?Sized>(op: BinaryOp, a: &V, b: &V) -> bool {
    match op {
        BinaryOp::Eq => a == b,
        BinaryOp::NotEq => a != b,
        BinaryOp::Lt => a < b,
        BinaryOp::LtEq => a <= b,
        BinaryOp::Gt => a > b,
        _ => a >= b,
    }
}

fn compare_primitive<T>(op: BinaryOp, left: &ArrayRef, right: &ArrayRef) -> Result<BooleanArray>
where
    T: ArrowPrimitiveType,
    T::Native: PartialOrd,
{
    let l = downcast_array::<PrimitiveArray<T>>(left.as_ref(), op.name())?;
    let r = downcast_array::<PrimitiveArray<T>>(right.as_ref(), op.name())?;
    boolean_rows(l.len(), |row| {
        if l.is_null(row) || r.is_null(row) {
            return Ok(None);
        }
        Ok(Some(compare_values(op, &l.value(row), &r.value(row))))
    })
}

fn comparison(op: BinaryOp, left: &ArrayRef, right: &ArrayRef) -> Result<ArrayRef> {
    let name = op.name();
    let (lt, rt) = type_pair(name, left.as_ref(), right.as_ref())?;
    if lt != rt {
        return Err(unsupported_pair(name, lt, rt));
    }
    let out = match lt {
        DataType::Int64 => compare_primitive::<Int64Type>(op, left, right)?,
        DataType::Float64 => compare_primitive::<Float64Type>(op, left, right)?,
        DataType::Date => compare_primitive::<Date32Type>(op, left, right)?,
        DataType::Timestamp => compare_primitive::<TimestampMicrosecondType>(op, left, right)?,
        DataType::Utf8 => {
            let l = downcast_array::<StringArray>(left.as_ref(), name)?;
            let r = downcast_array::<StringArray>(right.as_ref(), name)?;
            boolean_rows(l.len(), |row| {
                if l.is_null(row) || r.is_null(row) {
                    return Ok(None);
                }
                Ok(Some(compare_values(op, l.value(row), r.value(row))))
            })?
        }
        DataType::Boolean => {
            let l = downcast_array::<BooleanArray>(left.as_ref(), name)?;
            let r = downcast_array::<BooleanArray>(right.as_ref(), name)?;
            boolean_rows(l.len(), |row| {
                if l.is_null(row) || r.is_null(row) {
                    return Ok(None);
                }
                Ok(Some(compare_values(op, &l.value(row), &r.value(row))))
            })?
        }
        DataType::Null => BooleanArray::from(vec![None; left.len()]),
    };
    Ok(Arc::new(out))
}

fn logical(op: BinaryOp, left: &ArrayRef, right: &ArrayRef) -> Result<ArrayRef> {
    let name = op.name();
    match type_pair(name, left.as_ref(), right.as_ref())? {
        (DataType::Boolean, DataType::Boolean) => {
            let l = downcast_array::<BooleanArray>(left.as_ref(), name)?;
            let r = downcast_array::<BooleanArray>(right.as_ref(), name)?;
            let out = boolean_rows(l.len(), |row| {
                if l.is_null(row) || r.is_null(row) {
                    return Ok(None);
                }
                let (a, b) = (l.value(row), r.value(row));
                Ok(Some(if op == BinaryOp::And { a && b } else { a || b }))
            })?;
            Ok(Arc::new(out))
        }
        (l, r) => Err(unsupported_pair(name, l, r)),
    }
}

/// Input type an operator expects when handed an untyped null operand.
fn null_operand_type(op: UnaryOp) -> DataType {
    match op {
        UnaryOp::Not => DataType::Boolean,
        op if op.is_string() => DataType::Utf8,
        op if op.is_temporal() => DataType::Date,
        _ => DataType::Int64,
    }
}

fn unary(op: UnaryOp, array: &ArrayRef) -> Result<ArrayRef> {
    if matches!(op, UnaryOp::IsNull | UnaryOp::IsNotNull) {
        return Ok(Arc::new(null_test(array.as_ref(), op == UnaryOp::IsNull)));
    }
    if let UnaryOp::Cast(to) = op {
        return cast(array, to);
    }
    let coerced;
    let array = if array.data_type() == &ArrowDataType::Null {
        coerced = new_null_array(&null_operand_type(op).to_arrow(), array.len());
        &coerced
    } else {
        array
    };
    if op.is_string() {
        return string::unary(op, array);
    }
    if op.is_temporal() {
        return temporal::unary(op, array);
    }
    let name = op.name();
    let data_type = DataType::of(array.as_ref(), &name)?;
    match (op, data_type) {
        (UnaryOp::Neg, DataType::Int64) => {
            let a = downcast_array::<Int64Array>(array.as_ref(), &name)?;
            let out: Int64Array = unary_rows(a, |_, v: i64| Ok(v.wrapping_neg()))?;
            Ok(Arc::new(out))
        }
        (UnaryOp::Neg, DataType::Float64) => {
            let a = downcast_array::<Float64Array>(array.as_ref(), &name)?;
            let out: Float64Array = unary_rows(a, |_, v: f64| Ok(-v))?;
            Ok(Arc::new(out))
        }
        (UnaryOp::Abs, DataType::Int64) => {
            let a = downcast_array::<Int64Array>(array.as_ref(), &name)?;
            let out: Int64Array = unary_rows(a, |_, v: i64| Ok(v.wrapping_abs()))?;
            Ok(Arc::new(out))
        }
        (UnaryOp::Abs, DataType::Float64) => {
            let a = downcast_array::<Float64Array>(array.as_ref(), &name)?;
            let out: Float64Array = unary_rows(a, |_, v: f64| Ok(v.abs()))?;
            Ok(Arc::new(out))
        }
        (UnaryOp::Not, DataType::Boolean) => {
            let a = downcast_array::<BooleanArray>(array.as_ref(), &name)?;
            let out = boolean_rows(a.len(), |row| {
                Ok((!a.is_null(row)).then(|| !a.value(row)))
            })?;
            Ok(Arc::new(out))
        }
        (_, data_type) => Err(EngineError::unsupported_type(name, data_type.name())),
    }
}

/// Null-safe null test; never produces null.
fn null_test(array: &dyn Array, want_null: bool) -> BooleanArray {
    let nulls = array.logical_nulls();
    (0..array.len())
        .map(|row| {
            let is_null = nulls.as_ref().map_or(false, |n| n.is_null(row));
            Some(is_null == want_null)
        })
        .collect()
}

fn float_to_int(row: usize, v: f64) -> Result<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    if !v.is_finite() || v < i64::MIN as f64 || v >= i64::MAX as f64 {
        return Err(EngineError::UnsupportedOperation(format!(
            "cannot cast {v} to Int64 at row {row}"
        )));
    }
    Ok(v.trunc() as i64)
}

fn cast(array: &ArrayRef, to: DataType) -> Result<ArrayRef> {
    let name = UnaryOp::Cast(to).name();
    let from = DataType::of(array.as_ref(), &name)?;
    if from == to {
        return Ok(Arc::clone(array));
    }
    if from == DataType::Null {
        return Ok(new_null_array(&to.to_arrow(), array.len()));
    }
    match (from, to) {
        (DataType::Int64, DataType::Float64) => {
            let a = downcast_array::<Int64Array>(array.as_ref(), &name)?;
            let out: Float64Array = unary_rows(a, |_, v: i64| Ok(v as f64))?;
            Ok(Arc::new(out))
        }
        (DataType::Float64, DataType::Int64) => {
            let a = downcast_array::<Float64Array>(array.as_ref(), &name)?;
            let out: Int64Array = unary_rows(a, float_to_int)?;
            Ok(Arc::new(out))
        }
        (DataType::Date, DataType::Timestamp) => {
            let a = downcast_array::<Date32Array>(array.as_ref(), &name)?;
            let out: TimestampMicrosecondArray = unary_rows(a, |row, days: i32| {
                i64::from(days).checked_mul(MICROS_PER_DAY).ok_or_else(|| {
                    EngineError::UnsupportedOperation(format!(
                        "date at row {row} is outside the timestamp range"
                    ))
                })
            })?;
            Ok(Arc::new(out))
        }
        (DataType::Timestamp, DataType::Date) => {
            let a = downcast_array::<TimestampMicrosecondArray>(array.as_ref(), &name)?;
            let out: Date32Array = unary_rows(a, |row, micros: i64| {
                i32::try_from(micros.div_euclid(MICROS_PER_DAY)).map_err(|_| {
                    EngineError::UnsupportedOperation(format!(
                        "timestamp at row {row} is outside the date range"
                    ))
                })
            })?;
            Ok(Arc::new(out))
        }
        (_, DataType::Utf8) => {
            let mut builder = StringBuilder::with_capacity(array.len(), array.len() * 8);
            for row in 0..array.len() {
                match ScalarValue::try_from_array(array.as_ref(), row)? {
                    ScalarValue::Null => builder.append_null(),
                    value => builder.append_value(value.to_string()),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        (from, to) => Err(EngineError::unsupported_type(
            name,
            format!("{from} to {to}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{col, evaluate, lit, null};

    fn ctx() -> ExecContext {
        ExecContext::default()
    }

    fn batch() -> Batch {
        Batch::try_from_iter(vec![
            (
                "i",
                Arc::new(Int64Array::from(vec![Some(1), Some(2), None, Some(4)])) as ArrayRef,
            ),
            (
                "j",
                Arc::new(Int64Array::from(vec![Some(10), Some(0), Some(30), Some(40)])) as ArrayRef,
            ),
            (
                "f",
                Arc::new(Float64Array::from(vec![1.5, 2.5, 3.5, 4.5])) as ArrayRef,
            ),
            (
                "s",
                Arc::new(StringArray::from(vec![Some("a"), None, Some("c"), Some("d")])) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    fn ints(array: &ArrayRef) -> Vec<Option<i64>> {
        array
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap()
            .iter()
            .collect()
    }

    fn bools(array: &ArrayRef) -> Vec<Option<bool>> {
        array
            .as_any()
            .downcast_ref::<BooleanArray>()
            .unwrap()
            .iter()
            .collect()
    }

    #[test]
    fn test_column_ref_is_same_column() {
        let b = batch();
        let out = evaluate(&ctx(), &col("i"), &b).unwrap();
        assert!(Arc::ptr_eq(&out, b.column_by_name("i").unwrap()));
    }

    #[test]
    fn test_add_propagates_nulls() {
        let out = evaluate(&ctx(), &col("i").add(col("j")), &batch()).unwrap();
        assert_eq!(ints(&out), vec![Some(11), Some(2), None, Some(44)]);
    }

    #[test]
    fn test_int_float_add_is_unsupported() {
        let err = evaluate(&ctx(), &col("i").add(col("f")), &batch()).unwrap_err();
        assert!(
            matches!(err, EngineError::UnsupportedType { ref op, ref types } if op == "add" && types == "Int64 and Float64")
        );
    }

    #[test]
    fn test_division_by_zero_aborts() {
        let err = evaluate(&ctx(), &col("i").div(col("j")), &batch()).unwrap_err();
        assert!(matches!(err, EngineError::DivisionByZero { row: 1 }));
    }

    #[test]
    fn test_division_by_zero_skipped_on_null_row() {
        let b = Batch::try_from_iter(vec![
            ("a", Arc::new(Int64Array::from(vec![None, Some(6)])) as ArrayRef),
            ("b", Arc::new(Int64Array::from(vec![0, 3])) as ArrayRef),
        ])
        .unwrap();
        let out = evaluate(&ctx(), &col("a").div(col("b")), &b).unwrap();
        assert_eq!(ints(&out), vec![None, Some(2)]);
    }

    #[test]
    fn test_comparison_with_literal() {
        let out = evaluate(&ctx(), &col("i").gt_eq(lit(2)), &batch()).unwrap();
        assert_eq!(bools(&out), vec![Some(false), Some(true), None, Some(true)]);
    }

    #[test]
    fn test_string_comparison() {
        let out = evaluate(&ctx(), &col("s").lt(lit("c")), &batch()).unwrap();
        assert_eq!(bools(&out), vec![Some(true), None, Some(false), Some(false)]);
    }

    #[test]
    fn test_logical_is_strict_on_nulls() {
        let expr = col("i").gt(lit(0)).and(col("s").eq(lit("a")));
        let out = evaluate(&ctx(), &expr, &batch()).unwrap();
        assert_eq!(bools(&out), vec![Some(true), None, None, Some(false)]);
    }

    #[test]
    fn test_null_literal_adopts_partner_type() {
        let out = evaluate(&ctx(), &col("i").add(null()), &batch()).unwrap();
        assert_eq!(out.data_type(), &ArrowDataType::Int64);
        assert_eq!(out.null_count(), 4);
    }

    #[test]
    fn test_is_null_is_null_safe() {
        let out = evaluate(&ctx(), &col("s").is_null(), &batch()).unwrap();
        assert_eq!(bools(&out), vec![Some(false), Some(true), Some(false), Some(false)]);
        let out = evaluate(&ctx(), &null().is_not_null(), &batch()).unwrap();
        assert_eq!(bools(&out), vec![Some(false); 4]);
    }

    #[test]
    fn test_neg_and_abs() {
        let out = evaluate(&ctx(), &col("i").neg(), &batch()).unwrap();
        assert_eq!(ints(&out), vec![Some(-1), Some(-2), None, Some(-4)]);
        let out = evaluate(&ctx(), &lit(-3).abs(), &batch()).unwrap();
        assert_eq!(ints(&out), vec![Some(3); 4]);
    }

    #[test]
    fn test_cast_round_trip() {
        let out = evaluate(&ctx(), &col("f").cast(DataType::Int64), &batch()).unwrap();
        assert_eq!(ints(&out), vec![Some(1), Some(2), Some(3), Some(4)]);
        let out = evaluate(&ctx(), &col("i").cast(DataType::Utf8), &batch()).unwrap();
        let strings: Vec<Option<&str>> = out
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap()
            .iter()
            .collect();
        assert_eq!(strings, vec![Some("1"), Some("2"), None, Some("4")]);
    }

    #[test]
    fn test_cast_rejects_non_finite() {
        let b = Batch::try_from_iter(vec![(
            "f",
            Arc::new(Float64Array::from(vec![f64::NAN])) as ArrayRef,
        )])
        .unwrap();
        let err = evaluate(&ctx(), &col("f").cast(DataType::Int64), &b).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedOperation(_)));
    }

    #[test]
    fn test_missing_column() {
        let err = evaluate(&ctx(), &col("zzz").add(lit(1)), &batch()).unwrap_err();
        assert!(matches!(err, EngineError::ColumnNotFound { ref name } if name == "zzz"));
    }
}
