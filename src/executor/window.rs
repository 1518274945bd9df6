//! Partitioned, ordered window functions.
//!
//! Every call makes one partition and sort pass that all requested functions
//! share. Results are scattered back so the output keeps the input row order,
//! with one appended column per function.

use std::cmp::Ordering;
use std::fmt;
use std::mem::size_of;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, ArrowPrimitiveType, Float64Array, Int64Array, PrimitiveArray, UInt32Array,
};
use arrow::compute;
use arrow::datatypes::{Float64Type, Int64Type};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::batch::Batch;
use crate::config::ExecContext;
use crate::error::{EngineError, Result};
use crate::executor::keys::{group_rows, KeyColumns, TypedColumn};
use crate::executor::sort::{RowComparator, SortKey};
use crate::executor::BatchOperator;
use crate::expr::mean;

/// A function evaluated over each row's partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowFunction {
    /// 1-based position in sorted order.
    RowNumber,
    /// SQL `RANK`: ties share a rank, the next rank skips past them.
    Rank,
    /// Like `Rank` without gaps.
    DenseRank,
    /// Value `offset` rows earlier in the partition.
    Lag { column: String, offset: usize },
    /// Value `offset` rows later in the partition.
    Lead { column: String, offset: usize },
    RollingSum(String),
    RollingMean(String),
    RollingMin(String),
    RollingMax(String),
    CumSum(String),
    CumMax(String),
    CumMin(String),
    CumProd(String),
}

impl WindowFunction {
    pub fn lag(column: impl Into<String>, offset: usize) -> Self {
        WindowFunction::Lag {
            column: column.into(),
            offset,
        }
    }

    pub fn lead(column: impl Into<String>, offset: usize) -> Self {
        WindowFunction::Lead {
            column: column.into(),
            offset,
        }
    }

    /// Lowercase function name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            WindowFunction::RowNumber => "row_number",
            WindowFunction::Rank => "rank",
            WindowFunction::DenseRank => "dense_rank",
            WindowFunction::Lag { .. } => "lag",
            WindowFunction::Lead { .. } => "lead",
            WindowFunction::RollingSum(_) => "rolling_sum",
            WindowFunction::RollingMean(_) => "rolling_mean",
            WindowFunction::RollingMin(_) => "rolling_min",
            WindowFunction::RollingMax(_) => "rolling_max",
            WindowFunction::CumSum(_) => "cum_sum",
            WindowFunction::CumMax(_) => "cum_max",
            WindowFunction::CumMin(_) => "cum_min",
            WindowFunction::CumProd(_) => "cum_prod",
        }
    }

    /// The source column, if the function reads one.
    #[must_use]
    pub fn column(&self) -> Option<&str> {
        match self {
            WindowFunction::RowNumber | WindowFunction::Rank | WindowFunction::DenseRank => None,
            WindowFunction::Lag { column, .. } | WindowFunction::Lead { column, .. } => Some(column),
            WindowFunction::RollingSum(c)
            | WindowFunction::RollingMean(c)
            | WindowFunction::RollingMin(c)
            | WindowFunction::RollingMax(c)
            | WindowFunction::CumSum(c)
            | WindowFunction::CumMax(c)
            | WindowFunction::CumMin(c)
            | WindowFunction::CumProd(c) => Some(c),
        }
    }

    fn is_rolling(&self) -> bool {
        matches!(
            self,
            WindowFunction::RollingSum(_)
                | WindowFunction::RollingMean(_)
                | WindowFunction::RollingMin(_)
                | WindowFunction::RollingMax(_)
        )
    }

    /// Names the output column.
    pub fn alias(self, alias: impl Into<String>) -> WindowExpr {
        WindowExpr {
            function: self,
            alias: alias.into(),
        }
    }
}

impl fmt::Display for WindowFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowFunction::Lag { column, offset } | WindowFunction::Lead { column, offset } => {
                write!(f, "{}_{}_{}", column, self.name(), offset)
            }
            other => match other.column() {
                Some(column) => write!(f, "{}_{}", column, other.name()),
                None => f.write_str(other.name()),
            },
        }
    }
}

/// A window function and the name of the column it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowExpr {
    pub function: WindowFunction,
    pub alias: String,
}

impl From<WindowFunction> for WindowExpr {
    fn from(function: WindowFunction) -> Self {
        let alias = function.to_string();
        WindowExpr { function, alias }
    }
}

/// Partitioning, ordering and frame shared by a set of window functions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Window {
    partition_by: Vec<String>,
    order_by: Vec<SortKey>,
    frame_size: Option<usize>,
}

impl Window {
    /// One partition holding every row, in input order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn partition_by<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.partition_by = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn order_by<K: Into<SortKey>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.order_by = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Trailing frame size for the rolling functions.
    #[must_use]
    pub fn rows(mut self, frame_size: usize) -> Self {
        self.frame_size = Some(frame_size);
        self
    }

    /// Computes `exprs` and appends one column per expression.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty function list, a duplicate output
    /// name, or a rolling function without a positive frame size;
    /// `ColumnNotFound` for unknown columns; `TypeMismatch` when a sum, mean or
    /// product reads a non-numeric column.
    pub fn over(&self, ctx: &ExecContext, batch: &Batch, exprs: &[WindowExpr]) -> Result<Batch> {
        if exprs.is_empty() {
            return Err(EngineError::InvalidArgument(
                "window requires at least one function".into(),
            ));
        }
        self.check_aliases(batch, exprs)?;
        if self.frame_size == Some(0) {
            return Err(EngineError::InvalidArgument(
                "window frame size must be positive".into(),
            ));
        }
        let num_rows = batch.num_rows();
        if u32::try_from(num_rows).is_err() {
            return Err(EngineError::InvalidArgument(format!(
                "window input has {num_rows} rows, more than can be indexed"
            )));
        }

        let _reservation = ctx.reserve("window", num_rows * size_of::<usize>() * (2 + exprs.len()))?;
        let comparator = RowComparator::new(batch, &self.order_by)?;
        let mut partitions = if self.partition_by.is_empty() {
            vec![(0..num_rows).collect::<Vec<_>>()]
        } else {
            let keys = KeyColumns::new(batch, &self.partition_by, "window")?;
            group_rows(&keys, 0..num_rows, false)
        };
        if !self.order_by.is_empty() {
            for rows in &mut partitions {
                comparator.sort_rows(rows);
            }
        }
        debug!(
            rows = num_rows,
            partitions = partitions.len(),
            functions = exprs.len(),
            "computing window functions"
        );

        let pass = WindowPass {
            batch,
            partitions: &partitions,
            comparator: &comparator,
            frame_size: self.frame_size,
        };
        let columns = exprs
            .iter()
            .map(|expr| Ok((expr.alias.clone(), pass.evaluate(&expr.function)?)))
            .collect::<Result<Vec<_>>>()?;
        batch.append_columns(columns)
    }

    fn check_aliases(&self, batch: &Batch, exprs: &[WindowExpr]) -> Result<()> {
        let existing = batch.column_names();
        for (i, expr) in exprs.iter().enumerate() {
            let repeated = exprs[..i].iter().any(|e| e.alias == expr.alias);
            if repeated || existing.contains(&expr.alias) {
                return Err(EngineError::InvalidArgument(format!(
                    "duplicate window output column '{}'",
                    expr.alias
                )));
            }
        }
        Ok(())
    }
}

/// Sorted partitions of one batch, ready to evaluate functions against.
struct WindowPass<'a> {
    batch: &'a Batch,
    partitions: &'a [Vec<usize>],
    comparator: &'a RowComparator<'a>,
    frame_size: Option<usize>,
}

impl WindowPass<'_> {
    fn evaluate(&self, function: &WindowFunction) -> Result<ArrayRef> {
        let frame_size = match (function.is_rolling(), self.frame_size) {
            (true, None) => {
                return Err(EngineError::InvalidArgument(format!(
                    "{} requires a frame size",
                    function.name()
                )))
            }
            (_, size) => size.unwrap_or(usize::MAX),
        };
        let array = match function.column() {
            Some(name) => Some(self.batch.column_by_name(name)?),
            None => None,
        };
        let column = array.map(|a| TypedColumn::try_new(a, "window")).transpose()?;

        match (function, array, column) {
            (WindowFunction::RowNumber | WindowFunction::Rank | WindowFunction::DenseRank, _, _) => {
                Ok(Arc::new(self.ranking(function)))
            }
            (WindowFunction::Lag { offset, .. }, Some(array), _) => {
                let offset = *offset;
                self.gather(array, |rows, pos| pos.checked_sub(offset).map(|p| rows[p]))
            }
            (WindowFunction::Lead { offset, .. }, Some(array), _) => {
                let offset = *offset;
                self.gather(array, |rows, pos| rows.get(pos.checked_add(offset)?).copied())
            }
            (WindowFunction::RollingMin(_), Some(array), Some(column)) => self.gather(array, |rows, pos| {
                non_null_current(&column, rows, pos)?;
                extreme(&column, trailing(rows, pos, frame_size), Ordering::Less)
            }),
            (WindowFunction::RollingMax(_), Some(array), Some(column)) => self.gather(array, |rows, pos| {
                non_null_current(&column, rows, pos)?;
                extreme(&column, trailing(rows, pos, frame_size), Ordering::Greater)
            }),
            (WindowFunction::CumMin(_), Some(array), Some(column)) => {
                self.gather(array, running_extreme(column, Ordering::Less))
            }
            (WindowFunction::CumMax(_), Some(array), Some(column)) => {
                self.gather(array, running_extreme(column, Ordering::Greater))
            }
            (WindowFunction::RollingSum(_), _, Some(column)) => {
                self.rolling_sum(&column, frame_size)
            }
            (WindowFunction::RollingMean(_), _, Some(column)) => {
                require_numeric(&column, function)?;
                let values: Float64Array = self.scan::<Float64Type, _>(|rows, pos| {
                    non_null_current(&column, rows, pos)?;
                    let frame: Vec<f64> = trailing(rows, pos, frame_size)
                        .iter()
                        .filter(|&&r| !column.is_null(r))
                        .filter_map(|&r| number(&column, r))
                        .collect();
                    mean(&frame)
                });
                Ok(Arc::new(values))
            }
            (WindowFunction::CumSum(_), _, Some(column)) => self.running_fold(&column, function, 0, 0.0),
            (WindowFunction::CumProd(_), _, Some(column)) => self.running_fold(&column, function, 1, 1.0),
            _ => Err(EngineError::UnsupportedOperation(format!(
                "window function {} is missing its source column",
                function.name()
            ))),
        }
    }

    fn ranking(&self, function: &WindowFunction) -> Int64Array {
        let mut out = vec![0i64; self.batch.num_rows()];
        for rows in self.partitions {
            let mut rank = 0i64;
            let mut dense = 0i64;
            for (pos, &row) in rows.iter().enumerate() {
                let tied = pos > 0 && self.comparator.compare(rows[pos - 1], row) == Ordering::Equal;
                if !tied {
                    rank = pos as i64 + 1;
                    dense += 1;
                }
                out[row] = match function {
                    WindowFunction::Rank => rank,
                    WindowFunction::DenseRank => dense,
                    _ => pos as i64 + 1,
                };
            }
        }
        Int64Array::from(out)
    }

    /// Builds a column whose value at each row is copied from the row `pick`
    /// returns, or null when it returns `None`.
    fn gather<F>(&self, array: &ArrayRef, mut pick: F) -> Result<ArrayRef>
    where
        F: FnMut(&[usize], usize) -> Option<usize>,
    {
        let mut indices: Vec<Option<u32>> = vec![None; self.batch.num_rows()];
        for rows in self.partitions {
            for pos in 0..rows.len() {
                indices[rows[pos]] = pick(rows, pos).map(|r| r as u32);
            }
        }
        Ok(compute::take(array.as_ref(), &UInt32Array::from(indices), None)?)
    }

    /// Builds a primitive column from a per-position computation.
    fn scan<T, F>(&self, mut value_at: F) -> PrimitiveArray<T>
    where
        T: ArrowPrimitiveType,
        F: FnMut(&[usize], usize) -> Option<T::Native>,
    {
        let mut out: Vec<Option<T::Native>> = vec![None; self.batch.num_rows()];
        for rows in self.partitions {
            for pos in 0..rows.len() {
                out[rows[pos]] = value_at(rows, pos);
            }
        }
        out.into_iter().collect()
    }

    fn rolling_sum(&self, column: &TypedColumn<'_>, frame_size: usize) -> Result<ArrayRef> {
        Ok(match column {
            TypedColumn::Int64(a) => Arc::new(self.scan::<Int64Type, _>(|rows, pos| {
                non_null_current(column, rows, pos)?;
                Some(
                    trailing(rows, pos, frame_size)
                        .iter()
                        .filter(|&&r| a.is_valid(r))
                        .fold(0i64, |acc, &r| acc.wrapping_add(a.value(r))),
                )
            })),
            TypedColumn::Float64(a) => Arc::new(self.scan::<Float64Type, _>(|rows, pos| {
                non_null_current(column, rows, pos)?;
                Some(
                    trailing(rows, pos, frame_size)
                        .iter()
                        .filter(|&&r| a.is_valid(r))
                        .map(|&r| a.value(r))
                        .sum(),
                )
            })),
            other => return Err(not_numeric(other, "rolling_sum")),
        })
    }

    /// Cumulative sum or product from the partition start.
    ///
    /// Null rows output null and leave the running value untouched.
    fn running_fold(
        &self,
        column: &TypedColumn<'_>,
        function: &WindowFunction,
        int_identity: i64,
        float_identity: f64,
    ) -> Result<ArrayRef> {
        let product = matches!(function, WindowFunction::CumProd(_));
        Ok(match column {
            TypedColumn::Int64(a) => {
                let mut acc = int_identity;
                Arc::new(self.scan::<Int64Type, _>(|rows, pos| {
                    if pos == 0 {
                        acc = int_identity;
                    }
                    let row = non_null_current(column, rows, pos)?;
                    acc = if product {
                        acc.wrapping_mul(a.value(row))
                    } else {
                        acc.wrapping_add(a.value(row))
                    };
                    Some(acc)
                }))
            }
            TypedColumn::Float64(a) => {
                let mut acc = float_identity;
                Arc::new(self.scan::<Float64Type, _>(|rows, pos| {
                    if pos == 0 {
                        acc = float_identity;
                    }
                    let row = non_null_current(column, rows, pos)?;
                    acc = if product {
                        acc * a.value(row)
                    } else {
                        acc + a.value(row)
                    };
                    Some(acc)
                }))
            }
            other => return Err(not_numeric(other, function.name())),
        })
    }
}

/// The trailing frame ending at `pos`, clipped at the partition start.
fn trailing(rows: &[usize], pos: usize, size: usize) -> &[usize] {
    &rows[(pos + 1).saturating_sub(size)..=pos]
}

/// The current row, or `None` if its value is null.
fn non_null_current(column: &TypedColumn<'_>, rows: &[usize], pos: usize) -> Option<usize> {
    let row = rows[pos];
    (!column.is_null(row)).then_some(row)
}

/// The non-null row whose value is furthest in direction `want`; first wins on ties.
fn extreme(column: &TypedColumn<'_>, rows: &[usize], want: Ordering) -> Option<usize> {
    rows.iter()
        .copied()
        .filter(|&r| !column.is_null(r))
        .reduce(|best, r| if column.cmp_values(r, best) == want { r } else { best })
}

fn running_extreme(
    column: TypedColumn<'_>,
    want: Ordering,
) -> impl FnMut(&[usize], usize) -> Option<usize> + '_ {
    let mut best: Option<usize> = None;
    move |rows, pos| {
        if pos == 0 {
            best = None;
        }
        let row = non_null_current(&column, rows, pos)?;
        best = match best {
            Some(b) if column.cmp_values(row, b) != want => Some(b),
            _ => Some(row),
        };
        best
    }
}

fn number(column: &TypedColumn<'_>, row: usize) -> Option<f64> {
    match column {
        TypedColumn::Int64(a) => Some(a.value(row) as f64),
        TypedColumn::Float64(a) => Some(a.value(row)),
        _ => None,
    }
}

fn require_numeric(column: &TypedColumn<'_>, function: &WindowFunction) -> Result<()> {
    if column.data_type().is_numeric() {
        Ok(())
    } else {
        Err(not_numeric(column, function.name()))
    }
}

fn not_numeric(column: &TypedColumn<'_>, function: &str) -> EngineError {
    EngineError::type_mismatch(
        format!("window {function}"),
        "numeric",
        column.data_type().to_string(),
    )
}

/// Window operator over a fixed set of functions.
#[derive(Debug, Clone)]
pub struct WindowOperator {
    window: Window,
    exprs: Vec<WindowExpr>,
}

impl WindowOperator {
    /// Creates a new window operator.
    #[must_use]
    pub fn new(window: Window, exprs: Vec<WindowExpr>) -> Self {
        WindowOperator { window, exprs }
    }
}

impl BatchOperator for WindowOperator {
    fn execute(&self, ctx: &ExecContext, input: &Batch) -> Result<Batch> {
        self.window.over(ctx, input, &self.exprs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, StringArray};

    fn trades() -> Batch {
        Batch::try_from_iter(vec![
            (
                "sym",
                Arc::new(StringArray::from(vec!["b", "a", "b", "a", "a", "b"])) as ArrayRef,
            ),
            (
                "t",
                Arc::new(Int64Array::from(vec![3, 2, 1, 1, 3, 2])) as ArrayRef,
            ),
            (
                "px",
                Arc::new(Int64Array::from(vec![Some(30), Some(20), Some(10), Some(10), None, Some(20)]))
                    as ArrayRef,
            ),
        ])
        .unwrap()
    }

    fn ints(batch: &Batch, name: &str) -> Vec<Option<i64>> {
        batch
            .column_by_name(name)
            .unwrap()
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap()
            .iter()
            .collect()
    }

    fn by_symbol() -> Window {
        Window::new().partition_by(["sym"]).order_by(["t"])
    }

    #[test]
    fn test_row_number_scattered_back() {
        let ctx = ExecContext::default();
        let out = by_symbol()
            .over(&ctx, &trades(), &[WindowFunction::RowNumber.into()])
            .unwrap();
        assert_eq!(out.column_names(), vec!["sym", "t", "px", "row_number"]);
        assert_eq!(
            ints(&out, "row_number"),
            vec![Some(3), Some(2), Some(1), Some(1), Some(3), Some(2)]
        );
    }

    #[test]
    fn test_rank_and_dense_rank() {
        let ctx = ExecContext::default();
        let batch = Batch::try_from_iter(vec![(
            "score",
            Arc::new(Int64Array::from(vec![50, 70, 50, 90, 70])) as ArrayRef,
        )])
        .unwrap();
        let out = Window::new()
            .order_by([SortKey::desc("score")])
            .over(
                &ctx,
                &batch,
                &[WindowFunction::Rank.into(), WindowFunction::DenseRank.into()],
            )
            .unwrap();
        assert_eq!(ints(&out, "rank"), vec![Some(4), Some(2), Some(4), Some(1), Some(2)]);
        assert_eq!(ints(&out, "dense_rank"), vec![Some(3), Some(2), Some(3), Some(1), Some(2)]);
    }

    #[test]
    fn test_lag_and_lead_stay_in_partition() {
        let ctx = ExecContext::default();
        let out = by_symbol()
            .over(
                &ctx,
                &trades(),
                &[WindowFunction::lag("px", 1).into(), WindowFunction::lead("px", 1).into()],
            )
            .unwrap();
        assert_eq!(
            ints(&out, "px_lag_1"),
            vec![Some(20), Some(10), None, None, Some(20), Some(10)]
        );
        assert_eq!(
            ints(&out, "px_lead_1"),
            vec![None, None, Some(20), Some(20), None, Some(30)]
        );
    }

    #[test]
    fn test_rolling_sum_clips_at_partition_start() {
        let ctx = ExecContext::default();
        let batch = Batch::try_from_iter(vec![(
            "v",
            Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5])) as ArrayRef,
        )])
        .unwrap();
        let out = Window::new()
            .rows(3)
            .over(
                &ctx,
                &batch,
                &[
                    WindowFunction::RollingSum("v".into()).into(),
                    WindowFunction::RollingMax("v".into()).into(),
                ],
            )
            .unwrap();
        assert_eq!(
            ints(&out, "v_rolling_sum"),
            vec![Some(1), Some(3), Some(6), Some(9), Some(12)]
        );
        assert_eq!(
            ints(&out, "v_rolling_max"),
            vec![Some(1), Some(2), Some(3), Some(4), Some(5)]
        );
    }

    #[test]
    fn test_cumulative_skips_nulls_and_continues() {
        let ctx = ExecContext::default();
        let out = by_symbol()
            .over(
                &ctx,
                &trades(),
                &[
                    WindowFunction::CumSum("px".into()).into(),
                    WindowFunction::CumMax("px".into()).into(),
                ],
            )
            .unwrap();
        // a: t=1 px=10, t=2 px=20, t=3 null; b: t=1 10, t=2 20, t=3 30
        assert_eq!(
            ints(&out, "px_cum_sum"),
            vec![Some(60), Some(30), Some(10), Some(10), None, Some(30)]
        );
        assert_eq!(
            ints(&out, "px_cum_max"),
            vec![Some(30), Some(20), Some(10), Some(10), None, Some(20)]
        );
    }

    #[test]
    fn test_rolling_mean_and_cum_prod_floats() {
        let ctx = ExecContext::default();
        let batch = Batch::try_from_iter(vec![(
            "x",
            Arc::new(Float64Array::from(vec![Some(2.0), None, Some(4.0), Some(0.5)])) as ArrayRef,
        )])
        .unwrap();
        let out = Window::new()
            .rows(2)
            .over(
                &ctx,
                &batch,
                &[
                    WindowFunction::RollingMean("x".into()).alias("avg"),
                    WindowFunction::CumProd("x".into()).alias("prod"),
                ],
            )
            .unwrap();
        let avg = out.column_by_name("avg").unwrap().as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(avg.iter().collect::<Vec<_>>(), vec![Some(2.0), None, Some(4.0), Some(2.25)]);
        let prod = out.column_by_name("prod").unwrap().as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(prod.iter().collect::<Vec<_>>(), vec![Some(2.0), None, Some(8.0), Some(4.0)]);
    }

    #[test]
    fn test_window_argument_errors() {
        let ctx = ExecContext::default();
        let rolling: WindowExpr = WindowFunction::RollingSum("px".into()).into();
        let err = Window::new().over(&ctx, &trades(), &[rolling.clone()]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
        let err = Window::new().rows(0).over(&ctx, &trades(), &[rolling]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
        let err = Window::new().over(&ctx, &trades(), &[]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
        let err = Window::new()
            .over(&ctx, &trades(), &[WindowFunction::RowNumber.alias("px")])
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
        let err = Window::new()
            .over(&ctx, &trades(), &[WindowFunction::CumSum("sym".into()).into()])
            .unwrap_err();
        assert!(matches!(err, EngineError::TypeMismatch { .. }));
    }

    #[test]
    fn test_window_operator_on_empty_batch() {
        let ctx = ExecContext::default();
        let empty = trades().slice(0, 0);
        let op = WindowOperator::new(by_symbol(), vec![WindowFunction::RowNumber.into()]);
        let out = op.execute(&ctx, &empty).unwrap();
        assert_eq!(out.num_rows(), 0);
        assert_eq!(out.num_columns(), 4);
    }
}
