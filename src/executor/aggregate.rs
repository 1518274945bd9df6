//! Hash grouping and per-group aggregation.
//!
//! Rows are grouped by typed key equality. Rows with a null in any group
//! column are dropped. Output groups are ordered by the string form of
//! their key values, compared column by column.

use std::fmt;
use std::mem::size_of;
use std::str::FromStr;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, UInt32Array};
use arrow::compute;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::batch::Batch;
use crate::config::ExecContext;
use crate::error::{EngineError, Result};
use crate::executor::keys::{count_distinct, group_rows, KeyColumns, TypedColumn};
use crate::executor::BatchOperator;
use crate::expr::{mean, sample_variance};

/// Per-group reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateFunction {
    Sum,
    Mean,
    Count,
    Min,
    Max,
    /// First non-null member value.
    First,
    /// Last non-null member value.
    Last,
    /// Sample standard deviation.
    Std,
    /// Sample variance.
    Var,
    Median,
    /// Number of distinct non-null values.
    NUnique,
}

impl AggregateFunction {
    /// Lower-case name used in default aliases.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Mean => "mean",
            AggregateFunction::Count => "count",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::First => "first",
            AggregateFunction::Last => "last",
            AggregateFunction::Std => "std",
            AggregateFunction::Var => "var",
            AggregateFunction::Median => "median",
            AggregateFunction::NUnique => "nunique",
        }
    }

    fn requires_numeric(self) -> bool {
        !matches!(
            self,
            AggregateFunction::Count
                | AggregateFunction::First
                | AggregateFunction::Last
                | AggregateFunction::NUnique
        )
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggregateFunction {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Ok(AggregateFunction::Sum),
            "mean" | "avg" => Ok(AggregateFunction::Mean),
            "count" => Ok(AggregateFunction::Count),
            "min" => Ok(AggregateFunction::Min),
            "max" => Ok(AggregateFunction::Max),
            "first" => Ok(AggregateFunction::First),
            "last" => Ok(AggregateFunction::Last),
            "std" | "stddev" => Ok(AggregateFunction::Std),
            "var" | "variance" => Ok(AggregateFunction::Var),
            "median" => Ok(AggregateFunction::Median),
            "nunique" | "n_unique" => Ok(AggregateFunction::NUnique),
            other => Err(EngineError::UnsupportedOperation(format!(
                "unknown aggregation '{other}'"
            ))),
        }
    }
}

/// One requested aggregation: source column, function and output name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub column: String,
    pub function: AggregateFunction,
    pub alias: String,
}

impl Aggregation {
    /// Creates an aggregation aliased `{column}_{function}`.
    pub fn new(column: impl Into<String>, function: AggregateFunction) -> Self {
        let column = column.into();
        let alias = format!("{column}_{}", function.name());
        Aggregation {
            column,
            function,
            alias,
        }
    }

    /// Parses the function by name.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` for an unknown function name.
    pub fn parse(column: impl Into<String>, function: &str) -> Result<Self> {
        Ok(Self::new(column, function.parse()?))
    }

    /// Sets the output column name.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn sum(column: impl Into<String>) -> Self {
        Self::new(column, AggregateFunction::Sum)
    }

    pub fn mean(column: impl Into<String>) -> Self {
        Self::new(column, AggregateFunction::Mean)
    }

    pub fn count(column: impl Into<String>) -> Self {
        Self::new(column, AggregateFunction::Count)
    }

    pub fn min(column: impl Into<String>) -> Self {
        Self::new(column, AggregateFunction::Min)
    }

    pub fn max(column: impl Into<String>) -> Self {
        Self::new(column, AggregateFunction::Max)
    }
}

/// Group-by columns; call [`GroupBy::agg`] to produce a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBy {
    columns: Vec<String>,
}

impl GroupBy {
    /// Groups by the named columns.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        GroupBy {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Group column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Computes `aggregations` per group.
    ///
    /// The output holds the group columns (values from each group's first
    /// row) followed by one column per aggregation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` with no group columns, no aggregations or
    /// an alias that repeats a group column or an earlier alias,
    /// `ColumnNotFound` for unknown columns and `TypeMismatch` when a numeric
    /// aggregation targets a non-numeric column.
    pub fn agg(&self, ctx: &ExecContext, batch: &Batch, aggregations: &[Aggregation]) -> Result<Batch> {
        if self.columns.is_empty() {
            return Err(EngineError::InvalidArgument("group by requires at least one column".into()));
        }
        if aggregations.is_empty() {
            return Err(EngineError::InvalidArgument("agg requires at least one aggregation".into()));
        }
        for (i, agg) in aggregations.iter().enumerate() {
            let repeated = aggregations[..i].iter().any(|a| a.alias == agg.alias);
            if repeated || self.columns.contains(&agg.alias) {
                return Err(EngineError::InvalidArgument(format!(
                    "duplicate aggregation output column '{}'",
                    agg.alias
                )));
            }
        }
        let keys = KeyColumns::new(batch, &self.columns, "group_by")?;
        let sources = aggregations
            .iter()
            .map(|agg| {
                let column = TypedColumn::try_new(batch.column_by_name(&agg.column)?, agg.function.name())?;
                if agg.function.requires_numeric() && !column.data_type().is_numeric() {
                    return Err(EngineError::type_mismatch(
                        agg.function.name(),
                        "numeric",
                        column.data_type().name(),
                    ));
                }
                Ok(column)
            })
            .collect::<Result<Vec<_>>>()?;

        let _reservation = ctx.reserve("group_by", batch.num_rows() * size_of::<usize>() * 2)?;
        let groups = group_rows(&keys, 0..batch.num_rows(), true);
        let mut ordered = groups
            .into_iter()
            .map(|members| Ok((keys.display_key(members[0])?, members)))
            .collect::<Result<Vec<_>>>()?;
        ordered.sort_by(|(a, ma), (b, mb)| a.cmp(b).then(ma[0].cmp(&mb[0])));
        debug!(
            rows = batch.num_rows(),
            groups = ordered.len(),
            aggregations = aggregations.len(),
            "grouped batch"
        );

        let first_rows: UInt32Array = ordered.iter().map(|(_, m)| m[0] as u32).collect();
        let mut output = batch.select(&self.columns)?.take(&first_rows)?;
        let members: Vec<&[usize]> = ordered.iter().map(|(_, m)| m.as_slice()).collect();
        let mut columns = Vec::with_capacity(aggregations.len());
        for (agg, source) in aggregations.iter().zip(&sources) {
            let array = aggregate(agg.function, source, batch.column_by_name(&agg.column)?, &members)?;
            columns.push((agg.alias.clone(), array));
        }
        output = output.append_columns(columns)?;
        Ok(output)
    }
}

/// Operator form of a group-by with its aggregations.
#[derive(Debug, Clone)]
pub struct AggregateOperator {
    group_by: GroupBy,
    aggregations: Vec<Aggregation>,
}

impl AggregateOperator {
    /// Creates a new aggregate operator.
    #[must_use]
    pub fn new(group_by: GroupBy, aggregations: Vec<Aggregation>) -> Self {
        AggregateOperator {
            group_by,
            aggregations,
        }
    }
}

impl BatchOperator for AggregateOperator {
    fn execute(&self, ctx: &ExecContext, input: &Batch) -> Result<Batch> {
        self.group_by.agg(ctx, input, &self.aggregations)
    }
}

fn valid_rows<'a>(column: &'a TypedColumn<'a>, rows: &'a [usize]) -> impl Iterator<Item = usize> + 'a {
    rows.iter().copied().filter(move |&r| !column.is_null(r))
}

fn float_values(column: &TypedColumn<'_>, rows: &[usize]) -> Vec<f64> {
    valid_rows(column, rows)
        .filter_map(|r| match column {
            TypedColumn::Int64(a) => Some(a.value(r) as f64),
            TypedColumn::Float64(a) => Some(a.value(r)),
            _ => None,
        })
        .collect()
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// Picks one member row per group and gathers it from `array`.
fn pick_rows<F>(array: &ArrayRef, groups: &[&[usize]], mut pick: F) -> Result<ArrayRef>
where
    F: FnMut(&[usize]) -> Option<usize>,
{
    let indices: UInt32Array = groups
        .iter()
        .map(|rows| pick(rows).map(|r| r as u32))
        .collect();
    Ok(compute::take(array.as_ref(), &indices, None)?)
}

fn aggregate(
    function: AggregateFunction,
    column: &TypedColumn<'_>,
    array: &ArrayRef,
    groups: &[&[usize]],
) -> Result<ArrayRef> {
    let out: ArrayRef = match function {
        AggregateFunction::Count => Arc::new(Int64Array::from_iter_values(
            groups.iter().map(|rows| valid_rows(column, rows).count() as i64),
        )),
        AggregateFunction::NUnique => Arc::new(Int64Array::from_iter_values(
            groups.iter().map(|rows| count_distinct(*column, rows) as i64),
        )),
        AggregateFunction::Sum => match column {
            TypedColumn::Int64(a) => Arc::new(Int64Array::from_iter_values(groups.iter().map(|rows| {
                valid_rows(column, rows).fold(0i64, |acc, r| acc.wrapping_add(a.value(r)))
            }))),
            _ => Arc::new(Float64Array::from_iter_values(
                groups.iter().map(|rows| float_values(column, rows).iter().sum::<f64>()),
            )),
        },
        AggregateFunction::Min => pick_rows(array, groups, |rows| {
            valid_rows(column, rows).reduce(|best, r| {
                if column.cmp_values(r, best).is_lt() {
                    r
                } else {
                    best
                }
            })
        })?,
        AggregateFunction::Max => pick_rows(array, groups, |rows| {
            valid_rows(column, rows).reduce(|best, r| {
                if column.cmp_values(r, best).is_gt() {
                    r
                } else {
                    best
                }
            })
        })?,
        AggregateFunction::First => pick_rows(array, groups, |rows| valid_rows(column, rows).next())?,
        AggregateFunction::Last => pick_rows(array, groups, |rows| valid_rows(column, rows).last())?,
        AggregateFunction::Mean => Arc::new(Float64Array::from(
            groups
                .iter()
                .map(|rows| mean(&float_values(column, rows)))
                .collect::<Vec<_>>(),
        )),
        AggregateFunction::Var | AggregateFunction::Std => Arc::new(Float64Array::from(
            groups
                .iter()
                .map(|rows| {
                    let variance = sample_variance(&float_values(column, rows));
                    if function == AggregateFunction::Std {
                        variance.map(f64::sqrt)
                    } else {
                        variance
                    }
                })
                .collect::<Vec<_>>(),
        )),
        AggregateFunction::Median => Arc::new(Float64Array::from(
            groups
                .iter()
                .map(|rows| median(float_values(column, rows)))
                .collect::<Vec<_>>(),
        )),
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, StringArray};

    fn sales() -> Batch {
        Batch::try_from_iter(vec![
            (
                "category",
                Arc::new(StringArray::from(vec![
                    Some("B"),
                    Some("A"),
                    Some("B"),
                    Some("A"),
                    None,
                    Some("C"),
                ])) as ArrayRef,
            ),
            (
                "amount",
                Arc::new(Int64Array::from(vec![Some(15), Some(10), Some(25), None, Some(99), Some(5)]))
                    as ArrayRef,
            ),
            (
                "price",
                Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])) as ArrayRef,
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

    fn floats(batch: &Batch, name: &str) -> Vec<Option<f64>> {
        batch
            .column_by_name(name)
            .unwrap()
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap()
            .iter()
            .collect()
    }

    #[test]
    fn test_groups_sorted_and_null_keys_dropped() {
        let ctx = ExecContext::default();
        let out = GroupBy::new(["category"])
            .agg(&ctx, &sales(), &[Aggregation::sum("amount"), Aggregation::count("amount")])
            .unwrap();
        assert_eq!(out.column_names(), vec!["category", "amount_sum", "amount_count"]);
        let keys = out.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(keys.iter().collect::<Vec<_>>(), vec![Some("A"), Some("B"), Some("C")]);
        assert_eq!(ints(&out, "amount_sum"), vec![Some(10), Some(40), Some(5)]);
        assert_eq!(ints(&out, "amount_count"), vec![Some(1), Some(2), Some(1)]);
    }

    #[test]
    fn test_mean_min_max() {
        let ctx = ExecContext::default();
        let out = GroupBy::new(["category"])
            .agg(
                &ctx,
                &sales(),
                &[
                    Aggregation::mean("price").alias("avg_price"),
                    Aggregation::min("amount"),
                    Aggregation::max("price"),
                ],
            )
            .unwrap();
        assert_eq!(floats(&out, "avg_price"), vec![Some(3.0), Some(2.0), Some(6.0)]);
        assert_eq!(ints(&out, "amount_min"), vec![Some(10), Some(15), Some(5)]);
        assert_eq!(floats(&out, "price_max"), vec![Some(4.0), Some(3.0), Some(6.0)]);
    }

    #[test]
    fn test_mean_of_all_null_group_is_null() {
        let ctx = ExecContext::default();
        let batch = Batch::try_from_iter(vec![
            ("k", Arc::new(Int64Array::from(vec![1, 1])) as ArrayRef),
            ("v", Arc::new(Float64Array::from(vec![None, None])) as ArrayRef),
        ])
        .unwrap();
        let out = GroupBy::new(["k"])
            .agg(&ctx, &batch, &[Aggregation::mean("v"), Aggregation::sum("v")])
            .unwrap();
        assert_eq!(floats(&out, "v_mean"), vec![None]);
        assert_eq!(floats(&out, "v_sum"), vec![Some(0.0)]);
    }

    #[test]
    fn test_extended_aggregations() {
        let ctx = ExecContext::default();
        let out = GroupBy::new(["category"])
            .agg(
                &ctx,
                &sales(),
                &[
                    Aggregation::new("amount", AggregateFunction::First),
                    Aggregation::new("amount", AggregateFunction::Last),
                    Aggregation::new("price", AggregateFunction::Median),
                    Aggregation::new("price", AggregateFunction::Var),
                    Aggregation::new("category", AggregateFunction::NUnique),
                ],
            )
            .unwrap();
        assert_eq!(ints(&out, "amount_first"), vec![Some(10), Some(15), Some(5)]);
        assert_eq!(ints(&out, "amount_last"), vec![Some(10), Some(25), Some(5)]);
        assert_eq!(floats(&out, "price_median"), vec![Some(3.0), Some(2.0), Some(6.0)]);
        assert_eq!(floats(&out, "price_var"), vec![Some(2.0), Some(2.0), None]);
        assert_eq!(ints(&out, "category_nunique"), vec![Some(1), Some(1), Some(1)]);
    }

    #[test]
    fn test_numeric_aggregation_on_strings_fails() {
        let ctx = ExecContext::default();
        let err = GroupBy::new(["amount"])
            .agg(&ctx, &sales(), &[Aggregation::sum("category")])
            .unwrap_err();
        assert!(matches!(err, EngineError::TypeMismatch { .. }));
    }

    #[test]
    fn test_argument_errors() {
        let ctx = ExecContext::default();
        let no_groups: [&str; 0] = [];
        assert!(matches!(
            GroupBy::new(no_groups).agg(&ctx, &sales(), &[Aggregation::sum("amount")]),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(matches!(
            GroupBy::new(["category"]).agg(&ctx, &sales(), &[]),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(matches!(
            GroupBy::new(["missing"]).agg(&ctx, &sales(), &[Aggregation::sum("amount")]),
            Err(EngineError::ColumnNotFound { .. })
        ));
        assert!(matches!(
            Aggregation::parse("amount", "mode"),
            Err(EngineError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_colliding_aliases_rejected() {
        let ctx = ExecContext::default();
        let err = GroupBy::new(["category"])
            .agg(&ctx, &sales(), &[Aggregation::sum("amount").alias("category")])
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(msg) if msg.contains("'category'")));

        let err = GroupBy::new(["category"])
            .agg(
                &ctx,
                &sales(),
                &[Aggregation::sum("amount").alias("total"), Aggregation::sum("price").alias("total")],
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));

        let out = GroupBy::new(["category"])
            .agg(&ctx, &sales(), &[Aggregation::sum("amount"), Aggregation::sum("price")])
            .unwrap();
        assert_eq!(out.column_names(), vec!["category", "amount_sum", "price_sum"]);
    }

    #[test]
    fn test_multi_column_keys_order_by_string_form() {
        let ctx = ExecContext::default();
        let batch = Batch::try_from_iter(vec![
            ("a", Arc::new(Int64Array::from(vec![9, 10, 9, 10])) as ArrayRef),
            ("b", Arc::new(StringArray::from(vec!["y", "x", "x", "x"])) as ArrayRef),
            ("v", Arc::new(Int64Array::from(vec![1, 2, 3, 4])) as ArrayRef),
        ])
        .unwrap();
        let out = GroupBy::new(["a", "b"])
            .agg(&ctx, &batch, &[Aggregation::sum("v")])
            .unwrap();
        assert_eq!(ints(&out, "a"), vec![Some(10), Some(9), Some(9)]);
        assert_eq!(ints(&out, "v_sum"), vec![Some(6), Some(3), Some(1)]);
    }
}
