//! Column projection, row limits and de-duplication.

use std::mem::size_of;

use arrow::array::UInt32Array;
use tracing::debug;

use crate::batch::Batch;
use crate::config::ExecContext;
use crate::error::Result;
use crate::executor::keys::{group_rows, KeyColumns};
use crate::executor::BatchOperator;
use crate::expr::{evaluate, Expr};

/// A change to the set of columns in a batch.
#[derive(Debug, Clone)]
pub enum Projection {
    /// Keep only these columns, in this order.
    Select(Vec<String>),
    /// Remove these columns.
    Drop(Vec<String>),
    /// Rename a column.
    Rename { from: String, to: String },
    /// Evaluate an expression into a named column, replacing one of the same name.
    WithColumn { name: String, expr: Expr },
}

/// Project operator for column-level changes.
#[derive(Debug, Clone)]
pub struct ProjectOperator {
    projection: Projection,
}

impl ProjectOperator {
    /// Creates a new project operator.
    #[must_use]
    pub fn new(projection: Projection) -> Self {
        ProjectOperator { projection }
    }
}

impl BatchOperator for ProjectOperator {
    fn execute(&self, ctx: &ExecContext, input: &Batch) -> Result<Batch> {
        match &self.projection {
            Projection::Select(names) => input.select(names),
            Projection::Drop(names) => input.drop_columns(names),
            Projection::Rename { from, to } => input.rename(from, to),
            Projection::WithColumn { name, expr } => {
                let column = evaluate(ctx, expr, input)?;
                input.with_column(name, column)
            }
        }
    }
}

/// Keeps at most `len` rows starting at `offset`; both are clamped.
#[derive(Debug, Clone, Copy)]
pub struct LimitOperator {
    offset: usize,
    len: usize,
}

impl LimitOperator {
    /// First `n` rows.
    #[must_use]
    pub fn head(n: usize) -> Self {
        LimitOperator { offset: 0, len: n }
    }

    /// `len` rows starting at `offset`.
    #[must_use]
    pub fn slice(offset: usize, len: usize) -> Self {
        LimitOperator { offset, len }
    }
}

impl BatchOperator for LimitOperator {
    fn execute(&self, _ctx: &ExecContext, input: &Batch) -> Result<Batch> {
        Ok(input.slice(self.offset, self.len))
    }
}

/// Keeps the first occurrence of each fully-equal row; nulls equal nulls.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistinctOperator;

impl BatchOperator for DistinctOperator {
    fn execute(&self, ctx: &ExecContext, input: &Batch) -> Result<Batch> {
        let names = input.column_names();
        let keys = KeyColumns::new(input, &names, "distinct")?;
        let _reservation = ctx.reserve("distinct", input.num_rows() * size_of::<usize>() * 2)?;
        let groups = group_rows(&keys, 0..input.num_rows(), false);
        debug!(input_rows = input.num_rows(), distinct_rows = groups.len(), "deduplicated batch");
        let indices: UInt32Array = groups.iter().map(|g| g[0] as u32).collect();
        input.take(&indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{col, lit};
    use arrow::array::{Array, ArrayRef, Int64Array, StringArray};
    use std::sync::Arc;

    fn batch() -> Batch {
        Batch::try_from_iter(vec![
            (
                "a",
                Arc::new(Int64Array::from(vec![Some(1), Some(1), None, None, Some(2)])) as ArrayRef,
            ),
            (
                "b",
                Arc::new(StringArray::from(vec!["x", "x", "y", "y", "x"])) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_with_column_replaces_in_place() {
        let ctx = ExecContext::default();
        let op = ProjectOperator::new(Projection::WithColumn {
            name: "a".into(),
            expr: col("a").mul(lit(10)),
        });
        let out = op.execute(&ctx, &batch()).unwrap();
        assert_eq!(out.column_names(), vec!["a", "b"]);
        let a = out.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(a.value(4), 20);
    }

    #[test]
    fn test_drop_and_rename() {
        let ctx = ExecContext::default();
        let out = ProjectOperator::new(Projection::Drop(vec!["a".into()]))
            .execute(&ctx, &batch())
            .unwrap();
        assert_eq!(out.column_names(), vec!["b"]);
        let out = ProjectOperator::new(Projection::Rename {
            from: "b".into(),
            to: "c".into(),
        })
        .execute(&ctx, &batch())
        .unwrap();
        assert_eq!(out.column_names(), vec!["a", "c"]);
    }

    #[test]
    fn test_limit_is_clamped() {
        let ctx = ExecContext::default();
        assert_eq!(LimitOperator::head(2).execute(&ctx, &batch()).unwrap().num_rows(), 2);
        assert_eq!(LimitOperator::slice(3, 10).execute(&ctx, &batch()).unwrap().num_rows(), 2);
        assert_eq!(LimitOperator::slice(9, 1).execute(&ctx, &batch()).unwrap().num_rows(), 0);
    }

    #[test]
    fn test_distinct_keeps_first_occurrence() {
        let ctx = ExecContext::default();
        let out = DistinctOperator.execute(&ctx, &batch()).unwrap();
        assert_eq!(out.num_rows(), 3);
        let a = out.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![Some(1), None, Some(2)]);
    }
}
