//! Chainable `DataFrame` facade.
//!
//! A frame carries either a batch or the first error raised while building
//! it. Every chained call on an errored frame returns that error unchanged,
//! so a pipeline can be written end to end and checked once with
//! [`DataFrame::collect`].

use std::sync::Arc;

use arrow::array::ArrayRef;

use crate::batch::Batch;
use crate::config::ExecContext;
use crate::error::{EngineError, Result};
use crate::executor::{
    filter, join_on, Aggregation, BatchOperator, DistinctOperator, GroupBy, JoinType, LimitOperator,
    ProjectOperator, Projection, SortKey, SortOperator, Window, WindowExpr,
};
use crate::expr::{evaluate, Expr};

/// A batch, or the error that stopped its pipeline.
#[derive(Debug)]
pub struct DataFrame {
    ctx: Arc<ExecContext>,
    state: Result<Batch>,
}

impl DataFrame {
    /// Wraps a batch with a default execution context.
    #[must_use]
    pub fn new(batch: Batch) -> Self {
        Self::with_context(Arc::new(ExecContext::default()), batch)
    }

    /// Wraps a batch with a shared execution context.
    #[must_use]
    pub fn with_context(ctx: Arc<ExecContext>, batch: Batch) -> Self {
        DataFrame { ctx, state: Ok(batch) }
    }

    /// Builds a frame from named columns; a construction error becomes sticky.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, ArrayRef)>,
        S: Into<String>,
    {
        DataFrame {
            ctx: Arc::new(ExecContext::default()),
            state: Batch::try_from_iter(columns),
        }
    }

    /// A frame that already carries `error`.
    #[must_use]
    pub fn from_error(ctx: Arc<ExecContext>, error: EngineError) -> Self {
        DataFrame { ctx, state: Err(error) }
    }

    #[must_use]
    pub fn context(&self) -> &Arc<ExecContext> {
        &self.ctx
    }

    /// The batch, if no error has occurred.
    #[must_use]
    pub fn batch(&self) -> Option<&Batch> {
        self.state.as_ref().ok()
    }

    /// The sticky error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&EngineError> {
        self.state.as_ref().err()
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.state.is_ok()
    }

    /// Ends the pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any chained call.
    pub fn collect(self) -> Result<Batch> {
        self.state
    }

    fn and_then<F>(self, f: F) -> Self
    where
        F: FnOnce(&ExecContext, Batch) -> Result<Batch>,
    {
        let DataFrame { ctx, state } = self;
        let state = state.and_then(|batch| f(&ctx, batch));
        DataFrame { ctx, state }
    }

    fn apply<O: BatchOperator>(self, operator: O) -> Self {
        self.and_then(|ctx, batch| operator.execute(ctx, &batch))
    }

    /// Keeps the rows where `predicate` is true.
    #[must_use]
    pub fn filter(self, predicate: Expr) -> Self {
        self.and_then(|ctx, batch| {
            let mask = evaluate(ctx, &predicate, &batch)?;
            filter(ctx, &batch, &mask)
        })
    }

    /// Keeps the rows where the boolean `mask` is true.
    #[must_use]
    pub fn filter_mask(self, mask: &ArrayRef) -> Self {
        self.and_then(|ctx, batch| filter(ctx, &batch, mask))
    }

    /// Evaluates `expr` into a column named `name`.
    #[must_use]
    pub fn with_column(self, name: &str, expr: Expr) -> Self {
        self.apply(ProjectOperator::new(Projection::WithColumn {
            name: name.to_string(),
            expr,
        }))
    }

    #[must_use]
    pub fn select<S: AsRef<str>>(self, names: &[S]) -> Self {
        self.and_then(|_, batch| batch.select(names))
    }

    #[must_use]
    pub fn drop<S: AsRef<str>>(self, names: &[S]) -> Self {
        self.and_then(|_, batch| batch.drop_columns(names))
    }

    #[must_use]
    pub fn rename(self, from: &str, to: &str) -> Self {
        self.and_then(|_, batch| batch.rename(from, to))
    }

    #[must_use]
    pub fn head(self, n: usize) -> Self {
        self.apply(LimitOperator::head(n))
    }

    #[must_use]
    pub fn slice(self, offset: usize, len: usize) -> Self {
        self.apply(LimitOperator::slice(offset, len))
    }

    #[must_use]
    pub fn distinct(self) -> Self {
        self.apply(DistinctOperator)
    }

    #[must_use]
    pub fn sort<K: Into<SortKey>>(self, keys: impl IntoIterator<Item = K>) -> Self {
        self.apply(SortOperator::new(keys.into_iter().map(Into::into).collect()))
    }

    /// Starts a grouped aggregation.
    #[must_use]
    pub fn group_by<S: Into<String>>(self, columns: impl IntoIterator<Item = S>) -> GroupedFrame {
        GroupedFrame {
            frame: self,
            group_by: GroupBy::new(columns),
        }
    }

    /// Equality join on one key pair.
    #[must_use]
    pub fn join(self, other: &DataFrame, left_key: &str, right_key: &str, join_type: JoinType) -> Self {
        self.join_on(other, &[(left_key, right_key)], join_type)
    }

    /// Equality join on several key pairs.
    ///
    /// An errored `other` frame fails the join with `NilInput`.
    #[must_use]
    pub fn join_on<L, R>(self, other: &DataFrame, on: &[(L, R)], join_type: JoinType) -> Self
    where
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.and_then(|ctx, batch| {
            let right = other.state.as_ref().map_err(|e| {
                EngineError::NilInput(format!("right side of {join_type} join carries an error: {e}"))
            })?;
            join_on(ctx, &batch, right, on, join_type)
        })
    }

    /// Cartesian product with `other`.
    #[must_use]
    pub fn cross_join(self, other: &DataFrame) -> Self {
        self.join_on::<&str, &str>(other, &[], JoinType::Cross)
    }

    /// Starts a window computation.
    #[must_use]
    pub fn window(self) -> WindowedFrame {
        WindowedFrame {
            frame: self,
            window: Window::new(),
        }
    }
}

impl From<Batch> for DataFrame {
    fn from(batch: Batch) -> Self {
        DataFrame::new(batch)
    }
}

/// A frame waiting for its aggregations.
#[derive(Debug)]
pub struct GroupedFrame {
    frame: DataFrame,
    group_by: GroupBy,
}

impl GroupedFrame {
    /// One row per group with the key columns then one column per aggregation.
    #[must_use]
    pub fn agg(self, aggregations: &[Aggregation]) -> DataFrame {
        let group_by = self.group_by;
        self.frame
            .and_then(|ctx, batch| group_by.agg(ctx, &batch, aggregations))
    }
}

/// A frame waiting for its window functions.
#[derive(Debug)]
pub struct WindowedFrame {
    frame: DataFrame,
    window: Window,
}

impl WindowedFrame {
    #[must_use]
    pub fn partition_by<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.window = self.window.partition_by(columns);
        self
    }

    #[must_use]
    pub fn order_by<K: Into<SortKey>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.window = self.window.order_by(keys);
        self
    }

    #[must_use]
    pub fn rows(mut self, frame_size: usize) -> Self {
        self.window = self.window.rows(frame_size);
        self
    }

    /// Appends one column per window function.
    #[must_use]
    pub fn over<E: Into<WindowExpr>>(self, functions: impl IntoIterator<Item = E>) -> DataFrame {
        let exprs: Vec<WindowExpr> = functions.into_iter().map(Into::into).collect();
        let window = self.window;
        self.frame
            .and_then(|ctx, batch| window.over(ctx, &batch, &exprs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::WindowFunction;
    use crate::expr::{col, lit};
    use arrow::array::{Array, Int64Array, StringArray};

    fn people() -> DataFrame {
        DataFrame::from_columns(vec![
            (
                "name",
                Arc::new(StringArray::from(vec!["ann", "bob", "cy", "dee"])) as ArrayRef,
            ),
            ("dept", Arc::new(StringArray::from(vec!["x", "y", "x", "y"])) as ArrayRef),
            ("age", Arc::new(Int64Array::from(vec![31, 25, 47, 25])) as ArrayRef),
        ])
    }

    #[test]
    fn test_chain_filter_with_column_select() {
        let out = people()
            .filter(col("age").gt(lit(26)))
            .with_column("next", col("age").add(lit(1)))
            .select(&["name", "next"])
            .collect()
            .unwrap();
        assert_eq!(out.column_names(), vec!["name", "next"]);
        let next = out.column(1).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(next.values().to_vec(), vec![32, 48]);
    }

    #[test]
    fn test_error_is_sticky() {
        let frame = people().filter(col("missing").gt(lit(1)));
        assert!(matches!(frame.error(), Some(EngineError::ColumnNotFound { .. })));
        let frame = frame.select(&["name"]).head(1).sort(["age"]);
        assert!(!frame.is_ok());
        let err = frame.collect().unwrap_err();
        assert!(matches!(err, EngineError::ColumnNotFound { name } if name == "missing"));
    }

    #[test]
    fn test_group_by_agg() {
        let out = people()
            .group_by(["dept"])
            .agg(&[Aggregation::mean("age"), Aggregation::count("name")])
            .collect()
            .unwrap();
        assert_eq!(out.column_names(), vec!["dept", "age_mean", "name_count"]);
        assert_eq!(out.num_rows(), 2);
    }

    #[test]
    fn test_join_with_errored_right_frame() {
        let bad = people().rename("nope", "x");
        let err = people()
            .join(&bad, "dept", "dept", JoinType::Inner)
            .collect()
            .unwrap_err();
        assert!(matches!(err, EngineError::NilInput(_)));
    }

    #[test]
    fn test_window_over_frame() {
        let out = people()
            .window()
            .partition_by(["dept"])
            .order_by([SortKey::desc("age")])
            .over([WindowFunction::RowNumber])
            .collect()
            .unwrap();
        let rn = out.column_by_name("row_number").unwrap();
        let rn = rn.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(rn.values().to_vec(), vec![2, 1, 1, 2]);
    }

    #[test]
    fn test_construction_error_is_carried() {
        let frame = DataFrame::from_columns(vec![
            ("a", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
            ("b", Arc::new(Int64Array::from(vec![1])) as ArrayRef),
        ]);
        assert!(frame.batch().is_none());
        assert!(matches!(frame.distinct().collect(), Err(EngineError::LengthMismatch { .. })));
    }
}
