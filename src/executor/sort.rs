//! Stable multi-key sort.

use std::cmp::Ordering;
use std::mem::size_of;

use arrow::array::UInt32Array;
use tracing::debug;

use crate::batch::Batch;
use crate::config::ExecContext;
use crate::error::{EngineError, Result};
use crate::executor::keys::TypedColumn;
use crate::executor::BatchOperator;

/// One sort column and its direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    /// Ascending order on `column`.
    pub fn asc(column: impl Into<String>) -> Self {
        SortKey {
            column: column.into(),
            descending: false,
        }
    }

    /// Descending order on `column`.
    pub fn desc(column: impl Into<String>) -> Self {
        SortKey {
            column: column.into(),
            descending: true,
        }
    }
}

impl From<&str> for SortKey {
    fn from(column: &str) -> Self {
        SortKey::asc(column)
    }
}

impl From<String> for SortKey {
    fn from(column: String) -> Self {
        SortKey::asc(column)
    }
}

/// Compares rows of one batch by a list of sort keys.
///
/// Nulls sort after all values whatever the direction.
pub(crate) struct RowComparator<'a> {
    columns: Vec<(TypedColumn<'a>, bool)>,
}

impl<'a> RowComparator<'a> {
    pub(crate) fn new(batch: &'a Batch, keys: &[SortKey]) -> Result<Self> {
        let columns = keys
            .iter()
            .map(|key| {
                let array = batch.column_by_name(&key.column)?;
                Ok((TypedColumn::try_new(array, "sort")?, key.descending))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RowComparator { columns })
    }

    pub(crate) fn compare(&self, a: usize, b: usize) -> Ordering {
        for (column, descending) in &self.columns {
            let ordering = match (column.is_null(a), column.is_null(b)) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) if *descending => column.cmp_values(b, a),
                (false, false) => column.cmp_values(a, b),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Sorts `rows` in place; equal rows keep their relative order.
    pub(crate) fn sort_rows(&self, rows: &mut [usize]) {
        rows.sort_by(|&a, &b| self.compare(a, b));
    }
}

/// Sorts a batch by one or more keys.
#[derive(Debug, Clone)]
pub struct SortOperator {
    keys: Vec<SortKey>,
}

impl SortOperator {
    /// Creates a new sort operator.
    #[must_use]
    pub fn new(keys: Vec<SortKey>) -> Self {
        SortOperator { keys }
    }
}

impl BatchOperator for SortOperator {
    fn execute(&self, ctx: &ExecContext, input: &Batch) -> Result<Batch> {
        if self.keys.is_empty() {
            return Err(EngineError::InvalidArgument("sort requires at least one key".into()));
        }
        let comparator = RowComparator::new(input, &self.keys)?;
        let _reservation = ctx.reserve("sort", input.num_rows() * size_of::<usize>())?;
        let mut rows: Vec<usize> = (0..input.num_rows()).collect();
        comparator.sort_rows(&mut rows);
        debug!(rows = rows.len(), keys = self.keys.len(), "sorted batch");
        let indices: UInt32Array = rows.iter().map(|&r| r as u32).collect();
        input.take(&indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, ArrayRef, Int64Array, StringArray};
    use std::sync::Arc;

    fn batch() -> Batch {
        Batch::try_from_iter(vec![
            (
                "g",
                Arc::new(StringArray::from(vec!["b", "a", "b", "a"])) as ArrayRef,
            ),
            (
                "v",
                Arc::new(Int64Array::from(vec![Some(1), None, Some(3), Some(2)])) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    fn values(batch: &Batch) -> Vec<Option<i64>> {
        batch
            .column_by_name("v")
            .unwrap()
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap()
            .iter()
            .collect()
    }

    #[test]
    fn test_sort_nulls_last_both_directions() {
        let ctx = ExecContext::default();
        let asc = SortOperator::new(vec![SortKey::asc("v")]).execute(&ctx, &batch()).unwrap();
        assert_eq!(values(&asc), vec![Some(1), Some(2), Some(3), None]);
        let desc = SortOperator::new(vec![SortKey::desc("v")]).execute(&ctx, &batch()).unwrap();
        assert_eq!(values(&desc), vec![Some(3), Some(2), Some(1), None]);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let ctx = ExecContext::default();
        let out = SortOperator::new(vec![SortKey::asc("g")]).execute(&ctx, &batch()).unwrap();
        assert_eq!(values(&out), vec![None, Some(2), Some(1), Some(3)]);
    }

    #[test]
    fn test_sort_unknown_column() {
        let ctx = ExecContext::default();
        let err = SortOperator::new(vec!["nope".into()]).execute(&ctx, &batch()).unwrap_err();
        assert!(matches!(err, EngineError::ColumnNotFound { .. }));
    }

    #[test]
    fn test_sort_respects_memory_limit() {
        let ctx = ExecContext::new(crate::config::EngineConfig::new().with_memory_limit(8));
        let err = SortOperator::new(vec![SortKey::asc("v")]).execute(&ctx, &batch()).unwrap_err();
        assert!(matches!(err, EngineError::MemoryLimitExceeded { .. }));
    }
}
