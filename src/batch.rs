//! Immutable batch of named columns over an Arrow `RecordBatch`.

use std::sync::Arc;

use ahash::AHashSet;
use arrow::array::{Array, ArrayRef, UInt32Array};
use arrow::compute;
use arrow::datatypes::{Field, Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use crate::error::{EngineError, Result};
use crate::types::DataType;

/// An immutable set of equal-length named columns.
///
/// Columns are shared `ArrayRef`s: cloning a batch or projecting columns out of
/// it never copies column data, and no operation mutates a column in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    batch: RecordBatch,
}

impl Batch {
    /// Creates a batch from named columns.
    ///
    /// The row count is taken from the first column; a batch without columns
    /// has zero rows (see [`Batch::try_new_with_rows`]).
    ///
    /// # Errors
    ///
    /// Returns `LengthMismatch` if column lengths differ and `UnsupportedType`
    /// for column types outside the engine's type set.
    pub fn try_new(columns: Vec<(String, ArrayRef)>) -> Result<Self> {
        let num_rows = columns.first().map_or(0, |(_, c)| c.len());
        Self::try_new_with_rows(columns, num_rows)
    }

    /// Creates a batch with an explicit row count, allowing zero columns.
    ///
    /// # Errors
    ///
    /// Returns `LengthMismatch` if any column's length differs from `num_rows`.
    pub fn try_new_with_rows(columns: Vec<(String, ArrayRef)>, num_rows: usize) -> Result<Self> {
        let mut fields = Vec::with_capacity(columns.len());
        let mut arrays = Vec::with_capacity(columns.len());
        for (name, array) in columns {
            if array.len() != num_rows {
                return Err(EngineError::length_mismatch(
                    format!("column '{name}'"),
                    num_rows,
                    array.len(),
                ));
            }
            DataType::of(array.as_ref(), &format!("column '{name}'"))?;
            fields.push(Field::new(name, array.data_type().clone(), true));
            arrays.push(array);
        }
        let schema = Arc::new(Schema::new(fields));
        let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
        let batch = RecordBatch::try_new_with_options(schema, arrays, &options)?;
        Ok(Batch { batch })
    }

    /// Creates a batch from `(name, column)` pairs.
    ///
    /// # Errors
    ///
    /// See [`Batch::try_new`].
    pub fn try_from_iter<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ArrayRef)>,
        S: Into<String>,
    {
        Self::try_new(columns.into_iter().map(|(n, c)| (n.into(), c)).collect())
    }

    /// Wraps an existing `RecordBatch`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedType` if any column type is outside the engine's type set.
    pub fn from_record_batch(batch: RecordBatch) -> Result<Self> {
        for (field, array) in batch.schema().fields().iter().zip(batch.columns()) {
            DataType::of(array.as_ref(), &format!("column '{}'", field.name()))?;
        }
        Ok(Batch { batch })
    }

    /// Creates a batch with no columns and no rows.
    #[must_use]
    pub fn empty() -> Self {
        Batch {
            batch: RecordBatch::new_empty(Arc::new(Schema::empty())),
        }
    }

    /// Returns the underlying RecordBatch.
    #[must_use]
    pub fn record_batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Consumes the batch, returning the underlying RecordBatch.
    #[must_use]
    pub fn into_record_batch(self) -> RecordBatch {
        self.batch
    }

    /// Returns the schema of this batch.
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// Returns the number of rows in this batch.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Returns the number of columns in this batch.
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Returns a column by index.
    #[must_use]
    pub fn column(&self, index: usize) -> &ArrayRef {
        self.batch.column(index)
    }

    /// Returns the column names in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Returns `(name, column)` pairs in order.
    #[must_use]
    pub fn columns(&self) -> Vec<(String, ArrayRef)> {
        self.column_names()
            .into_iter()
            .zip(self.batch.columns().iter().cloned())
            .collect()
    }

    /// Returns the index of the first column called `name`.
    ///
    /// # Errors
    ///
    /// Returns `ColumnNotFound` if no column has that name.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.batch
            .schema()
            .fields()
            .iter()
            .position(|f| f.name() == name)
            .ok_or_else(|| EngineError::column_not_found(name))
    }

    /// Returns a column by name.
    ///
    /// # Errors
    ///
    /// Returns `ColumnNotFound` if no column has that name.
    pub fn column_by_name(&self, name: &str) -> Result<&ArrayRef> {
        self.index_of(name).map(|i| self.batch.column(i))
    }

    /// Gathers rows by index into a new batch with the same schema.
    ///
    /// # Errors
    ///
    /// Returns an Arrow error if an index is out of bounds.
    pub fn take(&self, indices: &UInt32Array) -> Result<Batch> {
        let columns: Vec<ArrayRef> = self
            .batch
            .columns()
            .iter()
            .map(|col| compute::take(col.as_ref(), indices, None))
            .collect::<arrow::error::Result<Vec<_>>>()?;
        let options = RecordBatchOptions::new().with_row_count(Some(indices.len()));
        let batch = RecordBatch::try_new_with_options(self.batch.schema(), columns, &options)?;
        Ok(Batch { batch })
    }

    /// Gathers rows by optional index; `None` produces an all-null row.
    ///
    /// # Errors
    ///
    /// Returns an Arrow error if an index is out of bounds.
    pub fn take_optional(&self, indices: &[Option<u32>]) -> Result<Batch> {
        self.take(&UInt32Array::from(indices.to_vec()))
    }

    /// Returns a zero-copy slice of at most `len` rows starting at `offset`.
    ///
    /// Both bounds are clamped to the batch.
    #[must_use]
    pub fn slice(&self, offset: usize, len: usize) -> Batch {
        let offset = offset.min(self.num_rows());
        let len = len.min(self.num_rows() - offset);
        Batch {
            batch: self.batch.slice(offset, len),
        }
    }

    /// Projects the named columns, in the order given.
    ///
    /// # Errors
    ///
    /// Returns `ColumnNotFound` for an unknown name.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Batch> {
        let columns = names
            .iter()
            .map(|n| {
                let name = n.as_ref();
                self.column_by_name(name)
                    .map(|c| (name.to_string(), Arc::clone(c)))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::try_new_with_rows(columns, self.num_rows())
    }

    /// Removes the named columns.
    ///
    /// # Errors
    ///
    /// Returns `ColumnNotFound` for an unknown name.
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Batch> {
        for name in names {
            self.index_of(name.as_ref())?;
        }
        let columns = self
            .columns()
            .into_iter()
            .filter(|(n, _)| !names.iter().any(|d| n == d.as_ref()))
            .collect();
        Self::try_new_with_rows(columns, self.num_rows())
    }

    /// Renames every column called `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns `ColumnNotFound` if no column is called `from` and
    /// `InvalidArgument` if another column is already called `to`.
    pub fn rename(&self, from: &str, to: &str) -> Result<Batch> {
        self.index_of(from)?;
        if from != to && self.index_of(to).is_ok() {
            return Err(duplicate_column(to));
        }
        let columns = self
            .columns()
            .into_iter()
            .map(|(n, c)| if n == from { (to.to_string(), c) } else { (n, c) })
            .collect();
        Self::try_new_with_rows(columns, self.num_rows())
    }

    /// Returns a batch where `name` holds `array`.
    ///
    /// An existing column of that name is replaced in place; otherwise the
    /// column is appended.
    ///
    /// # Errors
    ///
    /// Returns `LengthMismatch` if `array` does not have `num_rows` rows.
    pub fn with_column(&self, name: &str, array: ArrayRef) -> Result<Batch> {
        let mut columns = self.columns();
        match columns.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = array,
            None => columns.push((name.to_string(), array)),
        }
        Self::try_new_with_rows(columns, self.num_rows())
    }

    /// Appends columns after the existing ones.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a new name is already taken and
    /// `LengthMismatch` if any new column has the wrong length.
    pub fn append_columns(&self, extra: Vec<(String, ArrayRef)>) -> Result<Batch> {
        let mut seen: AHashSet<String> = self.column_names().into_iter().collect();
        if let Some((name, _)) = extra.iter().find(|(name, _)| !seen.insert(name.clone())) {
            return Err(duplicate_column(name));
        }
        let mut columns = self.columns();
        columns.extend(extra);
        Self::try_new_with_rows(columns, self.num_rows())
    }

    /// Approximate memory held by this batch's buffers.
    #[must_use]
    pub fn memory_size(&self) -> usize {
        self.batch.get_array_memory_size()
    }
}

fn duplicate_column(name: &str) -> EngineError {
    EngineError::InvalidArgument(format!("duplicate output column '{name}'"))
}

impl From<Batch> for RecordBatch {
    fn from(batch: Batch) -> Self {
        batch.batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};

    fn sample() -> Batch {
        Batch::try_from_iter(vec![
            ("a", Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5])) as ArrayRef),
            ("b", Arc::new(StringArray::from(vec!["v", "w", "x", "y", "z"])) as ArrayRef),
        ])
        .unwrap()
    }

    #[test]
    fn test_batch_basic() {
        let batch = sample();
        assert_eq!(batch.num_rows(), 5);
        assert_eq!(batch.num_columns(), 2);
        assert_eq!(batch.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_rename_onto_existing_name_rejected() {
        let err = sample().rename("a", "b").unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(msg) if msg.contains("'b'")));
        let same = sample().rename("a", "a").unwrap();
        assert_eq!(same.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_append_rejects_colliding_names() {
        let extra = || Arc::new(Int64Array::from(vec![0; 5])) as ArrayRef;
        let err = sample().append_columns(vec![("a".into(), extra())]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
        let err = sample()
            .append_columns(vec![("c".into(), extra()), ("c".into(), extra())])
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
    }

    #[test]
    fn test_unequal_lengths_rejected() {
        let err = Batch::try_from_iter(vec![
            ("a", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
            ("b", Arc::new(Int64Array::from(vec![1])) as ArrayRef),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::LengthMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_unsupported_column_type_rejected() {
        let err = Batch::try_from_iter(vec![(
            "a",
            Arc::new(arrow::array::Int32Array::from(vec![1])) as ArrayRef,
        )])
        .unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedType { .. }));
    }

    #[test]
    fn test_take_preserves_schema() {
        let batch = sample();
        let taken = batch.take(&UInt32Array::from(vec![4, 0])).unwrap();
        assert_eq!(taken.schema(), batch.schema());
        assert_eq!(taken.num_rows(), 2);
        let a = taken.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(a.values().to_vec(), vec![5, 1]);
    }

    #[test]
    fn test_take_optional_produces_nulls() {
        let taken = sample().take_optional(&[Some(1), None]).unwrap();
        assert!(taken.column(0).is_valid(0));
        assert!(taken.column(0).is_null(1));
        assert!(taken.column(1).is_null(1));
    }

    #[test]
    fn test_slice_is_clamped() {
        let batch = sample();
        assert_eq!(batch.slice(3, 10).num_rows(), 2);
        assert_eq!(batch.slice(9, 1).num_rows(), 0);
    }

    #[test]
    fn test_with_column_replaces_in_place() {
        let batch = sample();
        let replaced = batch
            .with_column("a", Arc::new(Int64Array::from(vec![0; 5])))
            .unwrap();
        assert_eq!(replaced.column_names(), vec!["a", "b"]);
        let appended = batch
            .with_column("c", Arc::new(Int64Array::from(vec![0; 5])))
            .unwrap();
        assert_eq!(appended.column_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_zero_column_batch_keeps_row_count() {
        let batch = Batch::try_new_with_rows(vec![], 7).unwrap();
        assert_eq!(batch.num_rows(), 7);
        assert_eq!(batch.take(&UInt32Array::from(vec![0, 1])).unwrap().num_rows(), 2);
    }

    #[test]
    fn test_missing_column() {
        let err = sample().column_by_name("missing").unwrap_err();
        assert!(matches!(err, EngineError::ColumnNotFound { name } if name == "missing"));
    }
}
