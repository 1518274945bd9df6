//! Typed composite row keys shared by grouping, joining, partitioning and sorting.
//!
//! Keys are hashed from the typed values directly rather than from their
//! string form. Floats are canonicalized first so `-0.0 == 0.0` and all NaNs
//! fall into one key.

use std::cmp::Ordering;
use std::hash::{BuildHasher, Hasher};

use ahash::{AHashMap, RandomState};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
    TimestampMicrosecondArray,
};

use crate::batch::Batch;
use crate::error::Result;
use crate::types::{downcast_array, DataType, ScalarValue};

// Fixed seeds keep hashes comparable across the two sides of a join.
const SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

fn key_hasher() -> RandomState {
    RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3])
}

fn canonical_bits(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

/// A column downcast once to its concrete array type.
#[derive(Debug, Clone, Copy)]
pub(crate) enum TypedColumn<'a> {
    Int64(&'a Int64Array),
    Float64(&'a Float64Array),
    Utf8(&'a StringArray),
    Boolean(&'a BooleanArray),
    Date(&'a Date32Array),
    Timestamp(&'a TimestampMicrosecondArray),
    Null(&'a dyn Array),
}

impl<'a> TypedColumn<'a> {
    pub(crate) fn try_new(array: &'a ArrayRef, op: &str) -> Result<Self> {
        let array = array.as_ref();
        Ok(match DataType::of(array, op)? {
            DataType::Int64 => TypedColumn::Int64(downcast_array(array, op)?),
            DataType::Float64 => TypedColumn::Float64(downcast_array(array, op)?),
            DataType::Utf8 => TypedColumn::Utf8(downcast_array(array, op)?),
            DataType::Boolean => TypedColumn::Boolean(downcast_array(array, op)?),
            DataType::Date => TypedColumn::Date(downcast_array(array, op)?),
            DataType::Timestamp => TypedColumn::Timestamp(downcast_array(array, op)?),
            DataType::Null => TypedColumn::Null(array),
        })
    }

    fn array(&self) -> &'a dyn Array {
        match self {
            TypedColumn::Int64(a) => *a,
            TypedColumn::Float64(a) => *a,
            TypedColumn::Utf8(a) => *a,
            TypedColumn::Boolean(a) => *a,
            TypedColumn::Date(a) => *a,
            TypedColumn::Timestamp(a) => *a,
            TypedColumn::Null(a) => *a,
        }
    }

    pub(crate) fn data_type(&self) -> DataType {
        match self {
            TypedColumn::Int64(_) => DataType::Int64,
            TypedColumn::Float64(_) => DataType::Float64,
            TypedColumn::Utf8(_) => DataType::Utf8,
            TypedColumn::Boolean(_) => DataType::Boolean,
            TypedColumn::Date(_) => DataType::Date,
            TypedColumn::Timestamp(_) => DataType::Timestamp,
            TypedColumn::Null(_) => DataType::Null,
        }
    }

    pub(crate) fn is_null(&self, row: usize) -> bool {
        match self {
            TypedColumn::Null(_) => true,
            other => other.array().is_null(row),
        }
    }

    fn hash_value<H: Hasher>(&self, row: usize, hasher: &mut H) {
        if self.is_null(row) {
            hasher.write_u8(0);
            return;
        }
        hasher.write_u8(1);
        match self {
            TypedColumn::Int64(a) => hasher.write_i64(a.value(row)),
            TypedColumn::Float64(a) => hasher.write_u64(canonical_bits(a.value(row))),
            TypedColumn::Utf8(a) => {
                hasher.write(a.value(row).as_bytes());
                hasher.write_u8(0xff);
            }
            TypedColumn::Boolean(a) => hasher.write_u8(u8::from(a.value(row))),
            TypedColumn::Date(a) => hasher.write_i32(a.value(row)),
            TypedColumn::Timestamp(a) => hasher.write_i64(a.value(row)),
            TypedColumn::Null(_) => {}
        }
    }

    /// Key equality between `row` here and `other_row` in `other`; nulls equal nulls.
    pub(crate) fn equal_at(&self, row: usize, other: &TypedColumn<'_>, other_row: usize) -> bool {
        match (self.is_null(row), other.is_null(other_row)) {
            (true, true) => return true,
            (true, false) | (false, true) => return false,
            (false, false) => {}
        }
        match (self, other) {
            (TypedColumn::Int64(a), TypedColumn::Int64(b)) => a.value(row) == b.value(other_row),
            (TypedColumn::Float64(a), TypedColumn::Float64(b)) => {
                canonical_bits(a.value(row)) == canonical_bits(b.value(other_row))
            }
            (TypedColumn::Utf8(a), TypedColumn::Utf8(b)) => a.value(row) == b.value(other_row),
            (TypedColumn::Boolean(a), TypedColumn::Boolean(b)) => {
                a.value(row) == b.value(other_row)
            }
            (TypedColumn::Date(a), TypedColumn::Date(b)) => a.value(row) == b.value(other_row),
            (TypedColumn::Timestamp(a), TypedColumn::Timestamp(b)) => {
                a.value(row) == b.value(other_row)
            }
            _ => false,
        }
    }

    /// Orders two non-null rows of this column. Floats use IEEE total order.
    pub(crate) fn cmp_values(&self, a: usize, b: usize) -> Ordering {
        match self {
            TypedColumn::Int64(c) => c.value(a).cmp(&c.value(b)),
            TypedColumn::Float64(c) => c.value(a).total_cmp(&c.value(b)),
            TypedColumn::Utf8(c) => c.value(a).cmp(c.value(b)),
            TypedColumn::Boolean(c) => c.value(a).cmp(&c.value(b)),
            TypedColumn::Date(c) => c.value(a).cmp(&c.value(b)),
            TypedColumn::Timestamp(c) => c.value(a).cmp(&c.value(b)),
            TypedColumn::Null(_) => Ordering::Equal,
        }
    }

    /// Orders two rows with nulls after every value.
    pub(crate) fn cmp_nulls_last(&self, a: usize, b: usize) -> Ordering {
        match (self.is_null(a), self.is_null(b)) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.cmp_values(a, b),
        }
    }

    pub(crate) fn scalar(&self, row: usize) -> Result<ScalarValue> {
        ScalarValue::try_from_array(self.array(), row)
    }

    /// String form of a value, as used for deterministic group ordering.
    pub(crate) fn display(&self, row: usize) -> Result<String> {
        Ok(self.scalar(row)?.to_string())
    }
}

/// Key columns resolved from a batch by name.
pub(crate) struct KeyColumns<'a> {
    columns: Vec<TypedColumn<'a>>,
    state: RandomState,
}

impl<'a> KeyColumns<'a> {
    /// Resolves `names` in `batch`.
    ///
    /// # Errors
    ///
    /// Returns `ColumnNotFound` for an unknown name.
    pub(crate) fn new<S: AsRef<str>>(batch: &'a Batch, names: &[S], op: &str) -> Result<Self> {
        let columns = names
            .iter()
            .map(|name| TypedColumn::try_new(batch.column_by_name(name.as_ref())?, op))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_columns(columns))
    }

    pub(crate) fn from_columns(columns: Vec<TypedColumn<'a>>) -> Self {
        KeyColumns {
            columns,
            state: key_hasher(),
        }
    }

    pub(crate) fn columns(&self) -> &[TypedColumn<'a>] {
        &self.columns
    }

    pub(crate) fn hash_row(&self, row: usize) -> u64 {
        let mut hasher = self.state.build_hasher();
        for column in &self.columns {
            column.hash_value(row, &mut hasher);
        }
        hasher.finish()
    }

    pub(crate) fn has_null(&self, row: usize) -> bool {
        self.columns.iter().any(|c| c.is_null(row))
    }

    pub(crate) fn rows_equal(&self, row: usize, other: &KeyColumns<'_>, other_row: usize) -> bool {
        self.columns
            .iter()
            .zip(&other.columns)
            .all(|(a, b)| a.equal_at(row, b, other_row))
    }

    /// Per-column string forms of a row's key.
    pub(crate) fn display_key(&self, row: usize) -> Result<Vec<String>> {
        self.columns.iter().map(|c| c.display(row)).collect()
    }
}

/// Groups `rows` by key equality, in order of first appearance.
///
/// Each group lists its member rows in input order. With `skip_nulls`, rows
/// with any null key column are left out; otherwise nulls form groups of
/// their own.
pub(crate) fn group_rows(
    keys: &KeyColumns<'_>,
    rows: impl IntoIterator<Item = usize>,
    skip_nulls: bool,
) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut index: AHashMap<u64, Vec<usize>> = AHashMap::new();
    for row in rows {
        if skip_nulls && keys.has_null(row) {
            continue;
        }
        let candidates = index.entry(keys.hash_row(row)).or_default();
        let found = candidates
            .iter()
            .copied()
            .find(|&g| keys.rows_equal(groups[g][0], keys, row));
        match found {
            Some(g) => groups[g].push(row),
            None => {
                candidates.push(groups.len());
                groups.push(vec![row]);
            }
        }
    }
    groups
}

/// Number of distinct non-null values of `column` among `rows`.
pub(crate) fn count_distinct(column: TypedColumn<'_>, rows: &[usize]) -> usize {
    let keys = KeyColumns::from_columns(vec![column]);
    group_rows(&keys, rows.iter().copied(), true).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn batch() -> Batch {
        Batch::try_from_iter(vec![
            (
                "k",
                Arc::new(StringArray::from(vec![Some("a"), Some("b"), Some("a"), None, None]))
                    as ArrayRef,
            ),
            (
                "f",
                Arc::new(Float64Array::from(vec![0.0, -0.0, f64::NAN, f64::NAN, 1.0])) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_group_rows_first_appearance() {
        let b = batch();
        let keys = KeyColumns::new(&b, &["k"], "test").unwrap();
        assert_eq!(group_rows(&keys, 0..5, true), vec![vec![0, 2], vec![1]]);
        assert_eq!(group_rows(&keys, 0..5, false), vec![vec![0, 2], vec![1], vec![3, 4]]);
    }

    #[test]
    fn test_float_keys_are_canonical() {
        let b = batch();
        let keys = KeyColumns::new(&b, &["f"], "test").unwrap();
        assert_eq!(keys.hash_row(0), keys.hash_row(1));
        assert!(keys.rows_equal(2, &keys, 3));
        assert_eq!(group_rows(&keys, 0..5, true).len(), 3);
    }

    #[test]
    fn test_count_distinct_skips_nulls() {
        let b = batch();
        let column = TypedColumn::try_new(b.column_by_name("k").unwrap(), "test").unwrap();
        assert_eq!(count_distinct(column, &[0, 1, 2, 3, 4]), 2);
    }

    #[test]
    fn test_nulls_sort_last() {
        let b = batch();
        let column = TypedColumn::try_new(b.column_by_name("k").unwrap(), "test").unwrap();
        assert_eq!(column.cmp_nulls_last(3, 0), Ordering::Greater);
        assert_eq!(column.cmp_nulls_last(0, 1), Ordering::Less);
    }

    #[test]
    fn test_missing_key_column() {
        let b = batch();
        assert!(KeyColumns::new(&b, &["zzz"], "test").is_err());
    }
}
